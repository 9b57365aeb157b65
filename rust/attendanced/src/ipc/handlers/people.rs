use crate::ipc::helpers::{
    get_required_str, get_str_list, require_class, require_course, unknown_students, with_db,
    HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;
use serde_json::json;
use uuid::Uuid;

fn students_create(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let display_name = get_required_str(params, "displayName")?;
    let student_id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO students(id, display_name) VALUES(?, ?)",
        (&student_id, &display_name),
    )
    .map_err(|e| HandlerErr::new("db_insert_failed", e.to_string()))?;
    Ok(json!({ "studentId": student_id }))
}

fn students_list(conn: &Connection, _params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let mut stmt = conn
        .prepare("SELECT id, display_name FROM students ORDER BY display_name, id")
        .map_err(HandlerErr::query)?;
    let students = stmt
        .query_map([], |r| {
            Ok(json!({
                "id": r.get::<_, String>(0)?,
                "displayName": r.get::<_, String>(1)?
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(HandlerErr::query)?;
    Ok(json!({ "students": students }))
}

fn classes_create(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let course_id = get_required_str(params, "courseId")?;
    let name = get_required_str(params, "name")?;
    require_course(conn, &course_id)?;
    let class_id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO classes(id, course_id, name) VALUES(?, ?, ?)",
        (&class_id, &course_id, &name),
    )
    .map_err(|e| HandlerErr::new("db_insert_failed", e.to_string()))?;
    Ok(json!({ "classId": class_id }))
}

fn classes_list(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let course_id = get_required_str(params, "courseId")?;
    require_course(conn, &course_id)?;
    let mut stmt = conn
        .prepare(
            "SELECT c.id, c.name, COUNT(cm.student_id)
             FROM classes c
             LEFT JOIN class_members cm ON cm.class_id = c.id
             WHERE c.course_id = ?
             GROUP BY c.id, c.name
             ORDER BY c.name, c.id",
        )
        .map_err(HandlerErr::query)?;
    let classes = stmt
        .query_map([&course_id], |r| {
            Ok(json!({
                "id": r.get::<_, String>(0)?,
                "name": r.get::<_, String>(1)?,
                "memberCount": r.get::<_, i64>(2)?
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(HandlerErr::query)?;
    Ok(json!({ "classes": classes }))
}

pub fn class_member_ids(conn: &Connection, class_id: &str) -> Result<Vec<String>, HandlerErr> {
    let mut stmt = conn
        .prepare(
            "SELECT cm.student_id
             FROM class_members cm
             JOIN students s ON s.id = cm.student_id
             WHERE cm.class_id = ?
             ORDER BY s.display_name, s.id",
        )
        .map_err(HandlerErr::query)?;
    stmt.query_map([class_id], |r| r.get::<_, String>(0))
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(HandlerErr::query)
}

fn classes_set_members(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_str(params, "classId")?;
    let student_ids = get_str_list(params, "studentIds")?;
    require_class(conn, &class_id)?;
    let missing = unknown_students(conn, &student_ids)?;
    if !missing.is_empty() {
        return Err(HandlerErr::not_found("student").with_details(json!({ "studentIds": missing })));
    }

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| HandlerErr::new("db_tx_failed", e.to_string()))?;
    tx.execute("DELETE FROM class_members WHERE class_id = ?", [&class_id])
        .map_err(|e| HandlerErr::new("db_update_failed", e.to_string()))?;
    for student_id in &student_ids {
        tx.execute(
            "INSERT INTO class_members(class_id, student_id) VALUES(?, ?)",
            (&class_id, student_id),
        )
        .map_err(|e| {
            HandlerErr::new("db_insert_failed", e.to_string())
                .with_details(json!({ "table": "class_members" }))
        })?;
    }
    tx.commit()
        .map_err(|e| HandlerErr::new("db_commit_failed", e.to_string()))?;
    Ok(json!({ "memberCount": student_ids.len() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.create" => Some(with_db(state, req, students_create)),
        "students.list" => Some(with_db(state, req, students_list)),
        "classes.create" => Some(with_db(state, req, classes_create)),
        "classes.list" => Some(with_db(state, req, classes_list)),
        "classes.setMembers" => Some(with_db(state, req, classes_set_members)),
        _ => None,
    }
}
