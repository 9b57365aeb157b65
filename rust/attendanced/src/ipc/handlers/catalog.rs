use crate::ipc::helpers::{get_required_str, get_str_list, require_course, with_db, HandlerErr};
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;
use serde_json::json;
use std::collections::HashSet;
use uuid::Uuid;

fn courses_create(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let name = get_required_str(params, "name")?;
    let course_id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO courses(id, name) VALUES(?, ?)",
        (&course_id, &name),
    )
    .map_err(|e| HandlerErr::new("db_insert_failed", e.to_string()))?;
    Ok(json!({ "courseId": course_id }))
}

fn courses_list(conn: &Connection, _params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let mut stmt = conn
        .prepare(
            "SELECT c.id, c.name, COUNT(ch.id)
             FROM courses c
             LEFT JOIN chapters ch ON ch.course_id = c.id
             GROUP BY c.id, c.name
             ORDER BY c.name, c.id",
        )
        .map_err(HandlerErr::query)?;
    let courses = stmt
        .query_map([], |r| {
            Ok(json!({
                "id": r.get::<_, String>(0)?,
                "name": r.get::<_, String>(1)?,
                "chapterCount": r.get::<_, i64>(2)?
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(HandlerErr::query)?;
    Ok(json!({ "courses": courses }))
}

fn chapters_create(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let course_id = get_required_str(params, "courseId")?;
    let title = get_required_str(params, "title")?;
    require_course(conn, &course_id)?;

    let next_order: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM chapters WHERE course_id = ?",
            [&course_id],
            |r| r.get(0),
        )
        .map_err(HandlerErr::query)?;
    let chapter_id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO chapters(id, course_id, title, sort_order) VALUES(?, ?, ?, ?)",
        (&chapter_id, &course_id, &title, next_order),
    )
    .map_err(|e| HandlerErr::new("db_insert_failed", e.to_string()))?;
    Ok(json!({ "chapterId": chapter_id, "sortOrder": next_order }))
}

fn list_chapter_ids(conn: &Connection, course_id: &str) -> Result<Vec<(String, String)>, HandlerErr> {
    let mut stmt = conn
        .prepare(
            "SELECT id, title FROM chapters
             WHERE course_id = ?
             ORDER BY sort_order, id",
        )
        .map_err(HandlerErr::query)?;
    stmt.query_map([course_id], |r| Ok((r.get(0)?, r.get(1)?)))
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(HandlerErr::query)
}

fn chapters_list(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let course_id = get_required_str(params, "courseId")?;
    require_course(conn, &course_id)?;
    // Display numbering follows position, not the stored sort_order, so gaps
    // left by reorders never show up as missing days.
    let chapters: Vec<serde_json::Value> = list_chapter_ids(conn, &course_id)?
        .into_iter()
        .enumerate()
        .map(|(i, (id, title))| {
            json!({
                "id": id,
                "title": title,
                "dayNumber": i + 1,
                "label": format!("Day {}", i + 1)
            })
        })
        .collect();
    Ok(json!({ "chapters": chapters }))
}

fn chapters_reorder(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let course_id = get_required_str(params, "courseId")?;
    let ordered = get_str_list(params, "chapterIds")?;
    require_course(conn, &course_id)?;

    let existing: HashSet<String> = list_chapter_ids(conn, &course_id)?
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    let requested: HashSet<String> = ordered.iter().cloned().collect();
    if existing != requested || ordered.len() != existing.len() {
        return Err(HandlerErr::bad_params(
            "chapterIds must list every chapter of the course exactly once",
        )
        .with_details(json!({ "expected": existing.len(), "got": ordered.len() })));
    }

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| HandlerErr::new("db_tx_failed", e.to_string()))?;
    for (i, chapter_id) in ordered.iter().enumerate() {
        tx.execute(
            "UPDATE chapters SET sort_order = ? WHERE id = ? AND course_id = ?",
            (i as i64, chapter_id, &course_id),
        )
        .map_err(|e| {
            HandlerErr::new("db_update_failed", e.to_string())
                .with_details(json!({ "table": "chapters" }))
        })?;
    }
    tx.commit()
        .map_err(|e| HandlerErr::new("db_commit_failed", e.to_string()))?;
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "courses.create" => Some(with_db(state, req, courses_create)),
        "courses.list" => Some(with_db(state, req, courses_list)),
        "chapters.create" => Some(with_db(state, req, chapters_create)),
        "chapters.list" => Some(with_db(state, req, chapters_list)),
        "chapters.reorder" => Some(with_db(state, req, chapters_reorder)),
        _ => None,
    }
}
