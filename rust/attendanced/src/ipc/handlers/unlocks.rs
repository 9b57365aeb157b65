use crate::ipc::helpers::{
    get_bool, get_required_str, get_str_list, now_rfc3339, require_chapter_in_course,
    require_course, require_student, unknown_students, with_db, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::sqlite_store::SqliteUnlockSource;
use crate::store::UnlockSource;
use rusqlite::Connection;
use serde_json::json;
use tracing::info;

fn write_unlock(
    conn: &Connection,
    student_id: &str,
    course_id: &str,
    chapter_id: &str,
    unlocked: bool,
) -> rusqlite::Result<usize> {
    if unlocked {
        conn.execute(
            "INSERT INTO chapter_unlocks(student_id, course_id, chapter_id, unlocked_at)
             VALUES(?, ?, ?, ?)
             ON CONFLICT(student_id, course_id, chapter_id) DO NOTHING",
            (student_id, course_id, chapter_id, now_rfc3339()),
        )
    } else {
        conn.execute(
            "DELETE FROM chapter_unlocks
             WHERE student_id = ? AND course_id = ? AND chapter_id = ?",
            (student_id, course_id, chapter_id),
        )
    }
}

fn unlocks_set(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let course_id = get_required_str(params, "courseId")?;
    let chapter_id = get_required_str(params, "chapterId")?;
    let unlocked = get_bool(params, "unlocked")?;
    require_course(conn, &course_id)?;
    require_chapter_in_course(conn, &course_id, &chapter_id)?;
    require_student(conn, &student_id)?;

    let changed = write_unlock(conn, &student_id, &course_id, &chapter_id, unlocked).map_err(|e| {
        HandlerErr::new("db_update_failed", e.to_string())
            .with_details(json!({ "table": "chapter_unlocks" }))
    })?;
    Ok(json!({ "changed": changed > 0 }))
}

fn unlocks_bulk_set(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let course_id = get_required_str(params, "courseId")?;
    let chapter_id = get_required_str(params, "chapterId")?;
    let student_ids = get_str_list(params, "studentIds")?;
    let unlocked = get_bool(params, "unlocked")?;
    require_course(conn, &course_id)?;
    require_chapter_in_course(conn, &course_id, &chapter_id)?;
    let missing = unknown_students(conn, &student_ids)?;
    if !missing.is_empty() {
        return Err(HandlerErr::not_found("student").with_details(json!({ "studentIds": missing })));
    }

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| HandlerErr::new("db_tx_failed", e.to_string()))?;
    let mut changed = 0usize;
    for student_id in &student_ids {
        changed += write_unlock(&tx, student_id, &course_id, &chapter_id, unlocked).map_err(|e| {
            HandlerErr::new("db_update_failed", e.to_string())
                .with_details(json!({ "table": "chapter_unlocks" }))
        })?;
    }
    tx.commit()
        .map_err(|e| HandlerErr::new("db_commit_failed", e.to_string()))?;
    info!(course_id = %course_id, chapter_id = %chapter_id, unlocked, changed, "bulk unlock applied");
    Ok(json!({ "changed": changed }))
}

fn unlocks_list(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let course_id = get_required_str(params, "courseId")?;
    let chapter_ids = SqliteUnlockSource::new(conn)
        .unlocked_chapters(&student_id, &course_id)
        .map_err(HandlerErr::query)?;
    Ok(json!({ "chapterIds": chapter_ids }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "unlocks.set" => Some(with_db(state, req, unlocks_set)),
        "unlocks.bulkSet" => Some(with_db(state, req, unlocks_bulk_set)),
        "unlocks.list" => Some(with_db(state, req, unlocks_list)),
        _ => None,
    }
}
