use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::records::is_iso_date;
use rusqlite::{Connection, OptionalExtension};
use serde_json::json;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    pub fn not_found(what: &str) -> Self {
        Self::new("not_found", format!("{} not found", what))
    }

    pub fn query(e: impl std::fmt::Display) -> Self {
        Self::new("db_query_failed", e.to_string())
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

/// Runs `f` against the open workspace database and wraps the outcome in a
/// response envelope.
pub fn with_db<F>(state: &mut AppState, req: &Request, f: F) -> serde_json::Value
where
    F: FnOnce(&Connection, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>,
{
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match f(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_optional_str(params: &serde_json::Value, key: &str) -> Result<Option<String>, HandlerErr> {
    match params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => {
            let s = v
                .as_str()
                .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a string", key)))?;
            let t = s.trim();
            Ok(if t.is_empty() { None } else { Some(t.to_string()) })
        }
    }
}

pub fn get_optional_date(params: &serde_json::Value, key: &str) -> Result<Option<String>, HandlerErr> {
    let v = get_optional_str(params, key)?;
    if let Some(d) = v.as_deref() {
        if !is_iso_date(d) {
            return Err(HandlerErr::bad_params(format!("{} must be YYYY-MM-DD", key)));
        }
    }
    Ok(v)
}

pub fn get_bool(params: &serde_json::Value, key: &str) -> Result<bool, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_bool())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// Trimmed, de-duplicated, first-seen order.
pub fn get_str_list(params: &serde_json::Value, key: &str) -> Result<Vec<String>, HandlerErr> {
    let Some(arr) = params.get(key).and_then(|v| v.as_array()) else {
        return Err(HandlerErr::bad_params(format!("missing {}", key)));
    };
    let mut out: Vec<String> = Vec::with_capacity(arr.len());
    for v in arr {
        let Some(s) = v.as_str() else {
            return Err(HandlerErr::bad_params(format!(
                "{} must contain only strings",
                key
            )));
        };
        let t = s.trim();
        if !t.is_empty() && !out.iter().any(|x| x == t) {
            out.push(t.to_string());
        }
    }
    Ok(out)
}

fn row_exists(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<bool, HandlerErr> {
    conn.query_row(sql, params, |r| r.get::<_, i64>(0))
        .optional()
        .map(|v| v.is_some())
        .map_err(HandlerErr::query)
}

pub fn require_course(conn: &Connection, course_id: &str) -> Result<(), HandlerErr> {
    if row_exists(conn, "SELECT 1 FROM courses WHERE id = ?", [course_id])? {
        Ok(())
    } else {
        Err(HandlerErr::not_found("course"))
    }
}

pub fn require_student(conn: &Connection, student_id: &str) -> Result<(), HandlerErr> {
    if row_exists(conn, "SELECT 1 FROM students WHERE id = ?", [student_id])? {
        Ok(())
    } else {
        Err(HandlerErr::not_found("student"))
    }
}

pub fn require_chapter_in_course(
    conn: &Connection,
    course_id: &str,
    chapter_id: &str,
) -> Result<(), HandlerErr> {
    if row_exists(
        conn,
        "SELECT 1 FROM chapters WHERE id = ? AND course_id = ?",
        (chapter_id, course_id),
    )? {
        Ok(())
    } else {
        Err(HandlerErr::not_found("chapter").with_details(json!({
            "courseId": course_id,
            "chapterId": chapter_id
        })))
    }
}

/// Returns the class's course id.
pub fn require_class(conn: &Connection, class_id: &str) -> Result<String, HandlerErr> {
    conn.query_row(
        "SELECT course_id FROM classes WHERE id = ?",
        [class_id],
        |r| r.get::<_, String>(0),
    )
    .optional()
    .map_err(HandlerErr::query)?
    .ok_or_else(|| HandlerErr::not_found("class"))
}

/// Ids from `ids` that are not in the students table.
pub fn unknown_students(conn: &Connection, ids: &[String]) -> Result<Vec<String>, HandlerErr> {
    let mut missing = Vec::new();
    for id in ids {
        if !row_exists(conn, "SELECT 1 FROM students WHERE id = ?", [id])? {
            missing.push(id.clone());
        }
    }
    Ok(missing)
}

pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
