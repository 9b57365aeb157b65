use crate::ipc::helpers::{with_db, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::settings::AttendanceSettings;
use rusqlite::Connection;
use serde_json::json;

fn load(conn: &Connection) -> Result<AttendanceSettings, HandlerErr> {
    AttendanceSettings::load(conn).map_err(HandlerErr::query)
}

fn setup_get(conn: &Connection, _params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let settings = load(conn)?;
    Ok(json!({ "attendance": settings }))
}

fn setup_update(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let Some(patch) = params.get("patch").and_then(|v| v.as_object()) else {
        return Err(HandlerErr::bad_params("patch must be an object"));
    };
    let next = load(conn)?.patched(patch).map_err(|e| {
        HandlerErr::bad_params(format!("{}: {}", e.field, e.message))
            .with_details(json!({ "field": e.field }))
    })?;
    next.save(conn)
        .map_err(|e| HandlerErr::new("db_update_failed", e.to_string()))?;
    Ok(json!({ "attendance": next }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(with_db(state, req, setup_get)),
        "setup.update" => Some(with_db(state, req, setup_update)),
        _ => None,
    }
}
