use crate::ipc::handlers::people::class_member_ids;
use crate::ipc::helpers::{
    get_optional_date, get_optional_str, get_required_str, get_str_list, now_rfc3339,
    require_chapter_in_course, require_class, require_course, require_student, unknown_students,
    with_db, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::reconcile::{
    roster_cell, DateWindow, DetailView, Engine, PresenceCount, ReconcileOptions,
    ReconciliationResult, StudentScope,
};
use crate::records::RecordKind;
use crate::settings::AttendanceSettings;
use crate::sqlite_store::{student_class_ids, SqliteRecordSource, SqliteUnlockSource};
use crate::store::{StoreError, UnlockSource};
use chrono::{Duration, Local, NaiveDate};
use rusqlite::{Connection, OptionalExtension};
use serde_json::json;
use std::collections::{BTreeSet, HashMap};
use tracing::{info, warn};
use uuid::Uuid;

/// An unreadable settings row degrades to defaults; attendance views never
/// fail on configuration.
fn load_settings(conn: &Connection) -> AttendanceSettings {
    AttendanceSettings::load(conn).unwrap_or_else(|e| {
        warn!(error = %e, "attendance settings unreadable, using defaults");
        AttendanceSettings::default()
    })
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn insert_failed(e: rusqlite::Error) -> HandlerErr {
    HandlerErr::new("db_insert_failed", e.to_string())
        .with_details(json!({ "table": "attendance_records" }))
}

fn attendance_submit_roster(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let course_id = get_required_str(params, "courseId")?;
    let chapter_id = get_required_str(params, "chapterId")?;
    let class_id = get_optional_str(params, "classId")?;
    let date = get_optional_date(params, "date")?
        .ok_or_else(|| HandlerErr::bad_params("missing date"))?;
    let present = get_str_list(params, "presentStudentIds")?;

    require_course(conn, &course_id)?;
    require_chapter_in_course(conn, &course_id, &chapter_id)?;
    if let Some(cid) = class_id.as_deref() {
        if require_class(conn, cid)? != course_id {
            return Err(HandlerErr::bad_params("class does not belong to course")
                .with_details(json!({ "classId": cid, "courseId": course_id })));
        }
    }
    let missing = unknown_students(conn, &present)?;
    if !missing.is_empty() {
        return Err(HandlerErr::bad_params("unknown presentStudentIds")
            .with_details(json!({ "studentIds": missing })));
    }

    let present_sorted: BTreeSet<&str> = present.iter().map(String::as_str).collect();
    let present_json = serde_json::to_string(&present_sorted)
        .map_err(|e| HandlerErr::new("db_insert_failed", e.to_string()))?;
    let record_id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO attendance_records(
            id, kind, course_id, chapter_id, class_id, date, student_id,
            present_student_ids, submitted_at)
         VALUES(?, ?, ?, ?, ?, ?, NULL, ?, ?)",
        (
            &record_id,
            RecordKind::Trainer.as_str(),
            &course_id,
            &chapter_id,
            &class_id,
            &date,
            &present_json,
            now_rfc3339(),
        ),
    )
    .map_err(insert_failed)?;

    info!(course_id = %course_id, chapter_id = %chapter_id, date = %date, present = present_sorted.len(), "trainer roster recorded");
    Ok(json!({ "recordId": record_id, "presentCount": present_sorted.len() }))
}

fn attendance_check_in(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let course_id = get_required_str(params, "courseId")?;
    let chapter_id = get_required_str(params, "chapterId")?;
    let student_id = get_required_str(params, "studentId")?;
    require_course(conn, &course_id)?;
    require_chapter_in_course(conn, &course_id, &chapter_id)?;
    require_student(conn, &student_id)?;

    let unlocked = conn
        .query_row(
            "SELECT 1 FROM chapter_unlocks
             WHERE student_id = ? AND course_id = ? AND chapter_id = ?",
            (&student_id, &course_id, &chapter_id),
            |r| r.get::<_, i64>(0),
        )
        .optional()
        .map_err(HandlerErr::query)?
        .is_some();
    if !unlocked {
        return Err(HandlerErr::new("chapter_locked", "chapter is not unlocked for student")
            .with_details(json!({ "chapterId": chapter_id })));
    }

    let record_id = Uuid::new_v4().to_string();
    let date = today().format("%Y-%m-%d").to_string();
    conn.execute(
        "INSERT INTO attendance_records(
            id, kind, course_id, chapter_id, class_id, date, student_id,
            present_student_ids, submitted_at)
         VALUES(?, ?, ?, ?, NULL, ?, ?, NULL, ?)",
        (
            &record_id,
            RecordKind::SelfCheckIn.as_str(),
            &course_id,
            &chapter_id,
            &date,
            &student_id,
            now_rfc3339(),
        ),
    )
    .map_err(insert_failed)?;
    Ok(json!({ "recordId": record_id }))
}

/// Unlock set and class scope of one student; either lookup failing means
/// the student gets the zero state.
fn student_scope(
    conn: &Connection,
    settings: &AttendanceSettings,
    student_id: &str,
    course_id: &str,
) -> Result<StudentScope, StoreError> {
    let unlocked_chapter_ids =
        SqliteUnlockSource::new(conn).unlocked_chapters(student_id, course_id)?;
    let class_ids = if settings.apply_class_filter {
        student_class_ids(conn, student_id, course_id)?
    } else {
        Vec::new()
    };
    Ok(StudentScope {
        student_id: student_id.to_string(),
        class_ids,
        unlocked_chapter_ids,
    })
}

fn attendance_student_detail(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let course_id = get_required_str(params, "courseId")?;
    let window = DateWindow {
        date_from: get_optional_date(params, "dateFrom")?,
        date_to: get_optional_date(params, "dateTo")?,
    };
    require_course(conn, &course_id)?;
    require_student(conn, &student_id)?;
    let settings = load_settings(conn);

    // Any lookup failure shows as the zero state, never as an error.
    let result = match student_scope(conn, &settings, &student_id, &course_id) {
        Ok(scope) => {
            let opts = ReconcileOptions {
                class_ids: scope.class_ids,
                window: window.clone(),
                unlocked_chapter_ids: scope.unlocked_chapter_ids,
            };
            Engine::new(SqliteRecordSource::new(conn, settings.strict_indexes))
                .reconcile(&student_id, &course_id, &opts)
        }
        Err(e) => {
            warn!(student_id = %student_id, course_id = %course_id, error = %e, "unlock lookup failed, reporting zero");
            ReconciliationResult::zeroed()
        }
    };

    Ok(json!({
        "studentId": student_id,
        "courseId": course_id,
        "dateFrom": window.date_from,
        "dateTo": window.date_to,
        "detail": DetailView::from(&result),
        "breakdown": result
    }))
}

fn course_students_with_unlocks(conn: &Connection, course_id: &str) -> Result<Vec<String>, HandlerErr> {
    let mut stmt = conn
        .prepare(
            "SELECT DISTINCT u.student_id
             FROM chapter_unlocks u
             JOIN students s ON s.id = u.student_id
             WHERE u.course_id = ?
             ORDER BY s.display_name, s.id",
        )
        .map_err(HandlerErr::query)?;
    stmt.query_map([course_id], |r| r.get::<_, String>(0))
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(HandlerErr::query)
}

fn display_names(conn: &Connection, ids: &[String]) -> Result<HashMap<String, String>, HandlerErr> {
    let mut stmt = conn
        .prepare("SELECT display_name FROM students WHERE id = ?")
        .map_err(HandlerErr::query)?;
    let mut out = HashMap::new();
    for id in ids {
        let name: Option<String> = stmt
            .query_row([id], |r| r.get(0))
            .optional()
            .map_err(HandlerErr::query)?;
        if let Some(name) = name {
            out.insert(id.clone(), name);
        }
    }
    Ok(out)
}

fn attendance_roster_summary(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let course_id = get_required_str(params, "courseId")?;
    let class_id = get_optional_str(params, "classId")?;
    let as_of = match get_optional_date(params, "today")? {
        Some(d) => NaiveDate::parse_from_str(&d, "%Y-%m-%d")
            .map_err(|e| HandlerErr::bad_params(format!("today: {}", e)))?,
        None => today(),
    };
    require_course(conn, &course_id)?;
    let settings = load_settings(conn);

    let student_ids = if let Some(cid) = class_id.as_deref() {
        if require_class(conn, cid)? != course_id {
            return Err(HandlerErr::bad_params("class does not belong to course")
                .with_details(json!({ "classId": cid, "courseId": course_id })));
        }
        class_member_ids(conn, cid)?
    } else if params.get("studentIds").is_some() {
        let ids = get_str_list(params, "studentIds")?;
        let missing = unknown_students(conn, &ids)?;
        if !missing.is_empty() {
            return Err(HandlerErr::not_found("student")
                .with_details(json!({ "studentIds": missing })));
        }
        ids
    } else {
        course_students_with_unlocks(conn, &course_id)?
    };

    let date_from = as_of - Duration::days(i64::from(settings.roster_window_days));
    let window = DateWindow::since(date_from.format("%Y-%m-%d").to_string());

    let mut scopes = Vec::with_capacity(student_ids.len());
    let mut scope_failures: Vec<(String, String)> = Vec::new();
    for student_id in &student_ids {
        match student_scope(conn, &settings, student_id, &course_id) {
            Ok(scope) => scopes.push(scope),
            Err(e) => {
                warn!(student_id = %student_id, course_id = %course_id, error = %e, "unlock lookup failed, reporting zero");
                scope_failures.push((student_id.clone(), e.to_string()));
            }
        }
    }

    let engine = Engine::new(SqliteRecordSource::new(conn, settings.strict_indexes));
    let mut batch = engine.reconcile_batch(&course_id, &scopes, &window);
    for (student_id, reason) in scope_failures {
        batch.record_failure(&student_id, reason);
    }

    let names = display_names(conn, &student_ids)?;
    let zeroed = ReconciliationResult::zeroed();
    let rows: Vec<serde_json::Value> = student_ids
        .iter()
        .map(|sid| {
            let r = batch.results.get(sid).unwrap_or(&zeroed);
            json!({
                "studentId": sid,
                "displayName": names.get(sid),
                "column": roster_cell(r),
                "counts": PresenceCount::from(r),
                "unlocked": r.unlocked_count,
                "percentOfUnlocked": r.percent_of_unlocked
            })
        })
        .collect();

    Ok(json!({
        "courseId": course_id,
        "dateFrom": window.date_from,
        "windowDays": settings.roster_window_days,
        "rows": rows,
        "failures": batch.failures
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.submitRoster" => Some(with_db(state, req, attendance_submit_roster)),
        "attendance.checkIn" => Some(with_db(state, req, attendance_check_in)),
        "attendance.studentDetail" => Some(with_db(state, req, attendance_student_detail)),
        "attendance.rosterSummary" => Some(with_db(state, req, attendance_roster_summary)),
        _ => None,
    }
}
