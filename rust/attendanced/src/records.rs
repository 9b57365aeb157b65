use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    #[serde(rename = "trainer")]
    Trainer,
    #[serde(rename = "self")]
    SelfCheckIn,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trainer => "trainer",
            Self::SelfCheckIn => "self",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "trainer" => Some(Self::Trainer),
            "self" => Some(Self::SelfCheckIn),
            _ => None,
        }
    }
}

/// A row as it comes back from a record source. Nothing is guaranteed here:
/// older rows and hand-edited data may miss any column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub id: String,
    pub kind: Option<String>,
    pub course_id: Option<String>,
    pub chapter_id: Option<String>,
    pub class_id: Option<String>,
    pub date: Option<String>,
    pub student_id: Option<String>,
    /// JSON array text, e.g. `["s1","s2"]`.
    pub present_student_ids: Option<String>,
    pub submitted_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainerRecord {
    pub id: String,
    pub course_id: String,
    pub chapter_id: String,
    pub class_id: Option<String>,
    pub date: Option<String>,
    pub present_student_ids: BTreeSet<String>,
    pub submitted_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfRecord {
    pub id: String,
    pub course_id: String,
    pub chapter_id: String,
    pub student_id: String,
    pub submitted_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceRecord {
    Trainer(TrainerRecord),
    SelfCheckIn(SelfRecord),
}

impl AttendanceRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Trainer(_) => RecordKind::Trainer,
            Self::SelfCheckIn(_) => RecordKind::SelfCheckIn,
        }
    }

    pub fn course_id(&self) -> &str {
        match self {
            Self::Trainer(r) => &r.course_id,
            Self::SelfCheckIn(r) => &r.course_id,
        }
    }

    pub fn student_id(&self) -> Option<&str> {
        match self {
            Self::Trainer(_) => None,
            Self::SelfCheckIn(r) => Some(&r.student_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRecord {
    #[error("record {id}: unknown kind {kind:?}")]
    UnknownKind { id: String, kind: Option<String> },
    #[error("record {id}: missing {field}")]
    MissingField { id: String, field: &'static str },
    #[error("record {id}: invalid date {date:?}")]
    InvalidDate { id: String, date: String },
    #[error("record {id}: presentStudentIds is not a list of strings")]
    BadPresentList { id: String },
    #[error("record {id}: {field} has surrounding whitespace")]
    PaddedKey { id: String, field: &'static str },
}

/// Strict `YYYY-MM-DD`. Zero padding matters because window filtering
/// compares dates as strings.
pub fn is_iso_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 10 {
        return false;
    }
    let shape_ok = bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    shape_ok && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn non_blank(v: &Option<String>) -> Option<String> {
    v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn required(raw: &RawRecord, v: &Option<String>, field: &'static str) -> Result<String, MalformedRecord> {
    non_blank(v).ok_or_else(|| MalformedRecord::MissingField {
        id: raw.id.clone(),
        field,
    })
}

/// Ids the store filters on must be stored exactly, since an equality query
/// on the column would never match a padded value.
fn key(raw: &RawRecord, v: &Option<String>, field: &'static str) -> Result<String, MalformedRecord> {
    let value = required(raw, v, field)?;
    if v.as_deref() != Some(value.as_str()) {
        return Err(MalformedRecord::PaddedKey {
            id: raw.id.clone(),
            field,
        });
    }
    Ok(value)
}

fn parse_present_list(raw: &RawRecord) -> Result<BTreeSet<String>, MalformedRecord> {
    let Some(text) = raw.present_student_ids.as_deref() else {
        // A roster where nobody showed up may be stored without the list.
        return Ok(BTreeSet::new());
    };
    if text.trim().is_empty() {
        return Ok(BTreeSet::new());
    }
    let ids: Vec<String> =
        serde_json::from_str(text).map_err(|_| MalformedRecord::BadPresentList {
            id: raw.id.clone(),
        })?;
    Ok(ids
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

pub fn validate(raw: &RawRecord) -> Result<AttendanceRecord, MalformedRecord> {
    let kind = raw
        .kind
        .as_deref()
        .and_then(RecordKind::parse)
        .ok_or_else(|| MalformedRecord::UnknownKind {
            id: raw.id.clone(),
            kind: raw.kind.clone(),
        })?;
    let course_id = key(raw, &raw.course_id, "courseId")?;
    let chapter_id = required(raw, &raw.chapter_id, "chapterId")?;
    let submitted_at = non_blank(&raw.submitted_at);

    match kind {
        RecordKind::Trainer => {
            let date = non_blank(&raw.date);
            if let Some(d) = date.as_deref() {
                if !is_iso_date(d) {
                    return Err(MalformedRecord::InvalidDate {
                        id: raw.id.clone(),
                        date: d.to_string(),
                    });
                }
            }
            Ok(AttendanceRecord::Trainer(TrainerRecord {
                id: raw.id.clone(),
                course_id,
                chapter_id,
                class_id: non_blank(&raw.class_id),
                date,
                present_student_ids: parse_present_list(raw)?,
                submitted_at,
            }))
        }
        RecordKind::SelfCheckIn => Ok(AttendanceRecord::SelfCheckIn(SelfRecord {
            id: raw.id.clone(),
            course_id,
            chapter_id,
            student_id: key(raw, &raw.student_id, "studentId")?,
            submitted_at,
        })),
    }
}
