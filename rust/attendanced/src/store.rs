use crate::records::{self, AttendanceRecord, RawRecord, RecordKind, SelfRecord, TrainerRecord};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("no index supports filter {filter}")]
    MissingIndex { filter: String },
}

/// One round trip against the record store: `kind` plus optional equality
/// constraints.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordFilter {
    pub kind: RecordKind,
    pub course_id: Option<String>,
    pub student_id: Option<String>,
}

impl RecordFilter {
    pub fn kind(kind: RecordKind) -> Self {
        Self {
            kind,
            course_id: None,
            student_id: None,
        }
    }

    pub fn course(mut self, course_id: &str) -> Self {
        self.course_id = Some(course_id.to_string());
        self
    }

    pub fn student(mut self, student_id: &str) -> Self {
        self.student_id = Some(student_id.to_string());
        self
    }

    pub fn is_compound(&self) -> bool {
        self.course_id.is_some() || self.student_id.is_some()
    }

    pub fn matches(&self, rec: &AttendanceRecord) -> bool {
        if rec.kind() != self.kind {
            return false;
        }
        if let Some(c) = self.course_id.as_deref() {
            if rec.course_id() != c {
                return false;
            }
        }
        if let Some(s) = self.student_id.as_deref() {
            if rec.student_id() != Some(s) {
                return false;
            }
        }
        true
    }
}

impl fmt::Display for RecordFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kind")?;
        if self.course_id.is_some() {
            write!(f, "+courseId")?;
        }
        if self.student_id.is_some() {
            write!(f, "+studentId")?;
        }
        Ok(())
    }
}

pub trait RecordSource {
    fn query(&self, filter: &RecordFilter) -> Result<Vec<RawRecord>, StoreError>;
}

impl<T: RecordSource + ?Sized> RecordSource for &T {
    fn query(&self, filter: &RecordFilter) -> Result<Vec<RawRecord>, StoreError> {
        (**self).query(filter)
    }
}

pub trait UnlockSource {
    fn unlocked_chapters(
        &self,
        student_id: &str,
        course_id: &str,
    ) -> Result<BTreeSet<String>, StoreError>;
}

/// Most specific first. The last entry is a single-field filter every store
/// can serve.
pub fn trainer_strategies(course_id: &str) -> Vec<RecordFilter> {
    vec![
        RecordFilter::kind(RecordKind::Trainer).course(course_id),
        RecordFilter::kind(RecordKind::Trainer),
    ]
}

pub fn self_strategies(course_id: &str, student_id: &str) -> Vec<RecordFilter> {
    vec![
        RecordFilter::kind(RecordKind::SelfCheckIn)
            .course(course_id)
            .student(student_id),
        RecordFilter::kind(RecordKind::SelfCheckIn).student(student_id),
        RecordFilter::kind(RecordKind::SelfCheckIn),
    ]
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fetched {
    pub records: Vec<AttendanceRecord>,
    /// Rows dropped by validation.
    pub skipped: usize,
    /// Index into the strategy list that answered.
    pub strategy: usize,
}

/// Walks `strategies` in order. Only `MissingIndex` moves on to the next
/// filter and each filter is attempted once. Rows are validated and then
/// narrowed against `target`, so every strategy yields the same records.
pub fn fetch_with_fallback<R: RecordSource + ?Sized>(
    source: &R,
    strategies: &[RecordFilter],
    target: &RecordFilter,
) -> Result<Fetched, StoreError> {
    let mut last_err = StoreError::MissingIndex {
        filter: target.to_string(),
    };
    for (idx, filter) in strategies.iter().enumerate() {
        let rows = match source.query(filter) {
            Ok(rows) => rows,
            Err(e @ StoreError::MissingIndex { .. }) => {
                debug!(strategy = %filter, "compound filter rejected, falling back");
                last_err = e;
                continue;
            }
            Err(e) => return Err(e),
        };

        let mut out = Fetched {
            strategy: idx,
            ..Fetched::default()
        };
        for raw in &rows {
            match records::validate(raw) {
                Ok(rec) if target.matches(&rec) => out.records.push(rec),
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "skipping malformed attendance record");
                    out.skipped += 1;
                }
            }
        }
        return Ok(out);
    }
    Err(last_err)
}

pub fn fetch_trainer_records<R: RecordSource + ?Sized>(
    source: &R,
    course_id: &str,
) -> Result<Vec<TrainerRecord>, StoreError> {
    let strategies = trainer_strategies(course_id);
    let fetched = fetch_with_fallback(source, &strategies, &strategies[0])?;
    debug!(course_id, strategy = fetched.strategy, records = fetched.records.len(), skipped = fetched.skipped, "trainer records fetched");
    Ok(fetched
        .records
        .into_iter()
        .filter_map(|r| match r {
            AttendanceRecord::Trainer(t) => Some(t),
            AttendanceRecord::SelfCheckIn(_) => None,
        })
        .collect())
}

pub fn fetch_self_records<R: RecordSource + ?Sized>(
    source: &R,
    course_id: &str,
    student_id: &str,
) -> Result<Vec<SelfRecord>, StoreError> {
    let strategies = self_strategies(course_id, student_id);
    let fetched = fetch_with_fallback(source, &strategies, &strategies[0])?;
    debug!(course_id, student_id, strategy = fetched.strategy, records = fetched.records.len(), skipped = fetched.skipped, "self check-ins fetched");
    Ok(fetched
        .records
        .into_iter()
        .filter_map(|r| match r {
            AttendanceRecord::SelfCheckIn(s) => Some(s),
            AttendanceRecord::Trainer(_) => None,
        })
        .collect())
}
