use crate::db;
use crate::records::RawRecord;
use crate::store::{RecordFilter, RecordSource, StoreError, UnlockSource};
use rusqlite::{params_from_iter, Connection};
use std::collections::BTreeSet;

fn unavailable(e: rusqlite::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

/// Serves record filters from `attendance_records`. In strict mode a
/// compound filter is refused unless its index exists, which is how a
/// document store without a composite index behaves.
pub struct SqliteRecordSource<'a> {
    conn: &'a Connection,
    strict_indexes: bool,
}

impl<'a> SqliteRecordSource<'a> {
    pub fn new(conn: &'a Connection, strict_indexes: bool) -> Self {
        Self {
            conn,
            strict_indexes,
        }
    }

    fn required_index(filter: &RecordFilter) -> Option<&'static str> {
        match (filter.course_id.is_some(), filter.student_id.is_some()) {
            (true, true) => Some(db::IDX_KIND_COURSE_STUDENT),
            (true, false) => Some(db::IDX_KIND_COURSE),
            (false, true) => Some(db::IDX_KIND_STUDENT),
            (false, false) => None,
        }
    }
}

impl RecordSource for SqliteRecordSource<'_> {
    fn query(&self, filter: &RecordFilter) -> Result<Vec<RawRecord>, StoreError> {
        if self.strict_indexes && filter.is_compound() {
            if let Some(index) = Self::required_index(filter) {
                if !db::index_exists(self.conn, index).map_err(unavailable)? {
                    return Err(StoreError::MissingIndex {
                        filter: filter.to_string(),
                    });
                }
            }
        }

        let mut sql = String::from(
            "SELECT id, kind, course_id, chapter_id, class_id, date, student_id,
                    present_student_ids, submitted_at
             FROM attendance_records
             WHERE kind = ?",
        );
        let mut bind: Vec<String> = vec![filter.kind.as_str().to_string()];
        if let Some(course_id) = filter.course_id.as_deref() {
            sql.push_str(" AND course_id = ?");
            bind.push(course_id.to_string());
        }
        if let Some(student_id) = filter.student_id.as_deref() {
            sql.push_str(" AND student_id = ?");
            bind.push(student_id.to_string());
        }
        sql.push_str(" ORDER BY submitted_at, id");

        let mut stmt = self.conn.prepare(&sql).map_err(unavailable)?;
        stmt.query_map(params_from_iter(bind.iter()), |r| {
            Ok(RawRecord {
                id: r.get(0)?,
                kind: r.get(1)?,
                course_id: r.get(2)?,
                chapter_id: r.get(3)?,
                class_id: r.get(4)?,
                date: r.get(5)?,
                student_id: r.get(6)?,
                present_student_ids: r.get(7)?,
                submitted_at: r.get(8)?,
            })
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(unavailable)
    }
}

pub struct SqliteUnlockSource<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteUnlockSource<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl UnlockSource for SqliteUnlockSource<'_> {
    fn unlocked_chapters(
        &self,
        student_id: &str,
        course_id: &str,
    ) -> Result<BTreeSet<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT chapter_id FROM chapter_unlocks
                 WHERE student_id = ? AND course_id = ?",
            )
            .map_err(unavailable)?;
        stmt.query_map((student_id, course_id), |r| r.get::<_, String>(0))
            .and_then(|it| it.collect::<Result<BTreeSet<_>, _>>())
            .map_err(unavailable)
    }
}

/// Classes of `course_id` the student belongs to.
pub fn student_class_ids(
    conn: &Connection,
    student_id: &str,
    course_id: &str,
) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn
        .prepare(
            "SELECT cm.class_id
             FROM class_members cm
             JOIN classes c ON c.id = cm.class_id
             WHERE cm.student_id = ? AND c.course_id = ?
             ORDER BY cm.class_id",
        )
        .map_err(unavailable)?;
    stmt.query_map((student_id, course_id), |r| r.get::<_, String>(0))
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(unavailable)
}
