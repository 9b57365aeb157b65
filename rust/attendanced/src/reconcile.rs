use crate::records::{SelfRecord, TrainerRecord};
use crate::store::{self, RecordSource, StoreError};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::{debug, warn};

/// Inclusive `YYYY-MM-DD` bounds on trainer record dates. Both ends open
/// means all-time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateWindow {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

impl DateWindow {
    pub fn since(date_from: impl Into<String>) -> Self {
        Self {
            date_from: Some(date_from.into()),
            date_to: None,
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.date_from.is_some() || self.date_to.is_some()
    }

    /// An undated record can't be placed inside a bounded window.
    pub fn contains(&self, date: Option<&str>) -> bool {
        if !self.is_bounded() {
            return true;
        }
        let Some(d) = date else { return false };
        if let Some(from) = self.date_from.as_deref() {
            if d < from {
                return false;
            }
        }
        if let Some(to) = self.date_to.as_deref() {
            if d > to {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub class_ids: Vec<String>,
    pub window: DateWindow,
    pub unlocked_chapter_ids: BTreeSet<String>,
}

/// Per-student inputs of a batch; the window is shared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentScope {
    pub student_id: String,
    pub class_ids: Vec<String>,
    pub unlocked_chapter_ids: BTreeSet<String>,
}

impl StudentScope {
    fn options(&self, window: &DateWindow) -> ReconcileOptions {
        ReconcileOptions {
            class_ids: self.class_ids.clone(),
            window: window.clone(),
            unlocked_chapter_ids: self.unlocked_chapter_ids.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    pub trainer_chapters: BTreeSet<String>,
    pub trainer_present_chapters: BTreeSet<String>,
    pub self_chapters: BTreeSet<String>,
    pub self_only_present_chapters: BTreeSet<String>,
    pub present_chapters: BTreeSet<String>,
    pub total_chapters: BTreeSet<String>,
    pub unlocked_count: usize,
    pub attended_of_unlocked: usize,
    pub percent_of_unlocked: u32,
}

impl ReconciliationResult {
    pub fn zeroed() -> Self {
        Self::default()
    }
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("{0} must not be empty")]
    InvalidInput(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Round-half-up of `num / den * 100`; 0 when `den` is 0.
pub fn round_percent(num: usize, den: usize) -> u32 {
    if den == 0 {
        return 0;
    }
    let scaled = (num * 200 + den) / (2 * den);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

fn trainer_record_applies(rec: &TrainerRecord, opts: &ReconcileOptions) -> bool {
    if !opts.class_ids.is_empty() {
        if let Some(class_id) = rec.class_id.as_deref() {
            if !opts.class_ids.iter().any(|c| c == class_id) {
                return false;
            }
        }
    }
    opts.window.contains(rec.date.as_deref())
}

/// The whole reconciliation over already-fetched records. Trainer records
/// take precedence: a self check-in only counts for chapters no trainer
/// record covers. Self records are never window-filtered.
pub fn reconcile_records(
    student_id: &str,
    course_id: &str,
    trainer_records: &[TrainerRecord],
    self_records: &[SelfRecord],
    opts: &ReconcileOptions,
) -> ReconciliationResult {
    let mut trainer_chapters = BTreeSet::new();
    let mut trainer_present_chapters = BTreeSet::new();
    for rec in trainer_records {
        if rec.course_id != course_id || !trainer_record_applies(rec, opts) {
            continue;
        }
        trainer_chapters.insert(rec.chapter_id.clone());
        if rec.present_student_ids.contains(student_id) {
            trainer_present_chapters.insert(rec.chapter_id.clone());
        }
    }

    let self_chapters: BTreeSet<String> = self_records
        .iter()
        .filter(|r| r.course_id == course_id && r.student_id == student_id)
        .map(|r| r.chapter_id.clone())
        .collect();

    let self_only_present_chapters: BTreeSet<String> =
        self_chapters.difference(&trainer_chapters).cloned().collect();
    let present_chapters: BTreeSet<String> = trainer_present_chapters
        .union(&self_only_present_chapters)
        .cloned()
        .collect();
    let total_chapters: BTreeSet<String> =
        trainer_chapters.union(&self_chapters).cloned().collect();

    let unlocked_count = opts.unlocked_chapter_ids.len();
    let attended_of_unlocked = if unlocked_count > 0 {
        present_chapters
            .intersection(&opts.unlocked_chapter_ids)
            .count()
    } else {
        0
    };

    ReconciliationResult {
        trainer_chapters,
        trainer_present_chapters,
        self_chapters,
        self_only_present_chapters,
        present_chapters,
        total_chapters,
        unlocked_count,
        attended_of_unlocked,
        percent_of_unlocked: round_percent(attended_of_unlocked, unlocked_count),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReconciliation {
    pub results: BTreeMap<String, ReconciliationResult>,
    /// Students whose result was zeroed, with the reason.
    pub failures: BTreeMap<String, String>,
}

impl BatchReconciliation {
    pub fn record_failure(&mut self, student_id: &str, reason: impl Into<String>) {
        self.results
            .insert(student_id.to_string(), ReconciliationResult::zeroed());
        self.failures.insert(student_id.to_string(), reason.into());
    }
}

pub struct Engine<R> {
    records: R,
}

impl<R: RecordSource> Engine<R> {
    pub fn new(records: R) -> Self {
        Self { records }
    }

    pub fn try_reconcile(
        &self,
        student_id: &str,
        course_id: &str,
        opts: &ReconcileOptions,
    ) -> Result<ReconciliationResult, ReconcileError> {
        check_ids(student_id, course_id)?;
        let trainer = store::fetch_trainer_records(&self.records, course_id)?;
        let selfs = store::fetch_self_records(&self.records, course_id, student_id)?;
        Ok(reconcile_records(student_id, course_id, &trainer, &selfs, opts))
    }

    /// Never fails: attendance is informational, so a broken fetch turns
    /// into the zero state.
    pub fn reconcile(
        &self,
        student_id: &str,
        course_id: &str,
        opts: &ReconcileOptions,
    ) -> ReconciliationResult {
        match self.try_reconcile(student_id, course_id, opts) {
            Ok(result) => result,
            Err(e) => {
                warn!(student_id, course_id, error = %e, "attendance reconciliation failed, reporting zero");
                ReconciliationResult::zeroed()
            }
        }
    }

    /// Same results as calling `reconcile` per student, with the trainer
    /// records fetched once for the whole batch.
    pub fn reconcile_batch(
        &self,
        course_id: &str,
        students: &[StudentScope],
        window: &DateWindow,
    ) -> BatchReconciliation {
        let mut out = BatchReconciliation::default();
        if course_id.trim().is_empty() {
            for s in students {
                out.record_failure(&s.student_id, "courseId must not be empty");
            }
            return out;
        }

        let trainer = match store::fetch_trainer_records(&self.records, course_id) {
            Ok(t) => t,
            Err(e) => {
                warn!(course_id, error = %e, "trainer records unavailable, zeroing batch");
                for s in students {
                    out.record_failure(&s.student_id, e.to_string());
                }
                return out;
            }
        };
        debug!(course_id, trainer_records = trainer.len(), students = students.len(), "reconciling batch");

        for scope in students {
            if scope.student_id.trim().is_empty() {
                warn!(course_id, "blank student id in batch, reporting zero");
                out.record_failure(&scope.student_id, "studentId must not be empty");
                continue;
            }
            match store::fetch_self_records(&self.records, course_id, &scope.student_id) {
                Ok(selfs) => {
                    let result = reconcile_records(
                        &scope.student_id,
                        course_id,
                        &trainer,
                        &selfs,
                        &scope.options(window),
                    );
                    out.results.insert(scope.student_id.clone(), result);
                }
                Err(e) => {
                    warn!(student_id = %scope.student_id, course_id, error = %e, "self check-ins unavailable, reporting zero");
                    out.record_failure(&scope.student_id, e.to_string());
                }
            }
        }
        out
    }
}

fn check_ids(student_id: &str, course_id: &str) -> Result<(), ReconcileError> {
    if student_id.trim().is_empty() {
        return Err(ReconcileError::InvalidInput("studentId"));
    }
    if course_id.trim().is_empty() {
        return Err(ReconcileError::InvalidInput("courseId"));
    }
    Ok(())
}

/// Per-student/course breakdown shown on the detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailView {
    pub total: usize,
    pub present: usize,
    pub percent: u32,
    pub trainer_present: usize,
    pub self_present: usize,
    pub unlocked: usize,
    pub attended_of_unlocked: usize,
    pub percent_of_unlocked: u32,
}

impl From<&ReconciliationResult> for DetailView {
    fn from(r: &ReconciliationResult) -> Self {
        let total = r.total_chapters.len();
        let present = r.present_chapters.len();
        Self {
            total,
            present,
            percent: round_percent(present, total),
            trainer_present: r.trainer_present_chapters.len(),
            self_present: r.self_only_present_chapters.len(),
            unlocked: r.unlocked_count,
            attended_of_unlocked: r.attended_of_unlocked,
            percent_of_unlocked: r.percent_of_unlocked,
        }
    }
}

/// Count-only projection used by roster tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceCount {
    pub trainer_present: usize,
    pub self_present: usize,
    pub present: usize,
}

impl From<&ReconciliationResult> for PresenceCount {
    fn from(r: &ReconciliationResult) -> Self {
        Self {
            trainer_present: r.trainer_present_chapters.len(),
            self_present: r.self_only_present_chapters.len(),
            present: r.present_chapters.len(),
        }
    }
}

pub fn roster_cell(r: &ReconciliationResult) -> String {
    if r.unlocked_count == 0 {
        return "-".to_string();
    }
    format!("{} • {}%", r.unlocked_count, r.percent_of_unlocked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::RawRecord;
    use crate::store::testing::{check_in, trainer, MemorySource};

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn unlocked(ids: &[&str]) -> ReconcileOptions {
        ReconcileOptions {
            unlocked_chapter_ids: set(ids),
            ..ReconcileOptions::default()
        }
    }

    fn fixture() -> Vec<RawRecord> {
        vec![
            trainer("t1", "c1", "A", &["s1", "s2"]),
            trainer("t2", "c1", "B", &["s2"]),
            check_in("x1", "c1", "C", "s1"),
            check_in("x2", "c1", "B", "s1"),
            check_in("x3", "c2", "Z", "s1"),
            trainer("t3", "c2", "Z", &["s1"]),
        ]
    }

    #[test]
    fn trainer_presence_against_unlocked_chapters() {
        let src = MemorySource::indexed(vec![
            trainer("t1", "c1", "A", &["s1"]),
            trainer("t2", "c1", "B", &["s9"]),
        ]);
        let r = Engine::new(&src).reconcile("s1", "c1", &unlocked(&["A", "B", "C"]));
        assert_eq!(r.trainer_chapters, set(&["A", "B"]));
        assert_eq!(r.trainer_present_chapters, set(&["A"]));
        assert_eq!(r.present_chapters, set(&["A"]));
        assert_eq!(r.unlocked_count, 3);
        assert_eq!(r.attended_of_unlocked, 1);
        assert_eq!(r.percent_of_unlocked, 33);
    }

    #[test]
    fn self_check_in_counts_where_no_trainer_record() {
        let src = MemorySource::indexed(vec![
            trainer("t1", "c1", "A", &["s1"]),
            trainer("t2", "c1", "B", &["s9"]),
            check_in("x1", "c1", "C", "s1"),
        ]);
        let r = Engine::new(&src).reconcile("s1", "c1", &unlocked(&["A", "B", "C"]));
        assert_eq!(r.self_chapters, set(&["C"]));
        assert_eq!(r.self_only_present_chapters, set(&["C"]));
        assert_eq!(r.present_chapters, set(&["A", "C"]));
        assert_eq!(r.attended_of_unlocked, 2);
        assert_eq!(r.percent_of_unlocked, 67);
    }

    #[test]
    fn trainer_absence_overrides_self_check_in() {
        let src = MemorySource::indexed(vec![
            trainer("t1", "c1", "D", &["s2"]),
            check_in("x1", "c1", "D", "s1"),
        ]);
        let r = Engine::new(&src).reconcile("s1", "c1", &unlocked(&["D"]));
        assert!(r.self_chapters.contains("D"));
        assert!(!r.present_chapters.contains("D"));
        assert!(r.self_only_present_chapters.is_empty());
        assert_eq!(r.percent_of_unlocked, 0);
    }

    #[test]
    fn nothing_unlocked_means_zero_percent() {
        let src = MemorySource::indexed(fixture());
        let r = Engine::new(&src).reconcile("s1", "c1", &ReconcileOptions::default());
        assert!(!r.present_chapters.is_empty());
        assert_eq!(r.unlocked_count, 0);
        assert_eq!(r.attended_of_unlocked, 0);
        assert_eq!(r.percent_of_unlocked, 0);
    }

    #[test]
    fn store_failure_yields_zeroed_result() {
        let src = MemorySource {
            rows: fixture(),
            fail_all: true,
            ..MemorySource::default()
        };
        let engine = Engine::new(&src);
        let r = engine.reconcile("s1", "c1", &unlocked(&["A", "B"]));
        assert_eq!(r, ReconciliationResult::zeroed());
        assert!(matches!(
            engine.try_reconcile("s1", "c1", &unlocked(&["A"])),
            Err(ReconcileError::Store(StoreError::Unavailable(_)))
        ));

        let scopes = vec![
            StudentScope {
                student_id: "s1".to_string(),
                ..StudentScope::default()
            },
            StudentScope {
                student_id: "s2".to_string(),
                ..StudentScope::default()
            },
        ];
        let batch = engine.reconcile_batch("c1", &scopes, &DateWindow::default());
        assert_eq!(batch.results.len(), 2);
        assert_eq!(batch.failures.len(), 2);
        assert!(batch.results.values().all(|r| r.percent_of_unlocked == 0));
    }

    #[test]
    fn blank_ids_are_rejected() {
        let src = MemorySource::indexed(fixture());
        let engine = Engine::new(&src);
        assert!(matches!(
            engine.try_reconcile(" ", "c1", &ReconcileOptions::default()),
            Err(ReconcileError::InvalidInput("studentId"))
        ));
        assert!(matches!(
            engine.try_reconcile("s1", "", &ReconcileOptions::default()),
            Err(ReconcileError::InvalidInput("courseId"))
        ));
        assert!(src.calls.borrow().is_empty());
    }

    #[test]
    fn invariants_hold_for_every_student() {
        let src = MemorySource::indexed(fixture());
        let engine = Engine::new(&src);
        for student in ["s1", "s2", "s3"] {
            for opts in [unlocked(&[]), unlocked(&["A"]), unlocked(&["A", "B", "C", "Q"])] {
                let r = engine.reconcile(student, "c1", &opts);
                assert!(r.present_chapters.is_subset(&r.total_chapters));
                assert!(r.attended_of_unlocked <= r.unlocked_count);
                for ch in r.trainer_chapters.intersection(&r.self_chapters) {
                    assert_eq!(
                        r.present_chapters.contains(ch),
                        r.trainer_present_chapters.contains(ch)
                    );
                }
                assert_eq!(r, engine.reconcile(student, "c1", &opts));
            }
        }
    }

    #[test]
    fn degraded_store_matches_indexed_store() {
        let indexed = MemorySource::indexed(fixture());
        let degraded = MemorySource::unindexed(fixture());
        let opts = unlocked(&["A", "B", "C"]);
        for student in ["s1", "s2"] {
            assert_eq!(
                Engine::new(&indexed).reconcile(student, "c1", &opts),
                Engine::new(&degraded).reconcile(student, "c1", &opts)
            );
        }
        assert!(degraded.calls.borrow().iter().any(|c| c == "kind"));

        // Padded ids never match an equality query, so the unfiltered
        // fallback must not pick them up either.
        let mut padded_course = trainer("t9", " c1", "A", &["s1"]);
        padded_course.date = None;
        let rows = vec![padded_course, check_in("x9", "c1", "B", "s1 ")];
        let indexed = MemorySource::indexed(rows.clone());
        let degraded = MemorySource::unindexed(rows);
        let opts = unlocked(&["A", "B"]);
        let fast = Engine::new(&indexed).reconcile("s1", "c1", &opts);
        let slow = Engine::new(&degraded).reconcile("s1", "c1", &opts);
        assert_eq!(fast, slow);
        assert_eq!(slow.percent_of_unlocked, 0);
        assert!(slow.total_chapters.is_empty());
    }

    #[test]
    fn batch_matches_single_calls_and_fetches_trainer_once() {
        let src = MemorySource::indexed(fixture());
        let engine = Engine::new(&src);
        let window = DateWindow::since("2024-01-01");
        let scopes: Vec<StudentScope> = ["s1", "s2", "s3"]
            .iter()
            .map(|s| StudentScope {
                student_id: s.to_string(),
                class_ids: Vec::new(),
                unlocked_chapter_ids: set(&["A", "B", "C"]),
            })
            .collect();
        let batch = engine.reconcile_batch("c1", &scopes, &window);
        let trainer_fetches = src
            .calls
            .borrow()
            .iter()
            .filter(|c| c.as_str() == "kind+courseId")
            .count();
        assert_eq!(trainer_fetches, 1);
        assert!(batch.failures.is_empty());

        for scope in &scopes {
            let single = engine.reconcile(&scope.student_id, "c1", &scope.options(&window));
            assert_eq!(batch.results.get(&scope.student_id), Some(&single));
        }
    }

    #[test]
    fn failing_student_is_zeroed_alone() {
        let src = MemorySource {
            fail_student: Some("s2".to_string()),
            ..MemorySource::indexed(fixture())
        };
        let engine = Engine::new(&src);
        let window = DateWindow::default();
        let scopes: Vec<StudentScope> = ["s1", "s2", "s3"]
            .iter()
            .map(|s| StudentScope {
                student_id: s.to_string(),
                class_ids: Vec::new(),
                unlocked_chapter_ids: set(&["A", "B", "C"]),
            })
            .collect();
        let batch = engine.reconcile_batch("c1", &scopes, &window);

        assert_eq!(batch.failures.keys().collect::<Vec<_>>(), vec!["s2"]);
        assert_eq!(batch.results.get("s2"), Some(&ReconciliationResult::zeroed()));
        for scope in scopes.iter().filter(|s| s.student_id != "s2") {
            let single = engine.reconcile(&scope.student_id, "c1", &scope.options(&window));
            assert_ne!(single, ReconciliationResult::zeroed());
            assert_eq!(batch.results.get(&scope.student_id), Some(&single));
        }
    }

    #[test]
    fn blank_student_in_batch_is_zeroed_like_single_call() {
        let src = MemorySource::indexed(fixture());
        let engine = Engine::new(&src);
        let scopes = vec![
            StudentScope {
                student_id: " ".to_string(),
                unlocked_chapter_ids: set(&["A"]),
                ..StudentScope::default()
            },
            StudentScope {
                student_id: "s1".to_string(),
                unlocked_chapter_ids: set(&["A"]),
                ..StudentScope::default()
            },
        ];
        let batch = engine.reconcile_batch("c1", &scopes, &DateWindow::default());
        let single = engine.reconcile(" ", "c1", &unlocked(&["A"]));
        assert_eq!(batch.results.get(" "), Some(&single));
        assert!(batch.failures.contains_key(" "));
        assert_eq!(batch.results.len(), 2);
    }

    #[test]
    fn duplicate_trainer_records_or_together() {
        let src = MemorySource::indexed(vec![
            trainer("t1", "c1", "A", &[]),
            trainer("t2", "c1", "A", &["s1"]),
        ]);
        let r = Engine::new(&src).reconcile("s1", "c1", &unlocked(&["A"]));
        assert_eq!(r.trainer_present_chapters, set(&["A"]));
        assert_eq!(r.percent_of_unlocked, 100);
    }

    #[test]
    fn class_filter_skips_other_sections_only() {
        let mut other = trainer("t1", "c1", "A", &[]);
        other.class_id = Some("k2".to_string());
        let mut mine = trainer("t2", "c1", "B", &["s1"]);
        mine.class_id = Some("k1".to_string());
        let unscoped = trainer("t3", "c1", "C", &[]);
        let src = MemorySource::indexed(vec![other, mine, unscoped, check_in("x", "c1", "A", "s1")]);

        let opts = ReconcileOptions {
            class_ids: vec!["k1".to_string()],
            ..unlocked(&["A", "B", "C"])
        };
        let r = Engine::new(&src).reconcile("s1", "c1", &opts);
        assert_eq!(r.trainer_chapters, set(&["B", "C"]));
        // With section k2's roster excluded, the check-in for A stands.
        assert_eq!(r.present_chapters, set(&["A", "B"]));

        let all = Engine::new(&src).reconcile("s1", "c1", &unlocked(&["A", "B", "C"]));
        assert_eq!(all.trainer_chapters, set(&["A", "B", "C"]));
        assert_eq!(all.present_chapters, set(&["B"]));
    }

    #[test]
    fn window_applies_to_trainer_records_only() {
        let mut old = trainer("t1", "c1", "A", &["s1"]);
        old.date = Some("2024-01-10".to_string());
        let mut recent = trainer("t2", "c1", "B", &["s1"]);
        recent.date = Some("2024-02-10".to_string());
        let mut undated = trainer("t3", "c1", "C", &["s1"]);
        undated.date = None;
        let src = MemorySource::indexed(vec![old, recent, undated, check_in("x", "c1", "E", "s1")]);
        let engine = Engine::new(&src);

        let opts = ReconcileOptions {
            window: DateWindow {
                date_from: Some("2024-02-01".to_string()),
                date_to: Some("2024-02-10".to_string()),
            },
            ..unlocked(&["A", "B", "C", "E"])
        };
        let r = engine.reconcile("s1", "c1", &opts);
        assert_eq!(r.trainer_chapters, set(&["B"]));
        assert_eq!(r.present_chapters, set(&["B", "E"]));
        assert_eq!(r.percent_of_unlocked, 50);

        let all = engine.reconcile("s1", "c1", &unlocked(&["A", "B", "C", "E"]));
        assert_eq!(all.percent_of_unlocked, 100);
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(round_percent(1, 3), 33);
        assert_eq!(round_percent(2, 3), 67);
        assert_eq!(round_percent(1, 8), 13);
        assert_eq!(round_percent(0, 5), 0);
        assert_eq!(round_percent(5, 5), 100);
        assert_eq!(round_percent(3, 0), 0);
    }

    #[test]
    fn projections_share_one_result() {
        let src = MemorySource::indexed(vec![
            trainer("t1", "c1", "A", &["s1"]),
            trainer("t2", "c1", "B", &[]),
            check_in("x1", "c1", "C", "s1"),
            check_in("x2", "c1", "B", "s1"),
        ]);
        let r = Engine::new(&src).reconcile("s1", "c1", &unlocked(&["A", "B", "C", "D"]));

        let detail = DetailView::from(&r);
        assert_eq!(detail.total, 3);
        assert_eq!(detail.present, 2);
        assert_eq!(detail.percent, 67);
        assert_eq!(detail.trainer_present, 1);
        assert_eq!(detail.self_present, 1);
        assert_eq!(detail.unlocked, 4);
        assert_eq!(detail.percent_of_unlocked, 50);

        let counts = PresenceCount::from(&r);
        assert_eq!(counts.present, 2);
        assert_eq!(roster_cell(&r), "4 • 50%");
        assert_eq!(roster_cell(&ReconciliationResult::zeroed()), "-");
        assert_eq!(DetailView::from(&ReconciliationResult::zeroed()), DetailView::default());
    }
}
