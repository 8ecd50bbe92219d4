use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for learners.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LearnerId(pub String);

/// Identifier wrapper for subjects a learner is enrolled in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub String);

/// Identifier shared by assignments and examinations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssessmentId(pub String);

impl fmt::Display for LearnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for AssessmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Assessment as published by the source. Assignments carry a due date, examinations a time
/// limit; every optional field tolerates being absent on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentDefinition {
    pub id: AssessmentId,
    #[serde(default)]
    pub subject_id: Option<SubjectId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub max_score: Option<f64>,
    #[serde(default)]
    pub passing_score: Option<f64>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub time_limit_minutes: Option<u32>,
}

/// One enrollment entry returned for a learner: the subject, its content completion, and the
/// assessments attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectEnrollment {
    pub subject_id: SubjectId,
    #[serde(default)]
    pub subject_name: Option<String>,
    #[serde(default)]
    pub subject_code: Option<String>,
    #[serde(default)]
    pub completion_percentage: Option<f64>,
    #[serde(default)]
    pub assignments: Vec<AssessmentDefinition>,
    #[serde(default)]
    pub examinations: Vec<AssessmentDefinition>,
}

impl SubjectEnrollment {
    pub fn completion(&self) -> CompletionRecord {
        CompletionRecord {
            subject_id: self.subject_id.clone(),
            completion_percentage: self.completion_percentage,
        }
    }
}

/// Content completion of one subject for one learner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRecord {
    pub subject_id: SubjectId,
    pub completion_percentage: Option<f64>,
}

impl CompletionRecord {
    /// Examinations unlock only once content is fully completed. Missing or non-finite values
    /// keep the gate closed.
    pub fn unlocks_examinations(&self) -> bool {
        matches!(self.completion_percentage, Some(pct) if pct.is_finite() && pct >= 100.0)
    }
}

/// Submission and grading record for an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub assessment_id: AssessmentId,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub graded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub feedback: Option<String>,
}

/// Payload of the submission status lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionStatus {
    #[serde(default)]
    pub has_submitted: bool,
    #[serde(default)]
    pub submission: Option<SubmissionRecord>,
}

impl SubmissionStatus {
    pub fn none() -> Self {
        Self {
            has_submitted: false,
            submission: None,
        }
    }

    /// The record is authoritative; a positive flag without a record is malformed and is
    /// treated as no record.
    pub fn into_lookup(self, assignment_id: &AssessmentId) -> Lookup<SubmissionRecord> {
        match self.submission {
            Some(record) => Lookup::Found(record),
            None => {
                if self.has_submitted {
                    tracing::debug!(%assignment_id, "submission flagged without a record");
                }
                Lookup::NotFound
            }
        }
    }
}

/// Lifecycle of a live examination attempt as reported by the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    InProgress,
    Completed,
    #[serde(other)]
    Unrecognized,
}

/// Live attempt on an examination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub assessment_id: AssessmentId,
    pub attempt_id: String,
    pub status: AttemptState,
    #[serde(default)]
    pub total_score: Option<f64>,
    #[serde(default)]
    pub max_score: Option<f64>,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub is_passed: Option<bool>,
}

/// Payload of the attempt status lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptStatus {
    #[serde(default)]
    pub has_attempt: bool,
    #[serde(default)]
    pub attempt: Option<AttemptRecord>,
}

impl AttemptStatus {
    pub fn none() -> Self {
        Self {
            has_attempt: false,
            attempt: None,
        }
    }

    pub fn into_lookup(self, examination_id: &AssessmentId) -> Lookup<AttemptRecord> {
        match self.attempt {
            Some(record) => Lookup::Found(record),
            None => {
                if self.has_attempt {
                    tracing::debug!(%examination_id, "attempt flagged without a record");
                }
                Lookup::NotFound
            }
        }
    }
}

/// Outcome of a related-record lookup. `Pending` means the fetch has not settled yet and is
/// never conflated with `NotFound`.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Pending,
    NotFound,
    Found(T),
}

impl<T> Lookup<T> {
    pub fn as_ref(&self) -> Lookup<&T> {
        match self {
            Lookup::Pending => Lookup::Pending,
            Lookup::NotFound => Lookup::NotFound,
            Lookup::Found(value) => Lookup::Found(value),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Lookup::Pending)
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Pending | Lookup::NotFound => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentKind {
    Assignment,
    Examination,
}

impl AssessmentKind {
    pub const fn label(self) -> &'static str {
        match self {
            AssessmentKind::Assignment => "assignment",
            AssessmentKind::Examination => "examination",
        }
    }
}

/// Derived lifecycle of an assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssignmentState {
    Pending,
    Submitted {
        submitted_at: DateTime<Utc>,
    },
    Graded {
        graded_at: DateTime<Utc>,
        score: Option<f64>,
        feedback: Option<String>,
    },
}

/// Derived lifecycle of an examination.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExaminationState {
    Locked,
    Available,
    InProgress { attempt_id: String },
    Completed(ExaminationOutcome),
}

/// Scores carried by a completed examination attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExaminationOutcome {
    pub attempt_id: String,
    pub total_score: Option<f64>,
    pub max_score: Option<f64>,
    pub percentage: Option<f64>,
    pub is_passed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ItemState {
    Assignment(AssignmentState),
    Examination(ExaminationState),
}

impl ItemState {
    pub fn status(&self) -> ItemStatus {
        match self {
            ItemState::Assignment(AssignmentState::Pending) => ItemStatus::Pending,
            ItemState::Assignment(AssignmentState::Submitted { .. }) => ItemStatus::Submitted,
            ItemState::Assignment(AssignmentState::Graded { .. }) => ItemStatus::Graded,
            ItemState::Examination(ExaminationState::Locked) => ItemStatus::Locked,
            ItemState::Examination(ExaminationState::Available) => ItemStatus::Available,
            ItemState::Examination(ExaminationState::InProgress { .. }) => ItemStatus::InProgress,
            ItemState::Examination(ExaminationState::Completed(_)) => ItemStatus::Completed,
        }
    }

    pub fn outcome(&self) -> Option<&ExaminationOutcome> {
        match self {
            ItemState::Examination(ExaminationState::Completed(outcome)) => Some(outcome),
            _ => None,
        }
    }
}

/// Flat status label used by filters and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Submitted,
    Graded,
    Locked,
    Available,
    InProgress,
    Completed,
}

impl ItemStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Submitted => "submitted",
            ItemStatus::Graded => "graded",
            ItemStatus::Locked => "locked",
            ItemStatus::Available => "available",
            ItemStatus::InProgress => "in_progress",
            ItemStatus::Completed => "completed",
        }
    }

    /// Whether the learner has acted on the item. Pending, available and locked items have
    /// seen no learner interaction.
    pub const fn is_engaged(self) -> bool {
        match self {
            ItemStatus::Pending | ItemStatus::Available | ItemStatus::Locked => false,
            ItemStatus::Submitted
            | ItemStatus::Graded
            | ItemStatus::InProgress
            | ItemStatus::Completed => true,
        }
    }
}

/// Item state computed for one pass; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedItem {
    pub assessment_id: AssessmentId,
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub subject_code: String,
    pub title: String,
    pub kind: AssessmentKind,
    pub state: ItemState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
}

impl ResolvedItem {
    pub fn status(&self) -> ItemStatus {
        self.state.status()
    }
}

/// Per-status counts for one learner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LearnerSummary {
    pub total: usize,
    pub pending: usize,
    pub submitted: usize,
    pub graded: usize,
    pub locked: usize,
    pub available: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl LearnerSummary {
    pub fn from_items(items: &[ResolvedItem]) -> Self {
        let mut summary = Self::default();
        for item in items {
            summary.total += 1;
            match item.status() {
                ItemStatus::Pending => summary.pending += 1,
                ItemStatus::Submitted => summary.submitted += 1,
                ItemStatus::Graded => summary.graded += 1,
                ItemStatus::Locked => summary.locked += 1,
                ItemStatus::Available => summary.available += 1,
                ItemStatus::InProgress => summary.in_progress += 1,
                ItemStatus::Completed => summary.completed += 1,
            }
        }
        summary
    }
}
