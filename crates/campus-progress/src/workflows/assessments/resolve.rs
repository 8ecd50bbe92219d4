//! Derives the lifecycle state of every assessment item from its definition, the subject's
//! completion record, and the submission or attempt gathered for the pass.
//!
//! Everything here is pure. The only clock input is `now`, which feeds the "days remaining"
//! display value and never the status itself.

use chrono::{DateTime, Utc};

use super::cache::PassCache;
use super::domain::{
    AssessmentDefinition, AssessmentId, AssessmentKind, AssignmentState, AttemptRecord,
    AttemptState, CompletionRecord, ExaminationOutcome, ExaminationState, ItemState, Lookup,
    ResolvedItem, SubjectEnrollment, SubmissionRecord,
};
use super::flatten::{flatten, FlatItem};

/// Result of resolving one item against a pass cache.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The related lookup has not settled; presentation of this item is suspended.
    Pending { assessment_id: AssessmentId },
    Resolved(ResolvedItem),
}

impl Resolution {
    pub fn resolved(self) -> Option<ResolvedItem> {
        match self {
            Resolution::Resolved(item) => Some(item),
            Resolution::Pending { .. } => None,
        }
    }
}

pub fn resolve_assignment(submission: Option<&SubmissionRecord>) -> AssignmentState {
    let Some(record) = submission else {
        return AssignmentState::Pending;
    };

    match (record.graded_at, record.submitted_at) {
        (Some(graded_at), _) => AssignmentState::Graded {
            graded_at,
            score: record.score,
            feedback: record.feedback.clone(),
        },
        (None, Some(submitted_at)) => AssignmentState::Submitted { submitted_at },
        (None, None) => {
            tracing::debug!(
                assessment_id = %record.assessment_id,
                "submission record has neither timestamp; treating as pending"
            );
            AssignmentState::Pending
        }
    }
}

/// Completion gating takes precedence over any attempt on record.
pub fn resolve_examination(
    definition: &AssessmentDefinition,
    completion: &CompletionRecord,
    attempt: Option<&AttemptRecord>,
) -> ExaminationState {
    if !completion.unlocks_examinations() {
        return ExaminationState::Locked;
    }

    let Some(attempt) = attempt else {
        return ExaminationState::Available;
    };

    match attempt.status {
        AttemptState::InProgress => ExaminationState::InProgress {
            attempt_id: attempt.attempt_id.clone(),
        },
        AttemptState::Completed => ExaminationState::Completed(outcome(definition, attempt)),
        AttemptState::Unrecognized => {
            tracing::debug!(
                assessment_id = %attempt.assessment_id,
                attempt_id = %attempt.attempt_id,
                "attempt status unrecognized; treating as no attempt"
            );
            ExaminationState::Available
        }
    }
}

fn outcome(definition: &AssessmentDefinition, attempt: &AttemptRecord) -> ExaminationOutcome {
    let max_score = attempt.max_score.or(definition.max_score);
    let percentage = attempt
        .percentage
        .or_else(|| score_percentage(attempt.total_score, max_score));

    let is_passed = attempt.is_passed.or_else(|| {
        // Only derive a verdict when the score is meaningful.
        percentage?;
        let total = attempt.total_score?;
        let passing = definition.passing_score?;
        Some(total >= passing)
    });

    ExaminationOutcome {
        attempt_id: attempt.attempt_id.clone(),
        total_score: attempt.total_score,
        max_score,
        percentage,
        is_passed,
    }
}

/// `total / max × 100`, undefined when either side is missing or `max` is not positive.
pub fn score_percentage(total: Option<f64>, max: Option<f64>) -> Option<f64> {
    let total = total?;
    let max = max?;
    if !(max.is_finite() && max > 0.0) || !total.is_finite() {
        return None;
    }
    Some(total * 100.0 / max)
}

pub fn resolve_item(item: &FlatItem<'_>, cache: &PassCache, now: DateTime<Utc>) -> Resolution {
    let definition = item.definition;

    let state = match item.kind {
        AssessmentKind::Assignment => match cache.submission(&definition.id) {
            Lookup::Pending => return pending(definition),
            Lookup::NotFound => ItemState::Assignment(resolve_assignment(None)),
            Lookup::Found(record) => ItemState::Assignment(resolve_assignment(Some(record))),
        },
        AssessmentKind::Examination => {
            let completion = item.completion();
            if !completion.unlocks_examinations() {
                // The gate decides before the attempt lookup has to settle.
                ItemState::Examination(ExaminationState::Locked)
            } else {
                match cache.attempt(&definition.id) {
                    Lookup::Pending => return pending(definition),
                    Lookup::NotFound => {
                        ItemState::Examination(resolve_examination(definition, &completion, None))
                    }
                    Lookup::Found(record) => ItemState::Examination(resolve_examination(
                        definition,
                        &completion,
                        Some(record),
                    )),
                }
            }
        }
    };

    let derived_score = match &state {
        ItemState::Assignment(AssignmentState::Graded { score, .. }) => *score,
        ItemState::Examination(ExaminationState::Completed(outcome)) => outcome.total_score,
        ItemState::Assignment(_) | ItemState::Examination(_) => None,
    };

    let days_remaining = match item.kind {
        AssessmentKind::Assignment => definition
            .due_date
            .map(|due| due.signed_duration_since(now).num_days()),
        AssessmentKind::Examination => None,
    };

    Resolution::Resolved(ResolvedItem {
        assessment_id: definition.id.clone(),
        subject_id: item.subject_id().clone(),
        subject_name: item.subject_name().to_string(),
        subject_code: item.subject_code().to_string(),
        title: definition.title.clone(),
        kind: item.kind,
        state,
        derived_score,
        days_remaining,
    })
}

fn pending(definition: &AssessmentDefinition) -> Resolution {
    Resolution::Pending {
        assessment_id: definition.id.clone(),
    }
}

/// Resolves every flattened item in order, keeping pending items visible as `Pending`.
pub fn resolve_all(
    subjects: &[SubjectEnrollment],
    cache: &PassCache,
    now: DateTime<Utc>,
) -> Vec<Resolution> {
    flatten(subjects)
        .map(|item| resolve_item(&item, cache, now))
        .collect()
}

/// Resolves a fully settled pass. Items still pending are withheld.
pub fn resolve_settled(
    subjects: &[SubjectEnrollment],
    cache: &PassCache,
    now: DateTime<Utc>,
) -> Vec<ResolvedItem> {
    resolve_all(subjects, cache, now)
        .into_iter()
        .filter_map(Resolution::resolved)
        .collect()
}
