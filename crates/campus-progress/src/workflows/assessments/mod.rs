//! Learner-facing reconciliation: flatten enrollment into items, gather submissions and
//! attempts for the pass, and resolve one lifecycle state per item.

pub(crate) mod cache;
pub mod domain;
pub mod filter;
pub mod flatten;
pub mod pipeline;
pub mod resolve;
pub mod router;
pub mod session;

#[cfg(test)]
mod tests;

pub use cache::PassCache;
pub use domain::{
    AssessmentDefinition, AssessmentId, AssessmentKind, AssignmentState, AttemptRecord,
    AttemptState, AttemptStatus, CompletionRecord, ExaminationOutcome, ExaminationState,
    ItemState, ItemStatus, LearnerId, LearnerSummary, Lookup, ResolvedItem, SubjectEnrollment,
    SubjectId, SubmissionRecord, SubmissionStatus,
};
pub use filter::ItemFilter;
pub use flatten::{flatten, flatten_kind, FlatItem};
pub use pipeline::{LearnerSnapshot, PassError, PassRunner};
pub use resolve::{resolve_all, resolve_item, resolve_settled, Resolution};
pub use router::session_router;
pub use session::LearnerSession;
