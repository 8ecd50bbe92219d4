use async_trait::async_trait;

use super::assessments::domain::{
    AssessmentId, AttemptStatus, LearnerId, SubjectEnrollment, SubmissionStatus,
};
use super::hierarchy::domain::InstitutionRecord;
use super::hierarchy::filter::HierarchyFilter;

/// Read-side data access consumed by every pass, so the pipeline can be exercised against
/// fixtures, in-memory doubles, or a remote adapter.
///
/// "The learner has not interacted yet" is an empty or not-found payload, never an error.
/// Only transport and authorization failures surface as `SourceError`.
#[async_trait]
pub trait ProgressSource: Send + Sync {
    async fn fetch_enrollment(
        &self,
        learner_id: &LearnerId,
    ) -> Result<Vec<SubjectEnrollment>, SourceError>;

    async fn fetch_submission_status(
        &self,
        learner_id: &LearnerId,
        assignment_id: &AssessmentId,
    ) -> Result<SubmissionStatus, SourceError>;

    async fn fetch_attempt_status(
        &self,
        learner_id: &LearnerId,
        examination_id: &AssessmentId,
    ) -> Result<AttemptStatus, SourceError>;

    /// Sources may pre-filter; the dashboard re-applies the filter either way.
    async fn fetch_hierarchy(
        &self,
        filter: &HierarchyFilter,
    ) -> Result<Vec<InstitutionRecord>, SourceError>;
}

/// Error enumeration for source failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("source transport failed: {0}")]
    Transport(String),
    #[error("source rejected credentials: {0}")]
    Unauthorized(String),
}
