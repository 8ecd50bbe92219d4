use async_trait::async_trait;
use campus_progress::config::PipelineConfig;
use campus_progress::error::AppError;
use campus_progress::workflows::assessments::{
    AssessmentId, AttemptStatus, LearnerId, SubjectEnrollment, SubmissionStatus,
};
use campus_progress::workflows::hierarchy::{HierarchyFilter, InstitutionRecord, LearnerRecord};
use campus_progress::workflows::source::{ProgressSource, SourceError};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

const SAMPLE_CAMPUS: &str = include_str!("../fixtures/sample_campus.json");

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Debug, Deserialize)]
struct CampusFixture {
    #[serde(default)]
    institutions: Vec<InstitutionRecord>,
}

/// Read-only source backed by a campus export. Every learner lookup is answered from the
/// learner records nested in the hierarchy.
#[derive(Debug, Clone)]
pub(crate) struct FixtureSource {
    institutions: Vec<InstitutionRecord>,
    learners: HashMap<LearnerId, LearnerRecord>,
}

impl FixtureSource {
    pub(crate) fn new(institutions: Vec<InstitutionRecord>) -> Self {
        let learners = institutions
            .iter()
            .flat_map(|institution| &institution.departments)
            .flat_map(|department| &department.years)
            .flat_map(|year| &year.sections)
            .flat_map(|section| &section.learners)
            .map(|learner| (learner.learner_id.clone(), learner.clone()))
            .collect();
        Self {
            institutions,
            learners,
        }
    }

    pub(crate) fn from_reader<R: Read>(reader: R) -> Result<Self, AppError> {
        let fixture: CampusFixture = serde_json::from_reader(reader)?;
        Ok(Self::new(fixture.institutions))
    }

    pub(crate) fn from_path(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub(crate) fn sample() -> Result<Self, AppError> {
        Self::from_reader(SAMPLE_CAMPUS.as_bytes())
    }

    /// Learner ids in hierarchy order.
    pub(crate) fn learner_ids(&self) -> Vec<LearnerId> {
        self.institutions
            .iter()
            .flat_map(|institution| &institution.departments)
            .flat_map(|department| &department.years)
            .flat_map(|year| &year.sections)
            .flat_map(|section| &section.learners)
            .map(|learner| learner.learner_id.clone())
            .collect()
    }

    pub(crate) fn learner_name(&self, learner_id: &LearnerId) -> Option<&str> {
        self.learners
            .get(learner_id)
            .map(|learner| learner.name.as_str())
    }
}

/// Fixture named by configuration, or the built-in sample campus.
pub(crate) fn load_source(config: &PipelineConfig) -> Result<Arc<FixtureSource>, AppError> {
    let source = match &config.fixture_path {
        Some(path) => {
            info!(path = %path.display(), "loading campus fixture");
            FixtureSource::from_path(path)?
        }
        None => FixtureSource::sample()?,
    };
    info!(
        institutions = source.institutions.len(),
        learners = source.learners.len(),
        "campus source ready"
    );
    Ok(Arc::new(source))
}

#[async_trait]
impl ProgressSource for FixtureSource {
    async fn fetch_enrollment(
        &self,
        learner_id: &LearnerId,
    ) -> Result<Vec<SubjectEnrollment>, SourceError> {
        Ok(self
            .learners
            .get(learner_id)
            .map(|learner| learner.subjects.clone())
            .unwrap_or_default())
    }

    async fn fetch_submission_status(
        &self,
        learner_id: &LearnerId,
        assignment_id: &AssessmentId,
    ) -> Result<SubmissionStatus, SourceError> {
        let submission = self.learners.get(learner_id).and_then(|learner| {
            learner
                .submissions
                .iter()
                .find(|record| &record.assessment_id == assignment_id)
                .cloned()
        });
        Ok(SubmissionStatus {
            has_submitted: submission.is_some(),
            submission,
        })
    }

    async fn fetch_attempt_status(
        &self,
        learner_id: &LearnerId,
        examination_id: &AssessmentId,
    ) -> Result<AttemptStatus, SourceError> {
        let attempt = self.learners.get(learner_id).and_then(|learner| {
            learner
                .attempts
                .iter()
                .find(|record| &record.assessment_id == examination_id)
                .cloned()
        });
        Ok(AttemptStatus {
            has_attempt: attempt.is_some(),
            attempt,
        })
    }

    async fn fetch_hierarchy(
        &self,
        _filter: &HierarchyFilter,
    ) -> Result<Vec<InstitutionRecord>, SourceError> {
        Ok(self.institutions.clone())
    }
}
