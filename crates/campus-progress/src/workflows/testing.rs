use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tokio::sync::Notify;

use super::assessments::domain::{
    AssessmentDefinition, AssessmentId, AttemptRecord, AttemptState, AttemptStatus, LearnerId,
    SubjectEnrollment, SubjectId, SubmissionRecord, SubmissionStatus,
};
use super::hierarchy::domain::InstitutionRecord;
use super::hierarchy::filter::HierarchyFilter;
use super::source::{ProgressSource, SourceError};

pub(crate) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(crate) fn assignment(id: &str, title: &str) -> AssessmentDefinition {
    AssessmentDefinition {
        id: AssessmentId(id.to_string()),
        subject_id: None,
        title: title.to_string(),
        max_score: Some(20.0),
        passing_score: None,
        due_date: Some(now() + chrono::Duration::days(5)),
        time_limit_minutes: None,
    }
}

pub(crate) fn examination(id: &str, title: &str) -> AssessmentDefinition {
    AssessmentDefinition {
        id: AssessmentId(id.to_string()),
        subject_id: None,
        title: title.to_string(),
        max_score: Some(60.0),
        passing_score: Some(30.0),
        due_date: None,
        time_limit_minutes: Some(60),
    }
}

pub(crate) fn subject(
    id: &str,
    completion: Option<f64>,
    assignments: Vec<AssessmentDefinition>,
    examinations: Vec<AssessmentDefinition>,
) -> SubjectEnrollment {
    SubjectEnrollment {
        subject_id: SubjectId(id.to_string()),
        subject_name: Some(format!("{} studies", id)),
        subject_code: Some(id.to_uppercase()),
        completion_percentage: completion,
        assignments,
        examinations,
    }
}

pub(crate) fn submitted(id: &str) -> SubmissionRecord {
    SubmissionRecord {
        assessment_id: AssessmentId(id.to_string()),
        submitted_at: Some(now()),
        graded_at: None,
        score: None,
        feedback: None,
    }
}

pub(crate) fn completed_attempt(id: &str, total: f64) -> AttemptRecord {
    AttemptRecord {
        assessment_id: AssessmentId(id.to_string()),
        attempt_id: format!("{id}-attempt"),
        status: AttemptState::Completed,
        total_score: Some(total),
        max_score: Some(60.0),
        percentage: None,
        is_passed: None,
    }
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

type LearnerKey = (LearnerId, AssessmentId);

/// In-memory source with switchable failures and gates for ordering tests.
#[derive(Default)]
pub(crate) struct MemorySource {
    enrollments: Mutex<HashMap<LearnerId, Vec<SubjectEnrollment>>>,
    submissions: Mutex<HashMap<LearnerKey, SubmissionRecord>>,
    attempts: Mutex<HashMap<LearnerKey, AttemptRecord>>,
    hierarchy: Mutex<Vec<InstitutionRecord>>,
    failing_lookups: Mutex<HashSet<AssessmentId>>,
    enrollment_failure: Mutex<Option<SourceError>>,
    enrollment_gate: Mutex<Option<(LearnerId, Arc<Notify>)>>,
    hierarchy_gate: Mutex<Option<Arc<Notify>>>,
    attempt_calls: AtomicUsize,
}

impl MemorySource {
    pub(crate) fn enroll(&self, learner: &str, subjects: Vec<SubjectEnrollment>) {
        self.enrollments
            .lock()
            .expect("enrollment mutex poisoned")
            .insert(LearnerId(learner.to_string()), subjects);
    }

    pub(crate) fn submit(&self, learner: &str, record: SubmissionRecord) {
        let key = (LearnerId(learner.to_string()), record.assessment_id.clone());
        self.submissions
            .lock()
            .expect("submission mutex poisoned")
            .insert(key, record);
    }

    pub(crate) fn attempt(&self, learner: &str, record: AttemptRecord) {
        let key = (LearnerId(learner.to_string()), record.assessment_id.clone());
        self.attempts
            .lock()
            .expect("attempt mutex poisoned")
            .insert(key, record);
    }

    pub(crate) fn set_hierarchy(&self, forest: Vec<InstitutionRecord>) {
        *self.hierarchy.lock().expect("hierarchy mutex poisoned") = forest;
    }

    pub(crate) fn fail_lookup(&self, assessment_id: &str) {
        self.failing_lookups
            .lock()
            .expect("failure mutex poisoned")
            .insert(AssessmentId(assessment_id.to_string()));
    }

    pub(crate) fn fail_enrollment(&self, error: Option<SourceError>) {
        *self
            .enrollment_failure
            .lock()
            .expect("failure mutex poisoned") = error;
    }

    /// Blocks the next enrollment fetch for `learner` until the returned handle is notified.
    pub(crate) fn gate_enrollment(&self, learner: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.enrollment_gate.lock().expect("gate mutex poisoned") =
            Some((LearnerId(learner.to_string()), Arc::clone(&notify)));
        notify
    }

    /// Blocks the next hierarchy fetch until the returned handle is notified.
    pub(crate) fn gate_hierarchy(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.hierarchy_gate.lock().expect("gate mutex poisoned") = Some(Arc::clone(&notify));
        notify
    }

    pub(crate) fn attempt_calls(&self) -> usize {
        self.attempt_calls.load(Ordering::SeqCst)
    }

    fn lookup_fails(&self, id: &AssessmentId) -> bool {
        self.failing_lookups
            .lock()
            .expect("failure mutex poisoned")
            .contains(id)
    }
}

#[async_trait]
impl ProgressSource for MemorySource {
    async fn fetch_enrollment(
        &self,
        learner_id: &LearnerId,
    ) -> Result<Vec<SubjectEnrollment>, SourceError> {
        let gate = {
            let mut guard = self.enrollment_gate.lock().expect("gate mutex poisoned");
            let gated = matches!(guard.as_ref(), Some((gated, _)) if gated == learner_id);
            if gated {
                guard.take().map(|(_, notify)| notify)
            } else {
                None
            }
        };
        if let Some(notify) = gate {
            notify.notified().await;
        }

        if let Some(err) = self
            .enrollment_failure
            .lock()
            .expect("failure mutex poisoned")
            .clone()
        {
            return Err(err);
        }
        Ok(self
            .enrollments
            .lock()
            .expect("enrollment mutex poisoned")
            .get(learner_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_submission_status(
        &self,
        learner_id: &LearnerId,
        assignment_id: &AssessmentId,
    ) -> Result<SubmissionStatus, SourceError> {
        if self.lookup_fails(assignment_id) {
            return Err(SourceError::Transport(format!("lookup {assignment_id} timed out")));
        }
        let record = self
            .submissions
            .lock()
            .expect("submission mutex poisoned")
            .get(&(learner_id.clone(), assignment_id.clone()))
            .cloned();
        Ok(SubmissionStatus {
            has_submitted: record.is_some(),
            submission: record,
        })
    }

    async fn fetch_attempt_status(
        &self,
        learner_id: &LearnerId,
        examination_id: &AssessmentId,
    ) -> Result<AttemptStatus, SourceError> {
        self.attempt_calls.fetch_add(1, Ordering::SeqCst);
        if self.lookup_fails(examination_id) {
            return Err(SourceError::Transport(format!("lookup {examination_id} timed out")));
        }
        let record = self
            .attempts
            .lock()
            .expect("attempt mutex poisoned")
            .get(&(learner_id.clone(), examination_id.clone()))
            .cloned();
        Ok(AttemptStatus {
            has_attempt: record.is_some(),
            attempt: record,
        })
    }

    async fn fetch_hierarchy(
        &self,
        _filter: &HierarchyFilter,
    ) -> Result<Vec<InstitutionRecord>, SourceError> {
        let gate = self.hierarchy_gate.lock().expect("gate mutex poisoned").take();
        if let Some(notify) = gate {
            notify.notified().await;
        }
        Ok(self.hierarchy.lock().expect("hierarchy mutex poisoned").clone())
    }
}
