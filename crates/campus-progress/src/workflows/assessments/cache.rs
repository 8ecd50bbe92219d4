use std::collections::HashMap;

use super::domain::{
    AssessmentId, AssessmentKind, AttemptRecord, LearnerId, Lookup, SubjectEnrollment,
    SubmissionRecord,
};
use super::flatten::flatten;

/// Related-record lookups gathered during one pass, keyed by assessment id.
///
/// A cache belongs to exactly one (learner, generation) pair. It is built fresh each pass and
/// replaced wholesale when the pass commits; entries are never merged across passes.
#[derive(Debug, Clone)]
pub struct PassCache {
    learner_id: LearnerId,
    generation: u64,
    submissions: HashMap<AssessmentId, Lookup<SubmissionRecord>>,
    attempts: HashMap<AssessmentId, Lookup<AttemptRecord>>,
}

impl PassCache {
    pub fn new(learner_id: LearnerId, generation: u64) -> Self {
        Self {
            learner_id,
            generation,
            submissions: HashMap::new(),
            attempts: HashMap::new(),
        }
    }

    /// Builds a settled cache from records delivered inline (hierarchy payloads). Items with
    /// no matching record are recorded as `NotFound`.
    pub fn from_records(
        learner_id: LearnerId,
        generation: u64,
        subjects: &[SubjectEnrollment],
        submissions: &[SubmissionRecord],
        attempts: &[AttemptRecord],
    ) -> Self {
        let mut cache = Self::new(learner_id, generation);

        for item in flatten(subjects) {
            let id = &item.definition.id;
            match item.kind {
                AssessmentKind::Assignment => {
                    let lookup = submissions
                        .iter()
                        .find(|record| &record.assessment_id == id)
                        .cloned()
                        .map_or(Lookup::NotFound, Lookup::Found);
                    cache.record_submission(id.clone(), lookup);
                }
                AssessmentKind::Examination => {
                    let lookup = attempts
                        .iter()
                        .find(|record| &record.assessment_id == id)
                        .cloned()
                        .map_or(Lookup::NotFound, Lookup::Found);
                    cache.record_attempt(id.clone(), lookup);
                }
            }
        }

        cache
    }

    pub fn learner_id(&self) -> &LearnerId {
        &self.learner_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Last writer wins.
    pub fn record_submission(&mut self, id: AssessmentId, lookup: Lookup<SubmissionRecord>) {
        self.submissions.insert(id, lookup);
    }

    /// Last writer wins.
    pub fn record_attempt(&mut self, id: AssessmentId, lookup: Lookup<AttemptRecord>) {
        self.attempts.insert(id, lookup);
    }

    /// Ids never recorded are still pending.
    pub fn submission(&self, id: &AssessmentId) -> Lookup<&SubmissionRecord> {
        self.submissions
            .get(id)
            .map_or(Lookup::Pending, Lookup::as_ref)
    }

    pub fn attempt(&self, id: &AssessmentId) -> Lookup<&AttemptRecord> {
        self.attempts.get(id).map_or(Lookup::Pending, Lookup::as_ref)
    }

    /// Settled lookups of both kinds.
    pub fn lookup_count(&self) -> usize {
        self.submissions.len() + self.attempts.len()
    }
}
