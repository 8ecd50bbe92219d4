use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::workflows::assessments::domain::LearnerId;
use crate::workflows::assessments::session::LearnerSession;
use crate::workflows::testing::{
    assignment, completed_attempt, examination, subject, submitted, MemorySource,
};

pub(super) use crate::workflows::testing::{now, read_json_body};

pub(super) const LEARNER: &str = "learner-ada";
pub(super) const OTHER_LEARNER: &str = "learner-grace";

/// Three subjects with one open assignment each.
pub(super) fn three_subject_source() -> Arc<MemorySource> {
    let source = Arc::new(MemorySource::default());
    source.enroll(
        LEARNER,
        vec![
            subject("bio", Some(40.0), vec![assignment("bio-hw", "Cell diagram")], Vec::new()),
            subject("chem", Some(55.0), vec![assignment("chem-hw", "Titration log")], Vec::new()),
            subject("phys", Some(10.0), vec![assignment("phys-hw", "Pendulum report")], Vec::new()),
        ],
    );
    source
}

/// One unlocked subject with an assignment and five examinations.
pub(super) fn exam_heavy_source() -> Arc<MemorySource> {
    let source = Arc::new(MemorySource::default());
    source.enroll(
        LEARNER,
        vec![subject(
            "math",
            Some(100.0),
            vec![assignment("math-hw", "Proof set")],
            (1..=5)
                .map(|n| examination(&format!("math-exam-{n}"), &format!("Unit test {n}")))
                .collect(),
        )],
    );
    source.submit(LEARNER, submitted("math-hw"));
    for n in 1..=5 {
        source.attempt(LEARNER, completed_attempt(&format!("math-exam-{n}"), 42.0));
    }
    source.enroll(
        OTHER_LEARNER,
        vec![subject("art", Some(20.0), vec![assignment("art-hw", "Still life")], Vec::new())],
    );
    source
}

pub(super) fn session_for(source: &Arc<MemorySource>) -> Arc<LearnerSession<MemorySource>> {
    Arc::new(LearnerSession::new(
        Arc::clone(source),
        PipelineConfig {
            fan_out_limit: 2,
            fixture_path: None,
        },
    ))
}

pub(super) fn learner(id: &str) -> LearnerId {
    LearnerId(id.to_string())
}
