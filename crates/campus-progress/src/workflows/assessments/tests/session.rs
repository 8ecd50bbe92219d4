use std::sync::Arc;

use super::common::*;
use crate::config::PipelineConfig;
use crate::workflows::assessments::domain::{
    AssessmentId, ExaminationState, ItemState, ItemStatus,
};
use crate::workflows::assessments::filter::ItemFilter;
use crate::workflows::assessments::pipeline::{PassError, PassRunner};
use crate::workflows::source::{ProgressSource, SourceError};
use crate::workflows::testing::{examination, subject, MemorySource};

#[tokio::test]
async fn unsubmitted_assignments_resolve_to_pending() {
    let source = three_subject_source();
    let session = session_for(&source);
    session.switch_learner(learner(LEARNER));

    let snapshot = session.refresh_at(now()).await.expect("pass succeeds");

    assert_eq!(snapshot.summary.total, 3);
    assert_eq!(snapshot.summary.pending, 3);
    assert_eq!(snapshot.summary.submitted, 0);
    assert_eq!(snapshot.summary.graded, 0);
    let order: Vec<&str> = snapshot
        .items
        .iter()
        .map(|item| item.assessment_id.0.as_str())
        .collect();
    assert_eq!(order, vec!["bio-hw", "chem-hw", "phys-hw"]);
    assert_eq!(snapshot.items[0].days_remaining, Some(5));
}

#[tokio::test]
async fn completion_drop_relocks_available_exam() {
    let source = Arc::new(MemorySource::default());
    let exam = examination("hist-final", "History final");
    source.enroll(
        LEARNER,
        vec![subject("hist", Some(100.0), Vec::new(), vec![exam.clone()])],
    );
    let session = session_for(&source);
    session.switch_learner(learner(LEARNER));

    let first = session.refresh_at(now()).await.expect("first pass");
    assert_eq!(first.items[0].status(), ItemStatus::Available);

    source.enroll(LEARNER, vec![subject("hist", Some(80.0), Vec::new(), vec![exam])]);
    let second = session.refresh_at(now()).await.expect("second pass");
    assert_eq!(
        second.items[0].state,
        ItemState::Examination(ExaminationState::Locked)
    );
    assert_eq!(second.summary.locked, 1);
}

#[tokio::test]
async fn failed_lookup_defaults_only_that_item() {
    let source = exam_heavy_source();
    source.fail_lookup("math-exam-3");
    let session = session_for(&source);
    session.switch_learner(learner(LEARNER));

    let snapshot = session.refresh_at(now()).await.expect("batch completes");

    assert_eq!(snapshot.items.len(), 6);
    assert_eq!(snapshot.summary.completed, 4);
    assert_eq!(snapshot.summary.available, 1);
    assert_eq!(snapshot.summary.submitted, 1);
    let failed = snapshot
        .items
        .iter()
        .find(|item| item.assessment_id == AssessmentId("math-exam-3".to_string()))
        .expect("failed item still present");
    assert_eq!(failed.status(), ItemStatus::Available);

    let outcome = snapshot.items[1].state.outcome().expect("completed outcome");
    assert_eq!(outcome.percentage, Some(70.0));
    assert_eq!(outcome.is_passed, Some(true));
}

#[tokio::test]
async fn locked_exams_are_never_looked_up() {
    let source = Arc::new(MemorySource::default());
    source.enroll(
        LEARNER,
        vec![subject(
            "geo",
            Some(99.9),
            Vec::new(),
            vec![examination("geo-final", "Geography final")],
        )],
    );
    let session = session_for(&source);
    session.switch_learner(learner(LEARNER));

    let snapshot = session.refresh_at(now()).await.expect("pass succeeds");
    assert_eq!(snapshot.summary.locked, 1);
    assert_eq!(source.attempt_calls(), 0);
}

#[tokio::test]
async fn transport_failure_keeps_previous_snapshot() {
    let source = three_subject_source();
    let session = session_for(&source);
    session.switch_learner(learner(LEARNER));
    let first = session.refresh_at(now()).await.expect("first pass");

    source.fail_enrollment(Some(SourceError::Transport("connection reset".to_string())));
    let err = session.refresh_at(now()).await.expect_err("pass fails");
    assert!(err.is_retryable());

    let kept = session.snapshot().expect("snapshot survives");
    assert_eq!(kept.generation, first.generation);
    assert_eq!(kept.items, first.items);
}

#[tokio::test]
async fn stale_pass_is_discarded_after_learner_switch() {
    let source = exam_heavy_source();
    let gate = source.gate_enrollment(LEARNER);
    let session = session_for(&source);
    session.switch_learner(learner(LEARNER));

    let (stale, _) = tokio::join!(session.refresh_at(now()), async {
        tokio::task::yield_now().await;
        session.switch_learner(learner(OTHER_LEARNER));
        gate.notify_one();
    });

    assert_eq!(
        stale.expect_err("stale pass rejected"),
        PassError::Superseded {
            learner_id: learner(LEARNER)
        }
    );
    assert!(session.snapshot().is_none());

    let fresh = session.refresh_at(now()).await.expect("new learner pass");
    assert_eq!(fresh.learner_id, learner(OTHER_LEARNER));
    assert_eq!(fresh.items.len(), 1);
    assert_eq!(fresh.items[0].assessment_id.0, "art-hw");
}

#[tokio::test]
async fn older_refresh_finishing_last_does_not_overwrite_newer_one() {
    let source = exam_heavy_source();
    let gate = source.gate_enrollment(LEARNER);
    let session = session_for(&source);
    session.switch_learner(learner(LEARNER));
    let later = now() + chrono::Duration::hours(1);

    let (older, newer) = tokio::join!(session.refresh_at(now()), async {
        tokio::task::yield_now().await;
        let newer = session.refresh_at(later).await;
        gate.notify_one();
        newer
    });

    let newer = newer.expect("newer pass commits");
    assert_eq!(newer.refreshed_at, later);
    assert_eq!(
        older.expect_err("older pass rejected"),
        PassError::Superseded {
            learner_id: learner(LEARNER)
        }
    );
    let committed = session.snapshot().expect("snapshot committed");
    assert_eq!(committed.refreshed_at, later);
    assert!(Arc::ptr_eq(&committed, &newer));
}

#[tokio::test]
async fn gathered_cache_carries_the_pass_identity() {
    let source = exam_heavy_source();
    let runner = PassRunner::new(Arc::clone(&source), PipelineConfig::default());
    let subjects = source
        .fetch_enrollment(&learner(LEARNER))
        .await
        .expect("enrollment");

    let cache = runner.gather(&learner(LEARNER), 7, &subjects).await;
    assert_eq!(cache.learner_id(), &learner(LEARNER));
    assert_eq!(cache.generation(), 7);
    assert_eq!(cache.lookup_count(), 6);

    let session = session_for(&source);
    let generation = session.switch_learner(learner(LEARNER));
    let snapshot = session.refresh_at(now()).await.expect("pass succeeds");
    assert_eq!(snapshot.learner_id, learner(LEARNER));
    assert_eq!(snapshot.generation, generation);
}

#[tokio::test]
async fn refresh_without_learner_is_rejected() {
    let session = session_for(&three_subject_source());
    assert_eq!(
        session.refresh_at(now()).await.expect_err("no learner"),
        PassError::NoLearner
    );
}

#[tokio::test]
async fn reselecting_learner_keeps_snapshot_and_refresh_is_idempotent() {
    let source = exam_heavy_source();
    let session = session_for(&source);
    let generation = session.switch_learner(learner(LEARNER));
    let first = session.refresh_at(now()).await.expect("first pass");

    assert_eq!(session.switch_learner(learner(LEARNER)), generation);
    assert!(session.snapshot().is_some());

    let second = session.refresh_at(now()).await.expect("second pass");
    assert_eq!(first.items, second.items);
    assert_eq!(first.summary, second.summary);
}

#[tokio::test]
async fn items_apply_filters_to_committed_snapshot() {
    let source = exam_heavy_source();
    let session = session_for(&source);
    assert!(session.items(&ItemFilter::default()).is_empty());

    session.switch_learner(learner(LEARNER));
    session.refresh_at(now()).await.expect("pass succeeds");

    let passed = ItemFilter {
        is_passed: Some(true),
        ..ItemFilter::default()
    };
    assert_eq!(session.items(&passed).len(), 5);

    let failed = ItemFilter {
        is_passed: Some(false),
        ..ItemFilter::default()
    };
    assert!(session.items(&failed).is_empty());

    let searched = ItemFilter {
        search: Some("PROOF".to_string()),
        ..ItemFilter::default()
    };
    assert_eq!(session.items(&searched).len(), 1);
}
