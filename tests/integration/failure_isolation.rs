//! Generator failures: per-worker isolation and fatal run failures.

use std::sync::Arc;

use futures::StreamExt;

use daysim::core::{EventKind, ExtraKey};
use daysim::{Error, RunStatus, StreamUnit};

use crate::fixtures::{chain_project, config, simulation, two_worker_project, ScriptedGenerator};

#[tokio::test]
async fn test_failing_worker_does_not_block_others() {
    let generator = Arc::new(ScriptedGenerator::new().failing("W1", 1));
    let mut sim = simulation(two_worker_project(), config(2, 0.0), generator.clone());

    let report = sim.run().await.unwrap();

    let day_one: Vec<_> = report.logs.iter().filter(|l| l.day == 1).collect();
    assert_eq!(day_one.len(), 2);
    assert!(day_one[0].is_failed());
    assert!(day_one[0].outcome.completed_tasks.is_empty());
    assert!(!day_one[1].is_failed());

    // W1 retries its tasks on day 2 and succeeds.
    let calls = generator.calls();
    assert!(calls.contains(&(2, "W1".to_string(), vec!["T1".to_string(), "T2".to_string()])));
    assert!(!calls.iter().any(|(day, worker, _)| *day == 2 && worker == "W2"));
    assert!(sim.tasks().iter().all(|t| t.is_completed()));
}

#[tokio::test]
async fn test_failure_marker_is_visible_in_log() {
    let generator = Arc::new(ScriptedGenerator::new().failing("W2", 1));
    let mut sim = simulation(two_worker_project(), config(1, 0.0), generator);

    let report = sim.run().await.unwrap();

    let marked: Vec<_> = report
        .detailed_logs
        .iter()
        .filter(|e| e.extra(ExtraKey::Failed).is_some())
        .collect();
    assert_eq!(marked.len(), 2);
    assert!(marked.iter().all(|e| e.worker_id.as_ref().unwrap().as_str() == "W2"));
    assert!(marked.iter().all(|e| e.event_kind == EventKind::TaskProgress));

    let summary = &report.daily_summaries[0];
    assert_eq!(summary.tasks_started_count, 2);
    assert_eq!(summary.tasks_completed_count, 2);
    assert_eq!(summary.worker_summaries[1].tasks_executed.len(), 0);
}

#[tokio::test]
async fn test_worker_failing_every_day_never_progresses() {
    let generator = Arc::new(ScriptedGenerator::new().failing("W1", 0));
    let mut sim = simulation(chain_project(), config(4, 0.0), generator.clone());

    let report = sim.run().await.unwrap();

    assert_eq!(sim.status(), RunStatus::Completed);
    assert!(sim.tasks().iter().all(|t| !t.is_completed()));
    assert_eq!(generator.calls().len(), 4);
    assert!(report.logs.iter().all(|l| l.is_failed()));
    // Nothing started on any day.
    assert!(report.daily_summaries.is_empty());
}

#[tokio::test]
async fn test_fatal_error_fails_run_and_keeps_completed_days() {
    let generator = Arc::new(ScriptedGenerator::new().fatal_on(2));
    let mut sim = simulation(chain_project(), config(3, 0.0), generator);

    let err = sim.run().await.unwrap_err();

    assert!(matches!(err, Error::RunFailure { day: 2, .. }));
    assert_eq!(sim.status(), RunStatus::Failed);
    let partial = sim.partial_report();
    assert_eq!(partial.daily_summaries.len(), 1);
    assert_eq!(partial.daily_summaries[0].day, 1);
    // Day 2 was rolled back.
    assert!(sim.tasks()[0].is_completed());
    assert!(!sim.tasks()[1].is_completed());
}

#[tokio::test]
async fn test_fatal_error_streams_one_error_and_no_complete() {
    let generator = Arc::new(ScriptedGenerator::new().fatal_on(2));
    let sim = simulation(chain_project(), config(3, 0.0), generator);

    let units: Vec<StreamUnit> = sim.into_stream().collect().await;

    let errors: Vec<_> = units
        .iter()
        .filter(|u| matches!(u, StreamUnit::Error { .. }))
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(!units.iter().any(|u| matches!(u, StreamUnit::Complete(_))));
    match units.last() {
        Some(StreamUnit::Error { day, message }) => {
            assert_eq!(*day, Some(2));
            assert!(message.contains("generator gone"));
        }
        other => panic!("expected error unit, got {:?}", other),
    }
}
