//! Overlay edits applied before a run.

use std::sync::Arc;

use serde_json::json;

use daysim::core::TaskId;
use daysim::{MetadataOverlay, Simulation};

use crate::fixtures::{chain_project, config, two_worker_project, ScriptedGenerator};

fn fields(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    value.as_object().cloned().unwrap_or_default()
}

#[tokio::test]
async fn test_empty_overlay_run_matches_plain_run() {
    let (tasks, workers) = chain_project();
    let mut with_overlay = Simulation::with_overlay(
        tasks.clone(),
        workers.clone(),
        MetadataOverlay::new(),
        config(3, 0.0),
        Arc::new(ScriptedGenerator::new()),
    )
    .unwrap();
    let mut plain =
        Simulation::new(tasks, workers, config(3, 0.0), Arc::new(ScriptedGenerator::new())).unwrap();

    let a = with_overlay.run().await.unwrap();
    let b = plain.run().await.unwrap();

    assert_eq!(a.detailed_logs, b.detailed_logs);
    assert_eq!(a.overlay, Some(MetadataOverlay::new()));
    assert!(b.overlay.is_none());
}

#[tokio::test]
async fn test_forced_completion_unlocks_dependents() {
    let (tasks, workers) = chain_project();
    let mut overlay = MetadataOverlay::new();
    overlay.force_complete("A");

    let generator = Arc::new(ScriptedGenerator::new());
    let mut sim = Simulation::with_overlay(
        tasks,
        workers,
        overlay,
        config(2, 0.0),
        generator.clone(),
    )
    .unwrap();
    sim.run().await.unwrap();

    let days: Vec<(u32, Vec<String>)> = generator
        .calls()
        .into_iter()
        .map(|(day, _, tasks)| (day, tasks))
        .collect();
    assert_eq!(
        days,
        vec![(1, vec!["B".to_string()]), (2, vec!["C".to_string()])]
    );
}

#[tokio::test]
async fn test_removed_task_is_pruned_from_run() {
    let (tasks, workers) = chain_project();
    let mut overlay = MetadataOverlay::new();
    overlay.remove_task("B");

    let generator = Arc::new(ScriptedGenerator::new());
    let mut sim =
        Simulation::with_overlay(tasks, workers, overlay, config(1, 0.0), generator.clone())
            .unwrap();
    let report = sim.run().await.unwrap();

    // C lost its only dependency and starts on day 1 next to A.
    assert_eq!(
        generator.calls(),
        vec![(1, "W1".to_string(), vec!["A".to_string(), "C".to_string()])]
    );
    assert_eq!(sim.tasks().len(), 2);
    assert_eq!(report.overlay.unwrap().removed_task_ids, vec![TaskId::from("B")]);
}

#[tokio::test]
async fn test_manual_assignment_and_worker_override() {
    let (tasks, workers) = two_worker_project();
    let mut overlay = MetadataOverlay::new();
    overlay.remove_worker("W1");
    overlay.assign("T1", "W2");
    overlay.assign("T2", "W1");
    overlay.override_worker("W2", fields(json!({"display_name": "Robert"})));

    let generator = Arc::new(ScriptedGenerator::new());
    let mut sim =
        Simulation::with_overlay(tasks, workers, overlay, config(1, 0.0), generator.clone())
            .unwrap();
    sim.run().await.unwrap();

    assert_eq!(sim.workers().len(), 1);
    assert_eq!(sim.workers()[0].display_name, "Robert");
    assert_eq!(
        generator.calls(),
        vec![(1, "W2".to_string(), vec!["T1".to_string()])]
    );
}

#[test]
fn test_overlay_removing_every_worker_fails_validation() {
    let (tasks, workers) = chain_project();
    let mut overlay = MetadataOverlay::new();
    overlay.remove_worker("W1");

    let result = Simulation::with_overlay(
        tasks,
        workers,
        overlay,
        config(1, 0.0),
        Arc::new(ScriptedGenerator::new()),
    );
    assert!(matches!(
        result,
        Err(daysim::Error::Precondition(
            daysim::PreconditionError::EmptyWorkers
        ))
    ));
}
