//! Streaming protocol: unit order, spawned runs, pause and stop.

use std::sync::Arc;

use futures::StreamExt;

use daysim::{RunStatus, StreamUnit};

use crate::fixtures::{chain_project, config, simulation, two_worker_project, ScriptedGenerator};

fn kinds(units: &[StreamUnit]) -> Vec<&'static str> {
    units.iter().map(StreamUnit::kind).collect()
}

#[tokio::test]
async fn test_unit_order_without_events() {
    let sim = simulation(chain_project(), config(2, 0.0), Arc::new(ScriptedGenerator::new()));
    let units: Vec<StreamUnit> = sim.into_stream().collect().await;

    assert_eq!(
        kinds(&units),
        vec![
            "day_start",
            "agent_work",
            "day_summary",
            "day_start",
            "agent_work",
            "day_summary",
            "complete"
        ]
    );
}

#[tokio::test]
async fn test_env_event_unit_follows_day_start() {
    let sim = simulation(chain_project(), config(4, 1.0), Arc::new(ScriptedGenerator::new()));
    let units: Vec<StreamUnit> = sim.into_stream().collect().await;

    assert_eq!(
        kinds(&units),
        vec![
            "day_start",
            "env_event",
            "agent_work",
            "day_summary",
            "day_start",
            "env_event",
            "agent_work",
            "day_summary",
            "day_start",
            "env_event",
            "agent_work",
            "day_summary",
            // Day 4 is idle: no event.
            "day_start",
            "agent_work",
            "day_summary",
            "complete"
        ]
    );
}

#[tokio::test]
async fn test_day_summary_unit_detail() {
    let sim = simulation(chain_project(), config(3, 1.0), Arc::new(ScriptedGenerator::new()));
    let units: Vec<StreamUnit> = sim.into_stream().collect().await;

    let summaries: Vec<(u32, usize, usize, usize)> = units
        .iter()
        .filter_map(|unit| match unit {
            StreamUnit::DaySummary {
                day,
                completed_tasks,
                total_tasks,
                env_events_today,
                ..
            } => Some((*day, *completed_tasks, *total_tasks, *env_events_today)),
            _ => None,
        })
        .collect();
    assert_eq!(summaries, vec![(1, 1, 3, 1), (2, 2, 3, 1), (3, 3, 3, 1)]);
}

#[tokio::test]
async fn test_complete_unit_matches_batch_report() {
    let streamed: Vec<StreamUnit> = simulation(
        two_worker_project(),
        config(2, 0.5),
        Arc::new(ScriptedGenerator::new()),
    )
    .into_stream()
    .collect()
    .await;

    let mut batch = simulation(
        two_worker_project(),
        config(2, 0.5),
        Arc::new(ScriptedGenerator::new()),
    );
    let report = batch.run().await.unwrap();

    match streamed.last() {
        Some(StreamUnit::Complete(streamed_report)) => {
            assert_eq!(streamed_report.detailed_logs, report.detailed_logs);
            assert_eq!(streamed_report.env_events, report.env_events);
            assert_eq!(streamed_report.total_logs, report.total_logs);
        }
        other => panic!("expected complete unit, got {:?}", other),
    }
}

#[tokio::test]
async fn test_units_serialize_as_tagged_json() {
    let sim = simulation(chain_project(), config(1, 1.0), Arc::new(ScriptedGenerator::new()));
    let units: Vec<StreamUnit> = sim.into_stream().collect().await;

    let lines: Vec<serde_json::Value> = units
        .iter()
        .map(|u| serde_json::to_value(u).unwrap())
        .collect();
    assert_eq!(lines[0]["type"], "day_start");
    assert_eq!(lines[0]["eligible_task_ids"][0], "A");
    assert_eq!(lines[1]["type"], "env_event");
    assert_eq!(lines[1]["events"][0]["affected_task_ids"][0], "A");
    assert_eq!(lines[2]["type"], "agent_work");
    assert_eq!(lines[3]["type"], "day_summary");
    assert_eq!(lines[4]["type"], "complete");
    assert_eq!(lines[4]["total_logs"], 3);
}

#[tokio::test]
async fn test_spawned_run_pause_and_resume() {
    let sim = simulation(chain_project(), config(3, 0.0), Arc::new(ScriptedGenerator::new()));
    let (handle, mut rx) = sim.spawn();
    handle.pause();

    let mut received = Vec::new();
    loop {
        let unit = rx.recv().await.expect("unit before pause");
        let done = matches!(unit, StreamUnit::DaySummary { day: 1, .. });
        received.push(unit);
        if done {
            break;
        }
    }
    // Paused between days: nothing more arrives until resumed.
    let waited = tokio::time::timeout(std::time::Duration::from_millis(100), rx.recv()).await;
    assert!(waited.is_err());

    handle.resume();
    while let Some(unit) = rx.recv().await {
        received.push(unit);
    }
    assert!(matches!(received.last(), Some(StreamUnit::Complete(_))));

    let report = handle.join().await.unwrap();
    assert_eq!(report.daily_summaries.len(), 3);
}

#[tokio::test]
async fn test_spawned_run_stop_keeps_completed_days() {
    let sim = simulation(chain_project(), config(10, 0.0), Arc::new(ScriptedGenerator::new()));
    let (handle, mut rx) = sim.spawn();

    loop {
        match rx.recv().await {
            Some(StreamUnit::DaySummary { day: 2, .. }) => break,
            Some(_) => {}
            None => panic!("run ended before day 2"),
        }
    }
    handle.stop();
    while rx.recv().await.is_some() {}

    let report = handle.join().await.unwrap();
    assert!(report.daily_summaries.len() >= 2);
    assert!(report
        .daily_summaries
        .iter()
        .all(|s| s.day <= 3));
}

#[tokio::test]
async fn test_independent_runs_do_not_interfere() {
    let first = simulation(chain_project(), config(3, 0.0), Arc::new(ScriptedGenerator::new()));
    let second = simulation(
        two_worker_project(),
        config(1, 0.0),
        Arc::new(ScriptedGenerator::new()),
    );
    assert_ne!(first.id(), second.id());

    let (a, b) = futures::join!(
        first.into_stream().collect::<Vec<_>>(),
        second.into_stream().collect::<Vec<_>>()
    );
    assert_eq!(a.len(), 3 * 3 + 1);
    assert_eq!(b.len(), 3 + 1);
}

#[tokio::test]
async fn test_status_after_stream_ends() {
    let mut sim = simulation(chain_project(), config(1, 0.0), Arc::new(ScriptedGenerator::new()));
    while sim.next_unit().await.is_some() {}
    assert_eq!(sim.status(), RunStatus::Completed);
    assert!(sim.next_unit().await.is_none());
}
