//! End-to-end batch runs.

use std::sync::Arc;

use daysim::core::{EventKind, ExtraKey, Task, Worker};
use daysim::error::PreconditionError;
use daysim::generation::HeuristicGenerator;
use daysim::{Error, RunStatus, Simulation};

use crate::fixtures::{chain_project, config, independent_tasks, simulation, ScriptedGenerator};

/// One worker, two independent tasks, one day, nothing random.
#[tokio::test]
async fn test_single_day_two_tasks() {
    let project = (
        independent_tasks(2),
        vec![Worker::new("W1", "Alice").with_tasks(&["T1", "T2"])],
    );
    let mut sim = simulation(project, config(1, 0.0), Arc::new(ScriptedGenerator::new()));

    let report = sim.run().await.unwrap();

    assert_eq!(report.daily_summaries.len(), 1);
    let summary = &report.daily_summaries[0];
    assert_eq!(summary.tasks_started_count, 2);
    assert_eq!(summary.tasks_completed_count, 2);
    assert_eq!(summary.overall_progress_percent, 100.0);
    assert!(report.env_events.is_empty());
    assert_eq!(report.total_logs, 4);
    assert!(sim.tasks().iter().all(Task::is_completed));
    assert_eq!(sim.status(), RunStatus::Completed);
}

#[tokio::test]
async fn test_dependency_gating_over_days() {
    let generator = Arc::new(ScriptedGenerator::new());
    let mut sim = simulation(chain_project(), config(3, 0.0), generator.clone());

    sim.run().await.unwrap();

    let calls = generator.calls();
    assert_eq!(
        calls,
        vec![
            (1, "W1".to_string(), vec!["A".to_string()]),
            (2, "W1".to_string(), vec!["B".to_string()]),
            (3, "W1".to_string(), vec!["C".to_string()]),
        ]
    );
}

#[tokio::test]
async fn test_idle_days_are_silent_even_with_certain_events() {
    let mut sim = simulation(
        chain_project(),
        config(6, 1.0),
        Arc::new(ScriptedGenerator::new()),
    );

    let report = sim.run().await.unwrap();

    // Days 4-6 have nothing eligible.
    assert_eq!(report.env_events.len(), 3);
    assert!(report.env_events.iter().all(|e| e.day <= 3));
    assert_eq!(report.daily_summaries.len(), 3);
    assert_eq!(report.env_summary.unwrap().total_events, 3);
}

#[tokio::test]
async fn test_zero_probability_gives_no_events() {
    let tasks = (1..=5)
        .map(|i| Task::new(&format!("T{}", i), "slow").with_duration(20.0))
        .collect::<Vec<_>>();
    let workers = vec![Worker::new("W1", "Alice").with_tasks(&["T1", "T2", "T3", "T4", "T5"])];
    let mut sim = Simulation::new(
        tasks,
        workers,
        config(15, 0.0),
        Arc::new(HeuristicGenerator::default()),
    )
    .unwrap();

    let report = sim.run().await.unwrap();

    assert!(report.env_events.is_empty());
    assert!(report
        .detailed_logs
        .iter()
        .all(|e| e.event_kind != EventKind::EnvironmentEvent));
}

#[tokio::test]
async fn test_environment_entries_lead_each_day() {
    let mut sim = simulation(
        chain_project(),
        config(3, 1.0),
        Arc::new(ScriptedGenerator::new()),
    );

    let report = sim.run().await.unwrap();

    for day in 1..=3 {
        let first = report
            .detailed_logs
            .iter()
            .find(|e| e.day == day)
            .unwrap();
        assert_eq!(first.event_kind, EventKind::EnvironmentEvent);
        assert!(first.worker_id.is_none());
        assert!(first.extra(ExtraKey::EventId).is_some());
    }
}

#[tokio::test]
async fn test_same_seed_same_report() {
    let run = || async {
        let mut sim = simulation(
            chain_project(),
            config(5, 0.6),
            Arc::new(ScriptedGenerator::new()),
        );
        sim.run().await.unwrap()
    };
    let first = run().await;
    let second = run().await;
    assert_eq!(first.env_events, second.env_events);
    assert_eq!(first.detailed_logs, second.detailed_logs);
}

#[tokio::test]
async fn test_heuristic_generator_finishes_multi_day_tasks() {
    let tasks = vec![
        Task::new("A", "Backend").with_duration(2.0),
        Task::new("B", "Frontend").with_duration(2.0).with_dependencies(&["A"]),
    ];
    let workers = vec![Worker::new("W1", "Alice").with_tasks(&["A", "B"])];
    let mut sim = Simulation::new(
        tasks,
        workers,
        config(10, 0.0),
        Arc::new(HeuristicGenerator::default()),
    )
    .unwrap();

    let report = sim.run().await.unwrap();

    // A takes two days, B two more.
    assert_eq!(report.daily_summaries.len(), 4);
    let completions: Vec<u32> = report
        .detailed_logs
        .iter()
        .filter(|e| e.event_kind == EventKind::TaskComplete)
        .map(|e| e.day)
        .collect();
    assert_eq!(completions, vec![2, 4]);
}

#[test]
fn test_preconditions_rejected_before_any_day() {
    let generator = Arc::new(ScriptedGenerator::new());

    let err = Simulation::new(
        independent_tasks(1),
        Vec::new(),
        config(1, 0.0),
        generator.clone(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Precondition(PreconditionError::EmptyWorkers)));

    let tasks = vec![Task::new("A", "a").with_dependencies(&["missing"])];
    let err = Simulation::new(
        tasks,
        vec![Worker::new("W1", "Alice")],
        config(1, 0.0),
        generator.clone(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::Precondition(PreconditionError::UnknownDependency { .. })
    ));

    let tasks = vec![
        Task::new("A", "a").with_dependencies(&["B"]),
        Task::new("B", "b").with_dependencies(&["A"]),
    ];
    let err = Simulation::new(
        tasks,
        vec![Worker::new("W1", "Alice")],
        config(1, 0.0),
        generator.clone(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::Precondition(PreconditionError::DependencyCycle(_))
    ));
    assert!(generator.calls().is_empty());
}

#[tokio::test]
async fn test_discussions_become_communications() {
    let project = (
        independent_tasks(2),
        vec![
            Worker::new("W1", "Alice").with_tasks(&["T1"]),
            Worker::new("W2", "Bob").with_tasks(&["T2"]),
        ],
    );
    let mut sim = simulation(
        project,
        config(1, 0.0),
        Arc::new(ScriptedGenerator::new().with_discussions()),
    );

    let report = sim.run().await.unwrap();

    let summary = &report.daily_summaries[0];
    assert_eq!(summary.communications.len(), 2);
    assert_eq!(summary.worker_summaries.len(), 2);
    assert_eq!(summary.worker_summaries[0].work_hours, 2.0);
    assert_eq!(summary.worker_summaries[0].efficiency, 87.0);
    let discussion = report
        .detailed_logs
        .iter()
        .find(|e| e.event_kind == EventKind::Discussion)
        .unwrap();
    assert_eq!(discussion.participants, vec!["W1".to_string(), "team".to_string()]);
}
