//! Task dependency graph: validation, processing order and daily eligibility.
//!
//! The graph is built once per run to reject bad input (unknown dependency
//! ids, duplicate ids, cycles). After validation the day loop only needs
//! the two cheap operations at the bottom of this module:
//! [`processing_order`] and [`eligible_tasks`].

use crate::core::task::{Task, TaskId, TaskStatus};
use crate::core::worker::Worker;
use crate::error::PreconditionError;
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use std::collections::{HashMap, HashSet};

/// The task dependency graph.
///
/// Nodes are task ids; an edge `a -> b` means `b` depends on `a`.
pub struct TaskGraph {
    graph: DiGraph<TaskId, ()>,
}

impl TaskGraph {
    /// Build the graph from a task list.
    ///
    /// # Errors
    /// Returns an error if a task id appears twice or a dependency refers to
    /// a task that is not in the list.
    pub fn build(tasks: &[Task]) -> std::result::Result<Self, PreconditionError> {
        let mut graph = DiGraph::new();
        let mut task_index = HashMap::with_capacity(tasks.len());

        for task in tasks {
            if task_index.contains_key(&task.id) {
                return Err(PreconditionError::DuplicateTask(task.id.clone()));
            }
            let index = graph.add_node(task.id.clone());
            task_index.insert(task.id.clone(), index);
        }

        for task in tasks {
            let to = task_index[&task.id];
            for dep in &task.dependencies {
                let from = task_index.get(dep).ok_or_else(|| {
                    PreconditionError::UnknownDependency {
                        task: task.id.clone(),
                        dependency: dep.clone(),
                    }
                })?;
                if graph.find_edge(*from, to).is_none() {
                    graph.add_edge(*from, to, ());
                }
            }
        }

        Ok(Self { graph })
    }

    /// Reject graphs with a dependency cycle (self-dependencies included).
    pub fn check_acyclic(&self) -> std::result::Result<(), PreconditionError> {
        toposort(&self.graph, None).map(|_| ()).map_err(|cycle| {
            let id = self
                .graph
                .node_weight(cycle.node_id())
                .cloned()
                .unwrap_or_else(|| TaskId::from("unknown"));
            PreconditionError::DependencyCycle(id)
        })
    }

    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl std::fmt::Debug for TaskGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskGraph")
            .field("tasks", &self.task_count())
            .field("dependencies", &self.dependency_count())
            .finish()
    }
}

/// Check the run preconditions: non-empty inputs, known dependencies and an
/// acyclic graph.
pub fn validate(tasks: &[Task], workers: &[Worker]) -> std::result::Result<(), PreconditionError> {
    if tasks.is_empty() {
        return Err(PreconditionError::EmptyTasks);
    }
    if workers.is_empty() {
        return Err(PreconditionError::EmptyWorkers);
    }
    TaskGraph::build(tasks)?.check_acyclic()
}

/// Order tasks so that every task comes after its dependencies.
///
/// Depth-first over the input list: a task's dependencies are emitted before
/// the task itself, and independent tasks keep their input order. Ids not in
/// the task set are skipped. Expects a validated (acyclic) input; a task is
/// marked visited before its dependencies, so a cycle cannot recurse forever.
pub fn processing_order(tasks: &[Task]) -> Vec<Task> {
    let by_id: HashMap<&TaskId, &Task> = tasks.iter().map(|t| (&t.id, t)).collect();
    let mut visited = HashSet::with_capacity(tasks.len());
    let mut ordered = Vec::with_capacity(tasks.len());

    fn visit<'a>(
        task: &'a Task,
        by_id: &HashMap<&'a TaskId, &'a Task>,
        visited: &mut HashSet<&'a TaskId>,
        ordered: &mut Vec<Task>,
    ) {
        if !visited.insert(&task.id) {
            return;
        }
        for dep in &task.dependencies {
            if let Some(dep_task) = by_id.get(dep) {
                visit(dep_task, by_id, visited, ordered);
            }
        }
        ordered.push(task.clone());
    }

    for task in tasks {
        visit(task, &by_id, &mut visited, &mut ordered);
    }
    ordered
}

/// Tasks eligible for work on `day`, in the order given.
///
/// A task is eligible when it is not completed and every dependency refers
/// to a completed task. A dependency on an id missing from `tasks` is never
/// satisfied.
pub fn eligible_tasks(day: u32, tasks: &[Task]) -> Vec<&Task> {
    let status: HashMap<&TaskId, TaskStatus> = tasks.iter().map(|t| (&t.id, t.status)).collect();

    let eligible: Vec<&Task> = tasks
        .iter()
        .filter(|task| !task.is_completed())
        .filter(|task| {
            task.dependencies
                .iter()
                .all(|dep| status.get(dep) == Some(&TaskStatus::Completed))
        })
        .collect();

    crate::slog_debug!("day {}: {} of {} tasks eligible", day, eligible.len(), tasks.len());
    eligible
}
