// src/scheduler/stage.rs

//! Stage partitioning and concurrency sizing.

use crate::discovery::{Task, TaskRole};

/// Used when the number of logical CPUs cannot be determined.
pub const FALLBACK_PARALLELISM: usize = 2;

/// Tasks split into the two scheduler stages, each in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stages {
    pub producers: Vec<Task>,
    pub consumers: Vec<Task>,
}

impl Stages {
    pub fn partition(tasks: Vec<Task>) -> Self {
        let (producers, consumers) = tasks
            .into_iter()
            .partition(|t| t.role == TaskRole::Producer);
        Self {
            producers,
            consumers,
        }
    }

    pub fn len(&self) -> usize {
        self.producers.len() + self.consumers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One line per task, producers first (used by `verify --list`).
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for (stage, tasks) in [("stage 1", &self.producers), ("stage 2", &self.consumers)] {
            for task in tasks {
                out.push_str(&format!(
                    "{stage}  {:<8}  {}  ({})\n",
                    task.role.to_string(),
                    task.id,
                    task.dir.display()
                ));
            }
        }
        out
    }
}

/// Consumer concurrency: explicit override, else logical CPUs, else
/// [`FALLBACK_PARALLELISM`].
pub fn consumer_parallelism(requested: Option<usize>) -> usize {
    match requested {
        Some(n) if n > 0 => n,
        _ => std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(FALLBACK_PARALLELISM),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, role: TaskRole) -> Task {
        Task::new(id, id, "true", role)
    }

    #[test]
    fn partition_keeps_discovery_order_within_each_stage() {
        let stages = Stages::partition(vec![
            task("services/a", TaskRole::Consumer),
            task("libs/core", TaskRole::Producer),
            task("services/b", TaskRole::Consumer),
            task("libs/proto", TaskRole::Producer),
        ]);

        let ids = |ts: &[Task]| ts.iter().map(|t| t.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&stages.producers), vec!["libs/core", "libs/proto"]);
        assert_eq!(ids(&stages.consumers), vec!["services/a", "services/b"]);
    }

    #[test]
    fn explicit_parallelism_wins_and_zero_is_ignored() {
        assert_eq!(consumer_parallelism(Some(3)), 3);
        assert!(consumer_parallelism(Some(0)) >= 1);
        assert!(consumer_parallelism(None) >= 1);
    }
}
