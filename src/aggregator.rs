//! Concurrent fan-out of labelled queries.
//!
//! Used by the Home overview to query every module at once. Each task's
//! outcome is kept under its label; a failing or panicking task never hides
//! the results of the others.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;
use thiserror::Error;
use tokio::task::JoinSet;

use crate::error::ModuleError;

/// Why a task produced no value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskFailure {
    #[error(transparent)]
    Failed(#[from] ModuleError),
    #[error("task panicked")]
    Panicked,
    /// The task was cancelled or its outcome was otherwise lost.
    #[error("task produced no result")]
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    #[error("duplicate task label '{0}'")]
    DuplicateLabel(String),
}

pub type TaskOutcome = Result<String, TaskFailure>;

type Task = BoxFuture<'static, Result<String, ModuleError>>;

/// Labelled tasks waiting to run.
#[derive(Default)]
pub struct TaskSet {
    tasks: Vec<(String, Task)>,
}

impl fmt::Debug for TaskSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.tasks.iter().map(|(label, _)| label))
            .finish()
    }
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task. Labels identify results, so they must be unique.
    pub fn add<F>(&mut self, label: impl Into<String>, task: F) -> Result<(), AggregateError>
    where
        F: Future<Output = Result<String, ModuleError>> + Send + 'static,
    {
        let label = label.into();
        if self.tasks.iter().any(|(existing, _)| *existing == label) {
            return Err(AggregateError::DuplicateLabel(label));
        }
        self.tasks.push((label, task.boxed()));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every task concurrently and wait for all of them.
    pub async fn aggregate(self) -> Aggregate {
        let mut set = JoinSet::new();
        let mut labels = HashMap::new();
        let mut order = Vec::with_capacity(self.tasks.len());

        for (label, task) in self.tasks {
            let handle = set.spawn(task);
            labels.insert(handle.id(), label.clone());
            order.push(label);
        }

        let mut results: HashMap<String, TaskOutcome> = HashMap::new();
        while let Some(joined) = set.join_next_with_id().await {
            match joined {
                Ok((id, outcome)) => {
                    if let Some(label) = labels.remove(&id) {
                        results.insert(label, outcome.map_err(TaskFailure::from));
                    }
                }
                Err(err) => {
                    let Some(label) = labels.remove(&err.id()) else {
                        continue;
                    };
                    let failure = if err.is_panic() {
                        tracing::error!(task = %label, "aggregated task panicked");
                        TaskFailure::Panicked
                    } else {
                        TaskFailure::Missing
                    };
                    results.insert(label, Err(failure));
                }
            }
        }

        for label in &order {
            results
                .entry(label.clone())
                .or_insert(Err(TaskFailure::Missing));
        }

        Aggregate { order, results }
    }
}

/// Outcome of every task, keyed by label.
#[derive(Debug, Clone, Default)]
pub struct Aggregate {
    order: Vec<String>,
    results: HashMap<String, TaskOutcome>,
}

impl Aggregate {
    pub fn get(&self, label: &str) -> Option<&TaskOutcome> {
        self.results.get(label)
    }

    /// Outcomes in submission order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TaskOutcome)> {
        self.order
            .iter()
            .filter_map(|label| self.results.get(label).map(|r| (label.as_str(), r)))
    }

    pub fn successes(&self) -> usize {
        self.results.values().filter(|r| r.is_ok()).count()
    }

    pub fn failures(&self) -> usize {
        self.results.values().filter(|r| r.is_err()).count()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetworkError;
    use std::time::Duration;

    #[tokio::test]
    async fn test_every_label_gets_an_outcome() {
        let mut tasks = TaskSet::new();
        tasks.add("one", async { Ok("1".to_string()) }).unwrap();
        tasks
            .add("two", async {
                Err(ModuleError::Fetch(NetworkError::from_status(500, "boom", None)))
            })
            .unwrap();
        tasks.add("three", async { Ok("3".to_string()) }).unwrap();

        let aggregate = tasks.aggregate().await;

        assert_eq!(aggregate.len(), 3);
        assert_eq!(aggregate.successes(), 2);
        assert_eq!(aggregate.failures(), 1);
        assert_eq!(aggregate.get("one"), Some(&Ok("1".to_string())));
        assert!(matches!(aggregate.get("two"), Some(Err(TaskFailure::Failed(_)))));
        assert_eq!(aggregate.get("three"), Some(&Ok("3".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tasks_run_concurrently_and_keep_submission_order() {
        let mut tasks = TaskSet::new();
        for (label, ms) in [("slow", 300u64), ("fast", 10), ("mid", 100)] {
            tasks
                .add(label, async move {
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    Ok(label.to_string())
                })
                .unwrap();
        }

        let start = tokio::time::Instant::now();
        let aggregate = tasks.aggregate().await;

        assert!(start.elapsed() < Duration::from_millis(400));
        let labels: Vec<&str> = aggregate.iter().map(|(label, _)| label).collect();
        assert_eq!(labels, vec!["slow", "fast", "mid"]);
    }

    #[tokio::test]
    async fn test_panicking_task_is_reported() {
        let mut tasks = TaskSet::new();
        tasks.add("ok", async { Ok("fine".to_string()) }).unwrap();
        tasks
            .add("bad", async {
                if true {
                    panic!("summary query blew up");
                }
                Ok(String::new())
            })
            .unwrap();

        let aggregate = tasks.aggregate().await;
        assert_eq!(aggregate.get("bad"), Some(&Err(TaskFailure::Panicked)));
        assert_eq!(aggregate.get("ok"), Some(&Ok("fine".to_string())));
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let mut tasks = TaskSet::new();
        tasks.add("x", async { Ok(String::new()) }).unwrap();
        let err = tasks.add("x", async { Ok(String::new()) }).unwrap_err();
        assert_eq!(err, AggregateError::DuplicateLabel("x".to_string()));
        assert_eq!(tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_set() {
        let aggregate = TaskSet::new().aggregate().await;
        assert!(aggregate.is_empty());
        assert_eq!(aggregate.iter().count(), 0);
    }
}
