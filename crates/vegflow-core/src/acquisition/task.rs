//! Background acquisition tasks and their status.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::acquisition::downloader::{Downloader, ProgressEvent, RunSummary};
use crate::acquisition::plan::AcquisitionPlan;
use crate::error::{Result, VegflowError};

/// Unique identifier for an acquisition task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = VegflowError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(TaskId)
            .map_err(|e| VegflowError::invalid_parameter("task_id", e.to_string()))
    }
}

/// Lifecycle of an acquisition task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running { completed: usize, total: usize },
    Finished { summary: RunSummary },
    Failed { reason: String },
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Finished { .. } | TaskStatus::Failed { .. })
    }
}

/// In-memory registry of acquisition tasks
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: Arc<RwLock<HashMap<TaskId, TaskStatus>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a new task id in `Pending` state
    pub async fn register(&self) -> TaskId {
        let id = TaskId::new();
        self.tasks.write().await.insert(id, TaskStatus::Pending);
        id
    }

    /// Track a caller-chosen id in `Pending` state.
    ///
    /// Fails when the id is already known.
    pub async fn insert(&self, id: TaskId) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&id) {
            return Err(VegflowError::invalid_parameter("task_id", format!("task {} already exists", id)));
        }
        tasks.insert(id, TaskStatus::Pending);
        Ok(())
    }

    pub async fn status(&self, id: TaskId) -> Option<TaskStatus> {
        self.tasks.read().await.get(&id).cloned()
    }

    pub async fn list(&self) -> Vec<(TaskId, TaskStatus)> {
        self.tasks.read().await.iter().map(|(id, status)| (*id, status.clone())).collect()
    }

    /// Forget a finished or failed task, returning its last status.
    ///
    /// Tasks that are still pending or running are kept and `None` is returned.
    pub async fn remove(&self, id: TaskId) -> Option<TaskStatus> {
        let mut tasks = self.tasks.write().await;
        if tasks.get(&id).is_some_and(TaskStatus::is_terminal) {
            tasks.remove(&id)
        } else {
            None
        }
    }

    /// Drop every finished or failed task, returning how many were removed
    pub async fn prune_finished(&self) -> usize {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, status| !status.is_terminal());
        before - tasks.len()
    }

    async fn set(&self, id: TaskId, status: TaskStatus) {
        self.tasks.write().await.insert(id, status);
    }

    /// Register and start a task
    pub async fn submit(
        &self,
        downloader: Downloader,
        plan: AcquisitionPlan,
        progress: Option<mpsc::UnboundedSender<ProgressEvent>>,
    ) -> (TaskId, JoinHandle<Result<RunSummary>>) {
        let id = self.register().await;
        (id, self.start(id, downloader, plan, progress))
    }

    /// Run `plan` in the background under a registered id.
    ///
    /// Status moves to `Running` with a completed-job count as progress
    /// events arrive, and ends as `Finished` or `Failed`. Events are also
    /// forwarded to `progress` when given.
    pub fn start(
        &self,
        id: TaskId,
        downloader: Downloader,
        plan: AcquisitionPlan,
        progress: Option<mpsc::UnboundedSender<ProgressEvent>>,
    ) -> JoinHandle<Result<RunSummary>> {
        let registry = self.clone();

        tokio::spawn(async move {
            let total = plan.job_count();
            registry.set(id, TaskStatus::Running { completed: 0, total }).await;
            tracing::info!(task_id = %id, dataset = %plan.dataset_name, "Task started");

            let (tx, mut rx) = mpsc::unbounded_channel();
            let run = downloader.run(&plan, Some(tx));

            let track = async {
                let mut completed = 0;
                while let Some(event) = rx.recv().await {
                    if let ProgressEvent::JobFinished { .. } = event {
                        completed += 1;
                        registry.set(id, TaskStatus::Running { completed, total }).await;
                    }
                    if let Some(forward) = &progress {
                        let _ = forward.send(event);
                    }
                }
            };

            let (result, ()) = tokio::join!(run, track);

            match &result {
                Ok(summary) => {
                    tracing::info!(task_id = %id, downloaded = summary.downloaded, "Task finished");
                    registry.set(id, TaskStatus::Finished { summary: summary.clone() }).await;
                }
                Err(e) => {
                    tracing::error!(task_id = %id, error = %e, "Task failed");
                    registry.set(id, TaskStatus::Failed { reason: e.to_string() }).await;
                }
            }

            result
        })
    }
}
