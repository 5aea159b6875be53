use super::executor::{ActionExecutor, executor_for};
use super::options::ExecutionOptions;
use super::result::ActionResult;
use crate::graph::{ExecutableGraph, NodeId};
use crate::plan::PlanKind;
use futures_util::future::join_all;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;
use tracing::debug;

/// Counts in-flight tasks of one container.
#[derive(Debug, Default)]
pub struct TaskTracker {
    active: AtomicUsize,
    idle: Notify,
}

impl TaskTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers a task; it stays in flight until the guard drops.
    pub fn track(self: &Arc<Self>) -> TaskGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        TaskGuard {
            tracker: Arc::clone(self),
        }
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Resolves once no task is in flight.
    pub async fn wait(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.active() == 0 {
                return;
            }
            notified.await;
        }
    }
}

pub struct TaskGuard {
    tracker: Arc<TaskTracker>,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        if self.tracker.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.tracker.idle.notify_waiters();
        }
    }
}

/// One queue entry: a single node, or a group of concurrent siblings.
#[derive(Debug)]
pub struct TaskContainer {
    tasks: Vec<NodeId>,
    tracker: Arc<TaskTracker>,
}

impl TaskContainer {
    fn new(tasks: Vec<NodeId>) -> Self {
        Self {
            tasks,
            tracker: TaskTracker::new(),
        }
    }

    pub fn tasks(&self) -> &[NodeId] {
        &self.tasks
    }

    async fn run(
        &self,
        executor: &dyn ActionExecutor,
        parallel: bool,
    ) -> Vec<(NodeId, ActionResult)> {
        let results = if parallel && self.tasks.len() > 1 {
            join_all(self.tasks.iter().map(|&id| {
                let guard = self.tracker.track();
                async move {
                    let result = executor.execute_action(id).await;
                    drop(guard);
                    (id, result)
                }
            }))
            .await
        } else {
            let mut results = Vec::with_capacity(self.tasks.len());
            for &id in &self.tasks {
                let _guard = self.tracker.track();
                results.push((id, executor.execute_action(id).await));
            }
            results
        };
        self.tracker.wait().await;
        results
    }
}

/// FIFO of task containers driven one step at a time by the dispatcher.
pub struct TaskManager {
    graph: Arc<ExecutableGraph>,
    executor: Arc<dyn ActionExecutor>,
    parallel_siblings: bool,
    queue: VecDeque<TaskContainer>,
}

impl TaskManager {
    pub fn new(kind: PlanKind, graph: Arc<ExecutableGraph>, options: &ExecutionOptions) -> Self {
        let executor = executor_for(kind, Arc::clone(&graph), options.clone());
        Self::with_executor(graph, executor, options)
    }

    pub fn with_executor(
        graph: Arc<ExecutableGraph>,
        executor: Arc<dyn ActionExecutor>,
        options: &ExecutionOptions,
    ) -> Self {
        Self {
            graph,
            executor,
            parallel_siblings: options.parallel_siblings,
            queue: VecDeque::new(),
        }
    }

    fn known(&self, id: NodeId) -> bool {
        self.graph.node(id).is_some()
    }

    /// Queues a single node. Returns `false` for ids outside the graph.
    pub fn add_task(&mut self, id: NodeId) -> bool {
        if !self.known(id) {
            return false;
        }
        self.queue.push_back(TaskContainer::new(vec![id]));
        true
    }

    /// Queues sibling nodes as one group. Nothing is queued if any id is
    /// unknown or the group is empty.
    pub fn add_tasks(&mut self, ids: &[NodeId]) -> bool {
        if ids.is_empty() || !ids.iter().all(|id| self.known(*id)) {
            return false;
        }
        self.queue.push_back(TaskContainer::new(ids.to_vec()));
        true
    }

    /// Drops a queued node; containers left empty are dropped too.
    pub fn remove_task(&mut self, id: NodeId) -> bool {
        let mut removed = false;
        for container in &mut self.queue {
            let before = container.tasks.len();
            container.tasks.retain(|task| *task != id);
            removed |= container.tasks.len() != before;
        }
        self.queue.retain(|container| !container.tasks.is_empty());
        removed
    }

    /// Returns `true` only if every id was queued.
    pub fn remove_tasks(&mut self, ids: &[NodeId]) -> bool {
        ids.iter()
            .fold(true, |all, id| self.remove_task(*id) && all)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Runs the next container to completion; `None` when the queue is empty.
    pub async fn step(&mut self) -> Option<Vec<(NodeId, ActionResult)>> {
        let container = self.queue.pop_front()?;
        debug!(tasks = ?container.tasks(), parallel = self.parallel_siblings, "task_manager.step");
        Some(
            container
                .run(self.executor.as_ref(), self.parallel_siblings)
                .await,
        )
    }
}
