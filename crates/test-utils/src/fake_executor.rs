use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use rube::device::ScheduledItem;
use rube::engine::RuntimeEvent;
use rube::errors::Result;
use rube::exec::ExecutorBackend;
use rube::types::ItemOutcome;

/// A fake executor that:
/// - records which items were "run" (task name and command)
/// - immediately reports ItemStarted then ItemFinished for each item,
///   failing with exit code 1 for tasks in the failing set.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<ScheduledItem>>>,
    failing: HashSet<String>,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        executed: Arc<Mutex<Vec<ScheduledItem>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            failing: HashSet::new(),
        }
    }

    /// Every item of `task` fails.
    pub fn failing(mut self, task: &str) -> Self {
        self.failing.insert(task.to_string());
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn dispatch(
        &mut self,
        items: Vec<ScheduledItem>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let failing = self.failing.clone();

        Box::pin(async move {
            for item in items {
                executed.lock().unwrap().push(item.clone());

                let outcome = if failing.contains(&item.task) {
                    ItemOutcome::Failed(1)
                } else {
                    ItemOutcome::Success
                };

                tx.send(RuntimeEvent::ItemStarted { id: item.id })
                    .await
                    .map_err(anyhow::Error::from)?;
                tx.send(RuntimeEvent::ItemFinished {
                    id: item.id,
                    outcome,
                })
                .await
                .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}

/// Task names of recorded items, in dispatch order.
pub fn executed_tasks(executed: &Arc<Mutex<Vec<ScheduledItem>>>) -> Vec<String> {
    executed.lock().unwrap().iter().map(|i| i.task.clone()).collect()
}
