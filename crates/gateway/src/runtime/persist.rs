//! Fire-and-forget memory persistence.
//!
//! Completed exchanges go through a bounded queue drained by one background
//! worker. Enqueueing never blocks the completion path: a full or closed
//! queue drops the job with a warning.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use sm_domain::chat::ChatMessage;
use sm_domain::memory::MemoryScope;
use sm_domain::trace::TraceEvent;
use sm_memory::MemoryStore;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One exchange waiting to be stored.
#[derive(Debug, Clone)]
pub struct PersistJob {
    pub scope: MemoryScope,
    pub exchange: Vec<ChatMessage>,
}

pub struct PersistQueue {
    tx: Mutex<Option<mpsc::Sender<PersistJob>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PersistQueue {
    /// Create the queue and spawn its worker on the current runtime.
    pub fn spawn(store: Arc<dyn MemoryStore>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_worker(store, rx));
        Self {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Queue a job. Returns `false` when it was dropped.
    pub fn enqueue(&self, job: PersistJob) -> bool {
        let guard = self.tx.lock();
        let Some(tx) = guard.as_ref() else {
            tracing::warn!(scope = %job.scope, "persist queue closed, dropping exchange");
            return false;
        };
        match tx.try_send(job) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(job)) => {
                tracing::warn!(scope = %job.scope, "persist queue full, dropping exchange");
                false
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                tracing::warn!(scope = %job.scope, "persist worker gone, dropping exchange");
                false
            }
        }
    }

    /// Close the queue and wait until every queued job has been handled.
    pub async fn shutdown(&self) {
        drop(self.tx.lock().take());
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                tracing::warn!(error = %e, "persist worker ended abnormally");
            }
        }
    }
}

async fn run_worker(store: Arc<dyn MemoryStore>, mut rx: mpsc::Receiver<PersistJob>) {
    while let Some(job) = rx.recv().await {
        let start = Instant::now();
        let result = store.store(&job.scope, &job.exchange).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        if let Err(ref e) = result {
            tracing::warn!(scope = %job.scope, error = %e, "memory store failed");
        }

        TraceEvent::MemoryPersisted {
            scope: job.scope.to_string(),
            messages: job.exchange.len(),
            ok: result.is_ok(),
            duration_ms,
        }
        .emit();
    }
    tracing::debug!("persist worker stopped");
}
