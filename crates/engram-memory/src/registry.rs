// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extractor registry and post-commit notification fan-out.
//!
//! Each attached extractor gets its own unbounded channel and a detached
//! worker task. Fan-out enqueues and returns immediately, so the write path
//! never waits on an extractor, and one slow or failing extractor cannot
//! delay delivery to the others. Per-extractor queues preserve commit order
//! for a given session; nothing is ordered across extractors or sessions.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};

use engram_core::Extractor;
use engram_core::types::MessageEvent;
use futures::FutureExt;
use metrics::counter;
use tokio::sync::mpsc;
use tracing::{debug, warn};

struct Worker {
    name: String,
    tx: mpsc::UnboundedSender<MessageEvent>,
}

/// The set of attached extractors.
///
/// Attach and detach are safe under concurrent dispatch: `notify` snapshots
/// the sender set, so a registration change never races a single delivery.
#[derive(Default)]
pub struct ExtractorRegistry {
    workers: RwLock<Vec<Worker>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extractor and spawn its worker task.
    ///
    /// The worker owns its queue for the lifetime of the registration and
    /// runs detached from any request scope: cancelling a caller after its
    /// write committed cannot cancel deliveries already enqueued. Must be
    /// called from within a tokio runtime.
    pub fn attach(&self, extractor: Arc<dyn Extractor>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<MessageEvent>();
        let name = extractor.name().to_string();
        let worker_name = name.clone();

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let session_id = event.session_id.clone();
                // Errors and panics stop at this boundary. They are
                // reported through logs and metrics only; the writer that
                // triggered the event has long since returned.
                let outcome = AssertUnwindSafe(extractor.notify(&event))
                    .catch_unwind()
                    .await;
                match outcome {
                    Ok(Ok(())) => {
                        counter!("engram_extractor_notifications_total").increment(1);
                    }
                    Ok(Err(e)) => {
                        counter!("engram_extractor_errors_total").increment(1);
                        warn!(
                            extractor = %worker_name,
                            session_id = %session_id,
                            error = %e,
                            "extractor failed"
                        );
                    }
                    Err(_) => {
                        counter!("engram_extractor_errors_total").increment(1);
                        warn!(
                            extractor = %worker_name,
                            session_id = %session_id,
                            "extractor panicked"
                        );
                    }
                }
            }
            debug!(extractor = %worker_name, "extractor worker drained and stopped");
        });

        self.workers
            .write()
            .expect("registry lock poisoned")
            .push(Worker { name, tx });
    }

    /// Remove all registrations with the given name.
    ///
    /// Dropping the sender closes the queue; the worker drains already
    /// enqueued events and then exits.
    pub fn detach(&self, name: &str) {
        self.workers
            .write()
            .expect("registry lock poisoned")
            .retain(|w| w.name != name);
    }

    /// Number of currently attached extractors.
    pub fn len(&self) -> usize {
        self.workers.read().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fan an event out to every currently attached extractor.
    ///
    /// When `suppress` is true nothing is delivered; extractors use this
    /// for their own callback-triggered writes so they do not re-enter the
    /// pipeline. Enqueueing never blocks.
    pub fn notify(&self, event: MessageEvent, suppress: bool) {
        if suppress {
            debug!(session_id = %event.session_id, "notification suppressed");
            return;
        }

        let workers = self.workers.read().expect("registry lock poisoned");
        for worker in workers.iter() {
            // A send error means the worker already exited; its
            // registration is pruned on the next detach.
            if worker.tx.send(event.clone()).is_err() {
                debug!(extractor = %worker.name, "dropping event for stopped worker");
            }
        }
    }
}
