//! Single-flight command queue.
//!
//! All inbound commands flow through one unbounded FIFO channel drained by
//! exactly one worker task, which is what makes the browser session an
//! implicitly exclusive resource: no lock guards session creation because
//! no two workflows can ever overlap. Enqueueing never blocks; a command
//! that arrives mid-lookup simply waits its turn. Anyone replacing this
//! queue with a concurrent one must add explicit mutual exclusion around
//! session creation.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::commands::{Command, ack_message};
use crate::messenger::{Messenger, Reply};

/// Resolves one command into a reply. Implementations catch their own
/// domain failures and fold them into reply text; an `Err` here is a last
/// resort and becomes a generic error reply.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, command: &Command) -> Result<Reply>;
}

/// One queued command plus its arrival time.
struct QueueEntry {
    command: Command,
    enqueued_at: DateTime<Utc>,
}

/// Handle to the queue. Cloneable senders are not exposed; callers share
/// the `Dispatcher` itself.
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<QueueEntry>,
    worker: JoinHandle<()>,
}

impl Dispatcher {
    /// Start the single worker loop.
    pub fn spawn(executor: Arc<dyn CommandExecutor>, messenger: Arc<dyn Messenger>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(worker_loop(rx, executor, messenger));
        Self { tx, worker }
    }

    /// Enqueue a command; returns `false` once the worker has shut down.
    pub fn enqueue(&self, command: Command) -> bool {
        self.tx
            .send(QueueEntry {
                command,
                enqueued_at: Utc::now(),
            })
            .is_ok()
    }

    /// Stop accepting commands and wait for the queue to drain.
    pub async fn close(self) {
        drop(self.tx);
        let _ = self.worker.await;
    }
}

async fn worker_loop(
    mut rx: mpsc::UnboundedReceiver<QueueEntry>,
    executor: Arc<dyn CommandExecutor>,
    messenger: Arc<dyn Messenger>,
) {
    while let Some(entry) = rx.recv().await {
        let QueueEntry {
            command,
            enqueued_at,
        } = entry;
        let waited_ms = (Utc::now() - enqueued_at).num_milliseconds();
        info!(kind = command.kind.as_str(), waited_ms, "processing command");

        if let Some(ack) = ack_message(command.kind) {
            if let Err(err) = messenger.send_text(&command.reply_to, ack).await {
                warn!(%err, "acknowledgment delivery failed");
            }
        }

        // A failure here is scoped to this entry; the loop always moves on.
        let reply = match executor.execute(&command).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(kind = command.kind.as_str(), %err, "command failed");
                Reply::Text(format!("❌ Error: {err}"))
            }
        };

        if let Err(err) = messenger.deliver(&command.reply_to, reply).await {
            warn!(%err, "reply delivery failed");
        }
    }
}
