// src/bot.rs
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::msg::Msg;

/// A component that autonomously produces messages from a polled feed.
/// Runs until cancelled; errors are handled (logged) internally and never
/// surfaced to the orchestrator.
#[async_trait]
pub trait Source: Send {
    async fn run(&mut self, cancel: CancellationToken, tx: mpsc::Sender<Msg>);
}

/// A delivery side effect for one message. Must be safe to invoke
/// concurrently for different messages, and must return an error rather
/// than panic on failure.
#[async_trait]
pub trait Output: Send + Sync {
    fn name(&self) -> &'static str;
    async fn deliver(&self, msg: &Msg) -> Result<()>;
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "relay_msgs_dispatched_total",
            "Messages dequeued and fanned out to outputs."
        );
        describe_counter!(
            "relay_deliver_errors_total",
            "Failed delivery attempts, per output."
        );
    });
}

/// Orchestrator: runs every source concurrently and fans each produced
/// message out to every output. The queue between them is bounded, so a
/// slow consumer stalls producers instead of dropping data.
pub struct Bot {
    sources: Vec<Box<dyn Source>>,
    outputs: Vec<Arc<dyn Output>>,
    queue_cap: usize,
}

impl Bot {
    pub fn new(queue_cap: usize) -> Self {
        ensure_metrics_described();
        Self {
            sources: Vec::new(),
            outputs: Vec::new(),
            queue_cap: queue_cap.max(1),
        }
    }

    pub fn add_source(&mut self, source: impl Source + 'static) {
        self.sources.push(Box::new(source));
    }

    pub fn add_output(&mut self, output: impl Output + 'static) {
        self.outputs.push(Arc::new(output));
    }

    /// Run until `cancel` fires or every source has stopped. Delivery
    /// attempts are spawned and not awaited; shutdown does not guarantee
    /// in-flight deliveries complete.
    pub async fn run(self, cancel: CancellationToken) {
        let (tx, mut rx) = mpsc::channel::<Msg>(self.queue_cap);
        let mut source_tasks = Vec::with_capacity(self.sources.len());
        for mut source in self.sources {
            let cancel = cancel.clone();
            let tx = tx.clone();
            source_tasks.push(tokio::spawn(async move { source.run(cancel, tx).await }));
        }
        drop(tx);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                maybe = rx.recv() => {
                    let Some(msg) = maybe else { break };
                    counter!("relay_msgs_dispatched_total").increment(1);
                    let msg = Arc::new(msg);
                    for output in &self.outputs {
                        let output = Arc::clone(output);
                        let msg = Arc::clone(&msg);
                        tokio::spawn(async move {
                            if let Err(e) = output.deliver(&msg).await {
                                counter!("relay_deliver_errors_total", "output" => output.name())
                                    .increment(1);
                                tracing::error!(output = output.name(), error = ?e, "delivery failed");
                            }
                        });
                    }
                }
            }
        }

        // Dropping the receiver unblocks any producer parked on a full
        // queue; the cancellation token stops the rest.
        drop(rx);
        for task in source_tasks {
            let _ = task.await;
        }
        tracing::info!("bot stopped");
    }
}
