use crate::manager::{AcquireOptions, AcquisitionManager};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

/// Acknowledgment for a submitted pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassTicket {
    pub pass_id: Uuid,
    pub submitted_at: DateTime<Utc>,
}

struct QueuedPass {
    ticket: PassTicket,
    options: AcquireOptions,
}

/// Runs acquisition passes on a background task, one at a time, in the
/// order they were submitted. Outcomes are only visible through storage
/// and the logs.
#[derive(Clone)]
pub struct PassQueue {
    sender: mpsc::UnboundedSender<QueuedPass>,
}

impl PassQueue {
    /// Spawn the worker. It stops once every queue handle is dropped and
    /// the backlog is drained.
    pub fn start(manager: Arc<AcquisitionManager>) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::unbounded_channel::<QueuedPass>();

        let worker = tokio::spawn(async move {
            while let Some(pass) = receiver.recv().await {
                let span = info_span!("pass", pass_id = %pass.ticket.pass_id);
                async {
                    info!("Pass started");
                    let report = manager.acquire_all(&pass.options).await;
                    info!(
                        items = report.total_items(),
                        persist_failures = report.persist_failures,
                        outcomes = %serde_json::to_string(&report.outcomes).unwrap_or_default(),
                        "Pass finished"
                    );
                }
                .instrument(span)
                .await;
            }
            info!("Pass queue closed");
        });

        (Self { sender }, worker)
    }

    /// Enqueue a pass and return at once.
    pub fn submit(&self, options: AcquireOptions) -> mise_core::Result<PassTicket> {
        let ticket = PassTicket {
            pass_id: Uuid::new_v4(),
            submitted_at: Utc::now(),
        };

        self.sender
            .send(QueuedPass {
                ticket: ticket.clone(),
                options,
            })
            .map_err(|_| {
                error!(pass_id = %ticket.pass_id, "Pass worker is gone");
                mise_core::Error::Scraping("acquisition worker has stopped".to_string())
            })?;

        info!(pass_id = %ticket.pass_id, "Pass queued");
        Ok(ticket)
    }
}
