//! Best-effort delivery of account alerts.
//!
//! Alerts are pushed onto a bounded channel and delivered by a single
//! worker task. Enqueueing never waits: a full or closed queue drops the
//! alert and says so on the returned [`DeliveryTicket`].

use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use meridian_core::notification::Notification;
use meridian_shared::Mailer;

/// Final state of one queued alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// The mailer accepted the message.
    Sent,
    /// The mailer returned an error.
    Failed(String),
    /// The alert never reached the mailer.
    Dropped,
}

/// Handle on the outcome of one enqueued alert.
///
/// Dropping the ticket does not cancel delivery.
#[derive(Debug)]
pub struct DeliveryTicket {
    status: oneshot::Receiver<DeliveryStatus>,
}

impl DeliveryTicket {
    /// Waits until the worker has handled the alert.
    pub async fn wait(self) -> DeliveryStatus {
        self.status.await.unwrap_or(DeliveryStatus::Dropped)
    }

    /// Returns the status if the alert has already been handled.
    pub fn try_status(&mut self) -> Option<DeliveryStatus> {
        match self.status.try_recv() {
            Ok(status) => Some(status),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(DeliveryStatus::Dropped),
        }
    }
}

struct Job {
    notification: Notification,
    done: oneshot::Sender<DeliveryStatus>,
}

/// Sending side of the alert queue. Cheap to clone.
#[derive(Clone)]
pub struct NotificationQueue {
    jobs: mpsc::Sender<Job>,
}

impl NotificationQueue {
    /// Starts the delivery worker.
    ///
    /// The worker exits once every clone of the returned queue is dropped
    /// and the backlog is drained.
    #[must_use]
    pub fn spawn(mailer: Arc<dyn Mailer>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (jobs, mut pending) = mpsc::channel::<Job>(capacity.max(1));

        let worker = tokio::spawn(async move {
            while let Some(job) = pending.recv().await {
                let status = deliver(mailer.as_ref(), &job.notification).await;
                // The caller may have dropped its ticket
                let _ = job.done.send(status);
            }
            debug!("Notification queue closed");
        });

        (Self { jobs }, worker)
    }

    /// Queues an alert without waiting.
    pub fn enqueue(&self, notification: Notification) -> DeliveryTicket {
        let (done, status) = oneshot::channel();
        let job = Job { notification, done };

        if let Err(err) = self.jobs.try_send(job) {
            let (reason, job) = match err {
                TrySendError::Full(job) => ("queue full", job),
                TrySendError::Closed(job) => ("queue closed", job),
            };
            warn!(
                to = %job.notification.recipient().email,
                reason,
                "Notification dropped"
            );
            let _ = job.done.send(DeliveryStatus::Dropped);
        }

        DeliveryTicket { status }
    }
}

async fn deliver(mailer: &dyn Mailer, notification: &Notification) -> DeliveryStatus {
    let to = &notification.recipient().email;
    match mailer
        .send(to, &notification.subject(), &notification.body())
        .await
    {
        Ok(()) => {
            info!(to = %to, "Notification sent");
            DeliveryStatus::Sent
        }
        Err(e) => {
            warn!(to = %to, error = %e, "Failed to send notification");
            DeliveryStatus::Failed(e.to_string())
        }
    }
}
