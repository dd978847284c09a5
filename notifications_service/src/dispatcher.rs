// notifications_service/src/dispatcher.rs
//! Bounded queue plus a single background worker that talks to the gateway.
//! Producers never wait on the gateway: `enqueue` returns immediately and a
//! full or closed queue only costs a log line.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::errors::NotificationError;
use crate::gateway::SmsGateway;
use crate::notifications::SmsMessage;

enum Envelope {
    Deliver(SmsMessage),
    Flush(oneshot::Sender<()>),
}

/// Counters reported when the worker stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: u64,
    pub failed: u64,
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::Sender<Envelope>,
}

/// Owner of the worker task. The worker exits once every dispatcher clone is dropped.
pub struct DispatcherHandle {
    join: JoinHandle<DispatchStats>,
}

impl NotificationDispatcher {
    /// Starts the worker on the current tokio runtime.
    pub fn spawn(gateway: Arc<dyn SmsGateway>, capacity: usize, send_timeout: Duration) -> (Self, DispatcherHandle) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let join = tokio::spawn(run_worker(gateway, rx, send_timeout));
        (NotificationDispatcher { tx }, DispatcherHandle { join })
    }

    /// Queues a message without waiting. Returns false when it was dropped.
    pub fn enqueue(&self, message: SmsMessage) -> bool {
        match self.tx.try_send(Envelope::Deliver(message)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(Envelope::Deliver(message))) => {
                warn!("Notification queue full, dropping {:?} message for {}", message.kind, message.to);
                false
            }
            Err(_) => {
                warn!("Notification queue closed, message dropped");
                false
            }
        }
    }

    /// Resolves once every message queued before this call has been handled.
    pub async fn flush(&self) -> Result<(), NotificationError> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(Envelope::Flush(ack))
            .await
            .map_err(|_| NotificationError::QueueClosed)?;
        done.await.map_err(|_| NotificationError::QueueClosed)
    }
}

impl DispatcherHandle {
    /// Waits for the worker to drain and stop.
    pub async fn shutdown(self) -> DispatchStats {
        match self.join.await {
            Ok(stats) => stats,
            Err(e) => {
                error!("Notification worker terminated abnormally: {}", e);
                DispatchStats::default()
            }
        }
    }
}

async fn run_worker(
    gateway: Arc<dyn SmsGateway>,
    mut rx: mpsc::Receiver<Envelope>,
    send_timeout: Duration,
) -> DispatchStats {
    let mut stats = DispatchStats::default();
    while let Some(envelope) = rx.recv().await {
        match envelope {
            Envelope::Deliver(message) => match timeout(send_timeout, gateway.send(&message)).await {
                Ok(Ok(())) => {
                    stats.delivered += 1;
                    debug!("Delivered {:?} SMS to {}", message.kind, message.to);
                }
                Ok(Err(e)) => {
                    stats.failed += 1;
                    warn!("Failed to deliver {:?} SMS to {}: {}", message.kind, message.to, e);
                }
                Err(_) => {
                    stats.failed += 1;
                    warn!(
                        "Failed to deliver {:?} SMS to {}: {}",
                        message.kind,
                        message.to,
                        NotificationError::Timeout(send_timeout)
                    );
                }
            },
            Envelope::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
    debug!("Notification worker stopped: {:?}", stats);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{InMemoryGateway, MockSmsGateway};
    use crate::notifications::tests::{child, vaccine};
    use chrono::NaiveDate;

    fn message() -> SmsMessage {
        SmsMessage::vaccination_administered(&child(), &vaccine(), NaiveDate::from_ymd_opt(2025, 2, 12).unwrap())
    }

    #[tokio::test]
    async fn should_deliver_queued_messages() {
        let gateway = Arc::new(InMemoryGateway::new());
        let (dispatcher, handle) = NotificationDispatcher::spawn(gateway.clone(), 8, Duration::from_secs(1));
        assert!(dispatcher.enqueue(message()));
        assert!(dispatcher.enqueue(message()));
        dispatcher.flush().await.unwrap();
        assert_eq!(gateway.sent().len(), 2);

        drop(dispatcher);
        let stats = handle.shutdown().await;
        assert_eq!(stats, DispatchStats { delivered: 2, failed: 0 });
    }

    #[tokio::test]
    async fn should_count_gateway_failures_without_stopping() {
        let mut gateway = MockSmsGateway::new();
        let mut calls = 0;
        gateway.expect_send().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(NotificationError::Rejected { status: 503, body: "busy".into() })
            } else {
                Ok(())
            }
        });
        let (dispatcher, handle) = NotificationDispatcher::spawn(Arc::new(gateway), 8, Duration::from_secs(1));
        dispatcher.enqueue(message());
        dispatcher.enqueue(message());
        drop(dispatcher);
        assert_eq!(handle.shutdown().await, DispatchStats { delivered: 1, failed: 1 });
    }

    #[tokio::test]
    async fn should_drop_messages_when_queue_is_full() {
        let mut gateway = MockSmsGateway::new();
        gateway.expect_send().returning(|_| Ok(()));
        let (dispatcher, handle) = NotificationDispatcher::spawn(Arc::new(gateway), 1, Duration::from_secs(1));
        // The worker has not been polled yet on this single-threaded runtime,
        // so the second message finds the single slot occupied.
        assert!(dispatcher.enqueue(message()));
        assert!(!dispatcher.enqueue(message()));
        drop(dispatcher);
        assert_eq!(handle.shutdown().await.delivered, 1);
    }
}
