// notifications_service/src/errors.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("SMS gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("SMS gateway rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("SMS gateway did not answer within {0:?}")]
    Timeout(std::time::Duration),
    #[error("Notification queue is closed")]
    QueueClosed,
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Internal notification error: {0}")]
    Internal(String),
}
