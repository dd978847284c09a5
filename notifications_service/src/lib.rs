// notifications_service/src/lib.rs
//! Guardian SMS notifications: message templates, gateway implementations and
//! the background dispatcher that keeps gateway latency out of request handling.

pub mod dispatcher;
pub mod errors;
pub mod gateway;
pub mod notifications;

pub use dispatcher::{DispatchStats, DispatcherHandle, NotificationDispatcher};
pub use errors::NotificationError;
pub use gateway::{build_gateway, HttpSmsGateway, InMemoryGateway, LogOnlyGateway, SmsGateway, SmsGatewayConfig};
pub use notifications::{NotificationKind, SmsMessage};
