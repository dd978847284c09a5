// notifications_service/src/gateway.rs
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::errors::NotificationError;
use crate::notifications::SmsMessage;

/// Settings for the third-party SMS gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmsGatewayConfig {
    /// When false, messages are only logged.
    pub enabled: bool,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub sender_id: String,
    pub timeout_secs: u64,
    pub queue_capacity: usize,
}

impl Default for SmsGatewayConfig {
    fn default() -> Self {
        SmsGatewayConfig {
            enabled: false,
            endpoint: "http://localhost:9090/sms/send".to_string(),
            api_key: None,
            sender_id: "NEOCARE".to_string(),
            timeout_secs: 10,
            queue_capacity: 1024,
        }
    }
}

impl SmsGatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmsGateway: Send + Sync + 'static {
    /// Delivers one message. Implementations must not retry.
    async fn send(&self, message: &SmsMessage) -> Result<(), NotificationError>;
}

#[derive(Debug, Serialize)]
struct GatewayRequest<'a> {
    to: &'a str,
    message: &'a str,
    sender: &'a str,
}

/// Posts messages as JSON to the configured endpoint.
pub struct HttpSmsGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    sender_id: String,
}

impl HttpSmsGateway {
    pub fn new(config: &SmsGatewayConfig) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| NotificationError::Configuration(format!("Failed to build HTTP client: {}", e)))?;
        Ok(HttpSmsGateway {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            sender_id: config.sender_id.clone(),
        })
    }
}

#[async_trait]
impl SmsGateway for HttpSmsGateway {
    async fn send(&self, message: &SmsMessage) -> Result<(), NotificationError> {
        let mut request = self.client.post(&self.endpoint).json(&GatewayRequest {
            to: &message.to,
            message: &message.body,
            sender: &self.sender_id,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected { status: status.as_u16(), body });
        }
        debug!("SMS gateway accepted {:?} message for {}", message.kind, message.to);
        Ok(())
    }
}

/// Used when the gateway is disabled: every message is written to the log.
#[derive(Debug, Default)]
pub struct LogOnlyGateway;

#[async_trait]
impl SmsGateway for LogOnlyGateway {
    async fn send(&self, message: &SmsMessage) -> Result<(), NotificationError> {
        info!("SMS (not sent, gateway disabled) to {}: {}", message.to, message.body);
        Ok(())
    }
}

/// Keeps delivered messages in memory.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    sent: Mutex<Vec<SmsMessage>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SmsMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SmsGateway for InMemoryGateway {
    async fn send(&self, message: &SmsMessage) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .map_err(|e| NotificationError::Internal(format!("Failed to acquire lock: {}", e)))?
            .push(message.clone());
        Ok(())
    }
}

/// Picks the gateway implementation the configuration asks for.
pub fn build_gateway(config: &SmsGatewayConfig) -> Result<Arc<dyn SmsGateway>, NotificationError> {
    if config.enabled {
        info!("SMS gateway enabled, posting to {}", config.endpoint);
        Ok(Arc::new(HttpSmsGateway::new(config)?))
    } else {
        info!("SMS gateway disabled, messages will only be logged");
        Ok(Arc::new(LogOnlyGateway))
    }
}
