// lib/src/config/config_structs.rs
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use notifications_service::SmsGatewayConfig;

use crate::config::config_defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub sms: SmsGatewayConfig,
    pub reminders: ReminderConfig,
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub cache_capacity: u64,
    pub use_compression: bool,
    /// Throw the database away on close. Used by tests and demos.
    pub temporary: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_directory: default_data_directory(),
            cache_capacity: default_cache_capacity(),
            use_compression: false,
            temporary: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: u64,
    pub portal_token_ttl_minutes: u64,
    /// YAML file overriding the built-in access policy.
    pub policy_file: Option<PathBuf>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            jwt_secret: String::new(),
            token_ttl_hours: default_token_ttl_hours(),
            portal_token_ttl_minutes: default_portal_token_ttl_minutes(),
            policy_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    pub lookahead_days: u32,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        ReminderConfig {
            lookahead_days: default_lookahead_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub seed_vaccine_catalog: bool,
    pub super_admin_username: String,
    /// No super admin is created when unset.
    pub super_admin_password: Option<String>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        BootstrapConfig {
            seed_vaccine_catalog: true,
            super_admin_username: default_super_admin_username(),
            super_admin_password: None,
        }
    }
}
