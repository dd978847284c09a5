// lib/src/config/mod.rs
//! Layered configuration: built-in defaults, then an optional YAML file, then
//! `NEOCARE__<SECTION>__<KEY>` environment variables.

pub mod config_defaults;
pub mod config_structs;

use std::collections::HashMap;
use std::path::Path;

use ::config::{Config, Environment, File};
use log::{debug, info};

pub use config_defaults::*;
pub use config_structs::*;

use crate::errors::{NeoCareError, Result};

impl AppConfig {
    /// Loads the configuration. `path` must exist when given; otherwise
    /// `neocare.yaml` in the working directory is used if present.
    pub fn load(path: Option<&Path>) -> Result<AppConfig> {
        dotenv::dotenv().ok();
        Self::load_with_env(path, None)
    }

    /// Same as [`AppConfig::load`] but reads variables from `env` instead of
    /// the process environment when provided.
    pub fn load_with_env(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<AppConfig> {
        let file = match path {
            Some(p) => {
                info!("Loading configuration from {}", p.display());
                File::from(p).required(true)
            }
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        debug!("Effective configuration: server={:?} storage={:?}", config.server, config.storage);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(NeoCareError::ConfigurationError(format!(
                "auth.jwt_secret must be at least {} bytes",
                MIN_JWT_SECRET_LEN
            )));
        }
        if self.auth.token_ttl_hours == 0 || self.auth.portal_token_ttl_minutes == 0 {
            return Err(NeoCareError::ConfigurationError("token lifetimes must be positive".to_string()));
        }
        if self.sms.enabled && self.sms.endpoint.trim().is_empty() {
            return Err(NeoCareError::ConfigurationError("sms.endpoint is required when sms is enabled".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn yaml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn should_fill_missing_sections_with_defaults() {
        let file = yaml_file(&format!("auth:\n  jwt_secret: \"{}\"\nserver:\n  port: 9090\n", SECRET));
        let config = AppConfig::load_with_env(Some(file.path()), Some(HashMap::new())).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.auth.token_ttl_hours, 12);
        assert_eq!(config.reminders.lookahead_days, 7);
        assert!(config.bootstrap.seed_vaccine_catalog);
        assert!(!config.sms.enabled);
    }

    #[test]
    fn should_let_environment_override_file() {
        let file = yaml_file(&format!("auth:\n  jwt_secret: \"{}\"\nserver:\n  port: 9090\n", SECRET));
        let env = HashMap::from([
            ("NEOCARE__SERVER__PORT".to_string(), "7000".to_string()),
            ("NEOCARE__REMINDERS__LOOKAHEAD_DAYS".to_string(), "3".to_string()),
        ]);
        let config = AppConfig::load_with_env(Some(file.path()), Some(env)).unwrap();
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.reminders.lookahead_days, 3);
    }

    #[test]
    fn should_reject_short_jwt_secret() {
        let file = yaml_file("auth:\n  jwt_secret: \"short\"\n");
        let err = AppConfig::load_with_env(Some(file.path()), Some(HashMap::new())).unwrap_err();
        assert!(matches!(err, NeoCareError::ConfigurationError(_)));
    }

    #[test]
    fn should_fail_when_explicit_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");
        assert!(AppConfig::load_with_env(Some(&missing), Some(HashMap::new())).is_err());
    }
}
