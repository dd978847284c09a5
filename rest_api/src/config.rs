// rest_api/src/config.rs
//! Turns a loaded [`AppConfig`] into a running [`AppState`].

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::info;

use models::{NewUser, Role};
use neocare_lib::catalog::seed_default_catalog;
use neocare_lib::config::BootstrapConfig;
use neocare_lib::{open_storage, AppConfig, Clock, StorageEngine, SystemClock};
use notifications_service::{build_gateway, DispatcherHandle, NotificationDispatcher};
use security::{AccessPolicy, JwtKeys};

use crate::state::AppState;

/// Seeds the vaccine catalog and the first super administrator when asked to.
pub async fn bootstrap_storage(storage: &dyn StorageEngine, bootstrap: &BootstrapConfig, now: DateTime<Utc>) -> Result<()> {
    if bootstrap.seed_vaccine_catalog {
        let seeded = seed_default_catalog(storage, now).await.context("Failed to seed vaccine catalog")?;
        if seeded > 0 {
            info!("Seeded {} default vaccines", seeded);
        }
    }

    let Some(password) = &bootstrap.super_admin_password else {
        return Ok(());
    };
    let username = &bootstrap.super_admin_username;
    if storage.get_user_by_username(username).await?.is_some() {
        return Ok(());
    }
    let admin = NewUser {
        first: "System".to_string(),
        last: "Administrator".to_string(),
        username: username.clone(),
        email: format!("{}@neocare.local", username),
        password: password.clone(),
        phone: None,
        role: Role::SuperAdmin,
        hospital_id: None,
    };
    security::create_user(storage, &admin, now)
        .await
        .context("Failed to create initial super administrator")?;
    info!("Created initial super administrator '{}'", username);
    Ok(())
}

/// Opens storage, runs the bootstrap, loads the access policy and starts the
/// notification worker.
pub async fn build_state(config: &AppConfig) -> Result<(AppState, DispatcherHandle)> {
    let storage = open_storage(&config.storage).context("Failed to open storage")?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    bootstrap_storage(&*storage, &config.bootstrap, clock.now()).await?;

    let policy = match &config.auth.policy_file {
        Some(path) => AccessPolicy::from_yaml_file(path)?,
        None => AccessPolicy::default(),
    };
    let gateway = build_gateway(&config.sms).context("Failed to build SMS gateway")?;
    let (dispatcher, handle) = NotificationDispatcher::spawn(gateway, config.sms.queue_capacity, config.sms.timeout());
    let keys = JwtKeys::from_config(&config.auth);

    let state = AppState::new(storage, clock, policy, keys, dispatcher, config.reminders.lookahead_days);
    Ok((state, handle))
}
