mod actuator;
mod calendar;
mod hal;
mod remote;
mod sensing;
mod service;
mod store;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono_tz::Tz;
use tracing::info;

use calora_common::cache::StatusCache;
use calora_common::ControllerConfig;

use crate::actuator::RelayController;
use crate::calendar::{FileCalendar, SetpointResolver};
use crate::hal::{GpioRelay, W1Probe};
use crate::remote::HttpRemoteCompanion;
use crate::sensing::LocalTempReader;
use crate::service::Orchestrator;
use crate::store::MemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ControllerConfig::from_env();
    let timezone: Tz = config
        .timezone
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {}", config.timezone))?;

    let calendar_path =
        std::env::var("CALENDAR_FILE").unwrap_or_else(|_| "./calendar.json".to_string());

    let cache = Arc::new(StatusCache::new());
    let resolver = SetpointResolver::new(
        FileCalendar::new(PathBuf::from(calendar_path), timezone),
        cache.clone(),
        config.min_temp,
        config.max_temp,
        Duration::from_secs(config.calendar_timeout_secs),
    );
    let local = LocalTempReader::new(W1Probe::new(&config.sensor_id), cache.clone());
    let actuator = RelayController::new(GpioRelay::new(config.relay_pin), cache.clone());
    let remote = match &config.remote {
        Some(remote_config) => Some(
            HttpRemoteCompanion::new(remote_config)
                .context("failed to build remote companion client")?,
        ),
        None => None,
    };
    let store = MemoryStore::default();

    info!(
        timezone = %config.timezone,
        interval_secs = config.poll_interval_secs,
        remote_enabled = config.remote.is_some(),
        "starting heating controller"
    );

    Orchestrator::new(config, cache, resolver, local, actuator, remote, store)
        .run()
        .await;

    Ok(())
}
