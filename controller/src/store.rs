use std::sync::Mutex;

use chrono::Utc;
use thiserror::Error;

use calora_common::{LongTermPoint, Measurement};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("no points recorded yet")]
    Empty,
}

/// Capability interface over the long-term time-series store. Writes are
/// fire-and-forget from the loop's perspective; the latest point is only
/// read back to enrich the status snapshot.
pub(crate) trait LongTermStore {
    /// Create the underlying series if it does not exist yet. Safe to
    /// call on every start.
    async fn ensure_series(&self) -> Result<(), StoreError>;

    async fn write_measurement(&self, measurement: &Measurement) -> Result<(), StoreError>;

    async fn latest_point(&self) -> Result<LongTermPoint, StoreError>;
}

/// In-memory stand-in for hosts without a time-series database. Keeps
/// only the most recent point, which is all the snapshot needs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    latest: Mutex<Option<LongTermPoint>>,
}

impl LongTermStore for MemoryStore {
    async fn ensure_series(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn write_measurement(&self, measurement: &Measurement) -> Result<(), StoreError> {
        let point = LongTermPoint {
            temperature: measurement.current,
            humidity: measurement.remote.map(|remote| remote.humidity),
            recorded_epoch: Utc::now().timestamp(),
        };
        *self
            .latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(point);
        Ok(())
    }

    async fn latest_point(&self) -> Result<LongTermPoint, StoreError> {
        self.latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .ok_or(StoreError::Empty)
    }
}
