use std::sync::RwLock;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::{
    DesiredSetpoint, LongTermPoint, LongTermStatus, RelayStatus, RemoteReading, RemoteStatus,
    SetpointStatus, StatusReport, TemperatureStatus,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("no cached value available")]
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stamped<T> {
    pub value: T,
    pub updated_at: DateTime<Utc>,
}

impl<T> Stamped<T> {
    fn now(value: T) -> Self {
        Self {
            value,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
struct Snapshot {
    relay: Option<Stamped<bool>>,
    local_temperature: Option<Stamped<f64>>,
    desired_setpoint: Option<Stamped<DesiredSetpoint>>,
    remote_reading: Option<Stamped<RemoteReading>>,
    long_term_point: Option<Stamped<LongTermPoint>>,
}

/// Last-write-wins store of the most recent observed and derived values.
/// Fields are fully independent: updating one never invalidates another,
/// and a field that was never populated reads as `Unavailable` instead of
/// a fabricated value. Written by the control loop (and the actuator for
/// relay state), read by everyone else.
#[derive(Debug, Default)]
pub struct StatusCache {
    snapshot: RwLock<Snapshot>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_relay_state(&self, on: bool) {
        self.write().relay = Some(Stamped::now(on));
    }

    pub fn relay_state(&self) -> Result<Stamped<bool>, CacheError> {
        self.read().relay.ok_or(CacheError::Unavailable)
    }

    pub fn update_local_temperature(&self, value: f64) {
        self.write().local_temperature = Some(Stamped::now(value));
    }

    pub fn local_temperature(&self) -> Result<Stamped<f64>, CacheError> {
        self.read().local_temperature.ok_or(CacheError::Unavailable)
    }

    pub fn update_desired_setpoint(&self, setpoint: DesiredSetpoint) {
        self.write().desired_setpoint = Some(Stamped::now(setpoint));
    }

    pub fn desired_setpoint(&self) -> Result<Stamped<DesiredSetpoint>, CacheError> {
        self.read().desired_setpoint.ok_or(CacheError::Unavailable)
    }

    pub fn update_remote_reading(&self, reading: RemoteReading) {
        self.write().remote_reading = Some(Stamped::now(reading));
    }

    pub fn remote_reading(&self) -> Result<Stamped<RemoteReading>, CacheError> {
        self.read().remote_reading.ok_or(CacheError::Unavailable)
    }

    pub fn update_long_term_point(&self, point: LongTermPoint) {
        self.write().long_term_point = Some(Stamped::now(point));
    }

    pub fn long_term_point(&self) -> Result<Stamped<LongTermPoint>, CacheError> {
        self.read().long_term_point.ok_or(CacheError::Unavailable)
    }

    /// Clear the whole snapshot. Only test harnesses have a reason to do
    /// this.
    pub fn reset(&self) {
        *self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Snapshot::default();
    }

    /// Serializable view of the snapshot, omitting anything that was
    /// never refreshed.
    pub fn report(&self) -> StatusReport {
        let snapshot = self.read();
        StatusReport {
            relay: snapshot.relay.map(|stamped| RelayStatus {
                on: stamped.value,
                updated_epoch: stamped.updated_at.timestamp(),
            }),
            local_temperature: snapshot.local_temperature.map(|stamped| TemperatureStatus {
                value: stamped.value,
                updated_epoch: stamped.updated_at.timestamp(),
            }),
            desired_setpoint: snapshot.desired_setpoint.map(|stamped| SetpointStatus {
                temperature: stamped.value.temperature,
                local_weight: stamped.value.local_weight,
                remote_weight: stamped.value.remote_weight,
                updated_epoch: stamped.updated_at.timestamp(),
            }),
            remote_reading: snapshot.remote_reading.map(|stamped| RemoteStatus {
                temperature: stamped.value.temperature,
                humidity: stamped.value.humidity,
                updated_epoch: stamped.updated_at.timestamp(),
            }),
            long_term_last_point: snapshot.long_term_point.map(|stamped| LongTermStatus {
                temperature: stamped.value.temperature,
                humidity: stamped.value.humidity,
                recorded_epoch: stamped.value.recorded_epoch,
            }),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Snapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Snapshot> {
        self.snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
