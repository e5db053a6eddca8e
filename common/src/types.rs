use serde::{Deserialize, Serialize};

/// Target temperature plus sensor priority weights for the current
/// schedule window. The weights always sum to 100; the resolver enforces
/// this before a setpoint is handed out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesiredSetpoint {
    pub temperature: f64,
    #[serde(rename = "localWeight")]
    pub local_weight: u8,
    #[serde(rename = "remoteWeight")]
    pub remote_weight: u8,
}

impl DesiredSetpoint {
    /// Setpoint driven entirely by the local sensor.
    pub fn local_only(temperature: f64) -> Self {
        Self {
            temperature,
            local_weight: 100,
            remote_weight: 0,
        }
    }
}

/// Secondary reading fetched from the remote companion node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RemoteReading {
    pub temperature: f64,
    pub humidity: f64,
}

/// One tick's result handed to the long-term store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub current: f64,
    pub desired: f64,
    pub heating: bool,
    pub remote: Option<RemoteReading>,
}

/// Most recent point found in the long-term store, kept only to enrich
/// the status snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LongTermPoint {
    pub temperature: f64,
    pub humidity: Option<f64>,
    pub recorded_epoch: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RelayStatus {
    pub on: bool,
    #[serde(rename = "updatedEpoch")]
    pub updated_epoch: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureStatus {
    pub value: f64,
    #[serde(rename = "updatedEpoch")]
    pub updated_epoch: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SetpointStatus {
    pub temperature: f64,
    #[serde(rename = "localWeight")]
    pub local_weight: u8,
    #[serde(rename = "remoteWeight")]
    pub remote_weight: u8,
    #[serde(rename = "updatedEpoch")]
    pub updated_epoch: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RemoteStatus {
    pub temperature: f64,
    pub humidity: f64,
    #[serde(rename = "updatedEpoch")]
    pub updated_epoch: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LongTermStatus {
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(rename = "recordedEpoch")]
    pub recorded_epoch: i64,
}

/// Read-only snapshot view served to external callers. Every section is
/// independently optional: a field that was never refreshed is omitted
/// rather than reported with a fabricated value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay: Option<RelayStatus>,
    #[serde(rename = "localTemperature", skip_serializing_if = "Option::is_none")]
    pub local_temperature: Option<TemperatureStatus>,
    #[serde(rename = "desiredSetpoint", skip_serializing_if = "Option::is_none")]
    pub desired_setpoint: Option<SetpointStatus>,
    #[serde(rename = "remoteReading", skip_serializing_if = "Option::is_none")]
    pub remote_reading: Option<RemoteStatus>,
    #[serde(rename = "longTermLastPoint", skip_serializing_if = "Option::is_none")]
    pub long_term_last_point: Option<LongTermStatus>,
}
