use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use calora_common::{RemoteConfig, RemoteReading};

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("companion request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("companion payload rejected: {0}")]
    Payload(String),
}

/// Capability interface over the remote companion node.
pub(crate) trait RemoteCompanion {
    async fn fetch(&self) -> Result<RemoteReading, RemoteError>;
}

#[derive(Debug, Deserialize)]
struct CompanionEnvelope {
    success: bool,
    #[serde(default)]
    data: Option<CompanionData>,
}

#[derive(Debug, Deserialize)]
struct CompanionData {
    temp: f64,
    hum: f64,
}

/// Companion node reached over HTTP. The endpoint answers with
/// `{"success": true, "data": {"temp": .., "hum": ..}}`; anything else is
/// treated as a failed fetch.
pub struct HttpRemoteCompanion {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRemoteCompanion {
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

impl RemoteCompanion for HttpRemoteCompanion {
    async fn fetch(&self) -> Result<RemoteReading, RemoteError> {
        let envelope: CompanionEnvelope = self
            .client
            .get(&self.endpoint)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        decode_envelope(envelope)
    }
}

fn decode_envelope(envelope: CompanionEnvelope) -> Result<RemoteReading, RemoteError> {
    if !envelope.success {
        return Err(RemoteError::Payload(
            "companion reported failure".to_string(),
        ));
    }

    let data = envelope
        .data
        .ok_or_else(|| RemoteError::Payload("missing data section".to_string()))?;
    if !data.temp.is_finite() || !data.hum.is_finite() {
        return Err(RemoteError::Payload("non-finite reading".to_string()));
    }

    Ok(RemoteReading {
        temperature: data.temp,
        humidity: data.hum,
    })
}
