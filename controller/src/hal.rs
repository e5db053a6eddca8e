use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("sensor io: {0}")]
    Io(#[from] io::Error),
    #[error("sensor payload malformed: {0}")]
    Malformed(String),
    #[error("sensor crc check failed")]
    Crc,
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay io: {0}")]
    Io(#[from] io::Error),
    #[error("relay state malformed: {0}")]
    Malformed(String),
}

/// Capability interface over a physical temperature sensor. The core only
/// relies on the call completing with a value or an error.
pub(crate) trait TemperatureProbe {
    async fn read(&self) -> Result<f64, ProbeError>;
}

/// Capability interface over the binary heating relay.
pub(crate) trait RelayDriver {
    async fn read(&self) -> Result<bool, RelayError>;
    async fn write(&self, on: bool) -> Result<(), RelayError>;
}

/// DS18B20 probe behind the Linux 1-Wire sysfs interface.
pub struct W1Probe {
    path: PathBuf,
}

impl W1Probe {
    pub fn new(sensor_id: &str) -> Self {
        Self {
            path: PathBuf::from(format!("/sys/bus/w1/devices/{sensor_id}/w1_slave")),
        }
    }
}

impl TemperatureProbe for W1Probe {
    async fn read(&self) -> Result<f64, ProbeError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        parse_w1_payload(&raw)
    }
}

/// Parse the two-line `w1_slave` report: a CRC line ending in `YES` and a
/// data line carrying the reading as `t=<milli-degrees>`.
fn parse_w1_payload(raw: &str) -> Result<f64, ProbeError> {
    let mut lines = raw.lines();

    let crc_line = lines
        .next()
        .ok_or_else(|| ProbeError::Malformed("empty payload".to_string()))?;
    if !crc_line.trim_end().ends_with("YES") {
        return Err(ProbeError::Crc);
    }

    let data_line = lines
        .next()
        .ok_or_else(|| ProbeError::Malformed("missing data line".to_string()))?;
    let (_, milli) = data_line
        .rsplit_once("t=")
        .ok_or_else(|| ProbeError::Malformed("missing t= field".to_string()))?;
    let milli: f64 = milli
        .trim()
        .parse()
        .map_err(|_| ProbeError::Malformed(format!("unparsable reading: {milli}")))?;

    Ok(milli / 1000.0)
}

/// Relay on a GPIO line exported through sysfs.
pub struct GpioRelay {
    path: PathBuf,
}

impl GpioRelay {
    pub fn new(pin: u32) -> Self {
        Self {
            path: PathBuf::from(format!("/sys/class/gpio/gpio{pin}/value")),
        }
    }
}

impl RelayDriver for GpioRelay {
    async fn read(&self) -> Result<bool, RelayError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        match raw.trim() {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(RelayError::Malformed(other.to_string())),
        }
    }

    async fn write(&self, on: bool) -> Result<(), RelayError> {
        tokio::fs::write(&self.path, if on { "1" } else { "0" }).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_valid_w1_report() {
        let raw = "4b 01 4b 46 7f ff 05 10 e1 : crc=e1 YES\n4b 01 4b 46 7f ff 05 10 e1 t=20687\n";
        assert_eq!(parse_w1_payload(raw).unwrap(), 20.687);
    }

    #[test]
    fn rejects_a_failed_crc() {
        let raw = "4b 01 4b 46 7f ff 05 10 e1 : crc=e1 NO\n4b 01 4b 46 7f ff 05 10 e1 t=20687\n";
        assert!(matches!(parse_w1_payload(raw), Err(ProbeError::Crc)));
    }

    #[test]
    fn rejects_a_missing_reading() {
        let raw = "4b 01 4b 46 7f ff 05 10 e1 : crc=e1 YES\ngarbage\n";
        assert!(matches!(
            parse_w1_payload(raw),
            Err(ProbeError::Malformed(_))
        ));
    }

    #[test]
    fn negative_readings_survive_the_conversion() {
        let raw = "aa : crc=aa YES\naa t=-1250\n";
        assert_eq!(parse_w1_payload(raw).unwrap(), -1.25);
    }
}
