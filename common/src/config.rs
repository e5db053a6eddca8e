use serde::{Deserialize, Serialize};

/// Remote companion endpoint. Absence disables the remote fetch stage
/// entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub poll_interval_secs: u64,
    pub timezone: String,
    pub overshoot: f64,
    pub min_temp: f64,
    pub max_temp: f64,
    pub relay_pin: u32,
    pub sensor_id: String,
    pub calendar_timeout_secs: u64,
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 300,
            timezone: "Europe/Vienna".to_string(),
            overshoot: 0.5,
            min_temp: 15.0,
            max_temp: 27.0,
            relay_pin: 17,
            sensor_id: "10-0008032d5234".to_string(),
            calendar_timeout_secs: 10,
            remote: None,
        }
    }
}

impl ControllerConfig {
    /// Build a configuration from environment variables, falling back to
    /// the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(secs) = env_parse::<u64>("POLL_INTERVAL_SECS") {
            config.poll_interval_secs = secs;
        }
        if let Ok(timezone) = std::env::var("TIMEZONE") {
            config.timezone = timezone;
        }
        if let Some(overshoot) = env_parse::<f64>("OVERSHOOT") {
            config.overshoot = overshoot;
        }
        if let Some(min_temp) = env_parse::<f64>("MIN_TEMP") {
            config.min_temp = min_temp;
        }
        if let Some(max_temp) = env_parse::<f64>("MAX_TEMP") {
            config.max_temp = max_temp;
        }
        if let Some(pin) = env_parse::<u32>("RELAY_PIN") {
            config.relay_pin = pin;
        }
        if let Ok(sensor_id) = std::env::var("SENSOR_ID") {
            config.sensor_id = sensor_id;
        }
        if let Some(secs) = env_parse::<u64>("CALENDAR_TIMEOUT_SECS") {
            config.calendar_timeout_secs = secs;
        }
        if let Ok(endpoint) = std::env::var("REMOTE_ENDPOINT") {
            config.remote = Some(RemoteConfig {
                endpoint,
                timeout_secs: env_parse::<u64>("REMOTE_TIMEOUT_SECS").unwrap_or(10),
            });
        }

        config.sanitize();
        config
    }

    pub fn sanitize(&mut self) {
        if self.poll_interval_secs == 0 {
            self.poll_interval_secs = 300;
        }
        if !self.overshoot.is_finite() || self.overshoot <= 0.0 {
            self.overshoot = 0.5;
        }
        if !self.min_temp.is_finite() {
            self.min_temp = 15.0;
        }
        if !self.max_temp.is_finite() || self.max_temp < self.min_temp {
            self.max_temp = self.min_temp;
        }
        if self.calendar_timeout_secs == 0 {
            self.calendar_timeout_secs = 10;
        }
        if let Some(remote) = &mut self.remote {
            if remote.timeout_secs == 0 {
                remote.timeout_secs = 10;
            }
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|value| value.parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_restores_degenerate_values() {
        let mut config = ControllerConfig {
            poll_interval_secs: 0,
            overshoot: -1.0,
            ..ControllerConfig::default()
        };
        config.sanitize();

        assert_eq!(config.poll_interval_secs, 300);
        assert_eq!(config.overshoot, 0.5);
    }

    #[test]
    fn sanitize_keeps_max_above_min() {
        let mut config = ControllerConfig {
            min_temp: 18.0,
            max_temp: 12.0,
            ..ControllerConfig::default()
        };
        config.sanitize();

        assert_eq!(config.max_temp, 18.0);
    }

    #[test]
    fn sanitize_repairs_remote_timeout() {
        let mut config = ControllerConfig {
            remote: Some(RemoteConfig {
                endpoint: "http://companion:8000/sensor".to_string(),
                timeout_secs: 0,
            }),
            ..ControllerConfig::default()
        };
        config.sanitize();

        assert_eq!(config.remote.unwrap().timeout_secs, 10);
    }
}
