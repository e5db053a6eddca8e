use std::sync::Arc;

use tracing::debug;

use calora_common::cache::StatusCache;

use crate::hal::{ProbeError, TemperatureProbe};

/// Power-on reset value the DS18B20 reports on flaky reads.
const RESET_VALUE: f64 = 85.0;

/// Substitute used until the first good reading arrives.
const DEFAULT_VALUE: f64 = 20.0;

/// Local temperature source with the sensor's transient fault value
/// filtered out.
pub(crate) struct LocalTempReader<P> {
    probe: P,
    cache: Arc<StatusCache>,
    prev_value: f64,
}

impl<P: TemperatureProbe> LocalTempReader<P> {
    pub fn new(probe: P, cache: Arc<StatusCache>) -> Self {
        Self {
            probe,
            cache,
            prev_value: DEFAULT_VALUE,
        }
    }

    /// Current local temperature. A reading equal to the sensor's reset
    /// value is replaced with the last good one; every successful read
    /// refreshes the cache.
    pub async fn read(&mut self) -> Result<f64, ProbeError> {
        let raw = self.probe.read().await?;

        let value = if raw == RESET_VALUE {
            debug!(
                previous = self.prev_value,
                "sensor returned reset value, using previous reading"
            );
            self.prev_value
        } else {
            raw
        };

        self.prev_value = value;
        self.cache.update_local_temperature(value);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use calora_common::cache::CacheError;

    struct MockProbe {
        values: Mutex<Vec<Result<f64, ProbeError>>>,
    }

    impl MockProbe {
        fn with(values: Vec<Result<f64, ProbeError>>) -> Self {
            Self {
                values: Mutex::new(values),
            }
        }
    }

    impl TemperatureProbe for MockProbe {
        async fn read(&self) -> Result<f64, ProbeError> {
            self.values.lock().unwrap().remove(0)
        }
    }

    fn reader(values: Vec<Result<f64, ProbeError>>) -> LocalTempReader<MockProbe> {
        LocalTempReader::new(MockProbe::with(values), Arc::new(StatusCache::new()))
    }

    #[tokio::test]
    async fn reset_value_yields_the_previous_reading() {
        let mut reader = reader(vec![Ok(21.5), Ok(85.0)]);

        assert_eq!(reader.read().await.unwrap(), 21.5);
        assert_eq!(reader.read().await.unwrap(), 21.5);
    }

    #[tokio::test]
    async fn reset_value_before_any_success_yields_the_default() {
        let mut reader = reader(vec![Ok(85.0)]);

        assert_eq!(reader.read().await.unwrap(), 20.0);
    }

    #[tokio::test]
    async fn good_readings_pass_through_and_refresh_the_cache() {
        let mut reader = reader(vec![Ok(18.75)]);

        assert_eq!(reader.read().await.unwrap(), 18.75);
        assert_eq!(reader.cache.local_temperature().unwrap().value, 18.75);
    }

    #[tokio::test]
    async fn probe_failure_propagates_without_touching_the_cache() {
        let mut reader = reader(vec![Err(ProbeError::Crc)]);

        assert!(reader.read().await.is_err());
        assert_eq!(
            reader.cache.local_temperature(),
            Err(CacheError::Unavailable)
        );
    }
}
