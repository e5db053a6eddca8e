use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use calora_common::cache::StatusCache;

use crate::hal::{RelayDriver, RelayError};

#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("relay read failed")]
    Read(#[source] RelayError),
    #[error("relay write failed")]
    Write(#[source] RelayError),
}

/// Sole owner of the relay's write path. Every state change goes through
/// `set_relay`, which also keeps the status cache's relay field current.
pub(crate) struct RelayController<R> {
    driver: R,
    cache: Arc<StatusCache>,
}

impl<R: RelayDriver> RelayController<R> {
    pub fn new(driver: R, cache: Arc<StatusCache>) -> Self {
        Self { driver, cache }
    }

    /// Drive the relay to `desired_on`. The current state is read first
    /// and an equal state short-circuits without a write, so repeated
    /// identical commands cost no actuation. The cache is only updated
    /// once a write has been acknowledged.
    pub async fn set_relay(&self, desired_on: bool) -> Result<(), ActuatorError> {
        let current = self.driver.read().await.map_err(ActuatorError::Read)?;
        if current == desired_on {
            debug!(state = desired_on, "relay already in requested state");
            return Ok(());
        }

        self.driver
            .write(desired_on)
            .await
            .map_err(ActuatorError::Write)?;
        self.cache.update_relay_state(desired_on);
        Ok(())
    }

    /// Last-known heating state: the cached relay field when populated,
    /// otherwise a fresh driver read.
    pub async fn is_heating(&self) -> Result<bool, ActuatorError> {
        if let Ok(stamped) = self.cache.relay_state() {
            return Ok(stamped.value);
        }
        self.driver.read().await.map_err(ActuatorError::Read)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use calora_common::cache::CacheError;

    #[derive(Default)]
    struct MockRelay {
        state: Mutex<bool>,
        writes: AtomicUsize,
        fail_read: bool,
        fail_write: bool,
    }

    impl RelayDriver for MockRelay {
        async fn read(&self) -> Result<bool, RelayError> {
            if self.fail_read {
                return Err(RelayError::Malformed("read unavailable".to_string()));
            }
            Ok(*self.state.lock().unwrap())
        }

        async fn write(&self, on: bool) -> Result<(), RelayError> {
            if self.fail_write {
                return Err(RelayError::Malformed("write unavailable".to_string()));
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            *self.state.lock().unwrap() = on;
            Ok(())
        }
    }

    fn controller(relay: MockRelay) -> RelayController<MockRelay> {
        RelayController::new(relay, Arc::new(StatusCache::new()))
    }

    #[tokio::test]
    async fn repeated_commands_issue_a_single_write() {
        let controller = controller(MockRelay::default());

        controller.set_relay(true).await.unwrap();
        controller.set_relay(true).await.unwrap();

        assert_eq!(controller.driver.writes.load(Ordering::SeqCst), 1);
        assert!(controller.cache.relay_state().unwrap().value);
    }

    #[tokio::test]
    async fn equal_state_skips_the_write_entirely() {
        let controller = controller(MockRelay::default());

        controller.set_relay(false).await.unwrap();

        assert_eq!(controller.driver.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn read_failure_aborts_before_any_write() {
        let controller = controller(MockRelay {
            fail_read: true,
            ..MockRelay::default()
        });

        let result = controller.set_relay(true).await;

        assert!(matches!(result, Err(ActuatorError::Read(_))));
        assert_eq!(controller.driver.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn write_failure_leaves_the_cache_untouched() {
        let controller = controller(MockRelay {
            fail_write: true,
            ..MockRelay::default()
        });

        let result = controller.set_relay(true).await;

        assert!(matches!(result, Err(ActuatorError::Write(_))));
        assert_eq!(
            controller.cache.relay_state(),
            Err(CacheError::Unavailable)
        );
    }

    #[tokio::test]
    async fn heating_state_prefers_the_cache() {
        let controller = controller(MockRelay::default());
        controller.cache.update_relay_state(true);

        // Driver still reads false; the cached value wins.
        assert!(controller.is_heating().await.unwrap());
    }

    #[tokio::test]
    async fn heating_state_falls_back_to_the_driver() {
        let relay = MockRelay::default();
        *relay.state.lock().unwrap() = true;
        let controller = controller(relay);

        assert!(controller.is_heating().await.unwrap());
    }
}
