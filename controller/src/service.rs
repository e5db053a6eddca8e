use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use calora_common::cache::StatusCache;
use calora_common::{fuse, should_heat, ControllerConfig, Measurement};

use crate::actuator::RelayController;
use crate::calendar::{CalendarProvider, SetpointResolver};
use crate::hal::{RelayDriver, TemperatureProbe};
use crate::remote::RemoteCompanion;
use crate::sensing::LocalTempReader;
use crate::store::LongTermStore;

/// Runs one control tick per scheduling interval. Stages fail
/// independently: a missing remote reading or store is logged and
/// skipped, while an unresolvable setpoint or local temperature forces
/// the relay off and aborts the rest of the tick.
pub(crate) struct Orchestrator<C, P, R, RC, S> {
    config: ControllerConfig,
    cache: Arc<StatusCache>,
    resolver: SetpointResolver<C>,
    local: LocalTempReader<P>,
    actuator: RelayController<R>,
    remote: Option<RC>,
    store: S,
}

impl<C, P, R, RC, S> Orchestrator<C, P, R, RC, S>
where
    C: CalendarProvider,
    P: TemperatureProbe,
    R: RelayDriver,
    RC: RemoteCompanion,
    S: LongTermStore,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: ControllerConfig,
        cache: Arc<StatusCache>,
        resolver: SetpointResolver<C>,
        local: LocalTempReader<P>,
        actuator: RelayController<R>,
        remote: Option<RC>,
        store: S,
    ) -> Self {
        Self {
            config,
            cache,
            resolver,
            local,
            actuator,
            remote,
            store,
        }
    }

    /// Drive ticks until shutdown. Ticks are awaited one at a time on a
    /// single interval, so they can never overlap; a tick that overruns
    /// simply delays the next one.
    pub async fn run(mut self) {
        if let Err(err) = self.store.ensure_series().await {
            warn!(error = %err, "long-term store initialization failed");
        }

        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.poll_interval_secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = self.config.poll_interval_secs,
            "control loop started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => self.run_tick().await,
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown requested, stopping control loop");
                    break;
                }
            }
        }
    }

    pub async fn run_tick(&mut self) {
        // Optional secondary reading; its absence never stops the tick.
        let remote = match &self.remote {
            Some(companion) => match companion.fetch().await {
                Ok(reading) => {
                    self.cache.update_remote_reading(reading);
                    Some(reading)
                }
                Err(err) => {
                    warn!(error = %err, "remote companion fetch failed");
                    None
                }
            },
            None => None,
        };

        // Cache-only refresh of the last stored point.
        match self.store.latest_point().await {
            Ok(point) => self.cache.update_long_term_point(point),
            Err(err) => warn!(error = %err, "long-term point refresh failed"),
        }

        // Setpoint and local temperature are the one critical pair: if
        // either is unobtainable the controller cannot make a safe
        // decision, so heating is forced off and the tick ends here.
        let setpoint = self.resolver.resolve().await;
        let local = self.local.read().await;
        let (setpoint, local) = match (setpoint, local) {
            (Ok(setpoint), Ok(local)) => (setpoint, local),
            (setpoint, local) => {
                if let Err(err) = setpoint {
                    warn!(error = %err, "desired setpoint unresolvable");
                }
                if let Err(err) = local {
                    warn!(error = %err, "local temperature unreadable");
                }
                info!("disabling heating until temperatures resolve again");
                if let Err(err) = self.actuator.set_relay(false).await {
                    warn!(error = %err, "failed to disable relay");
                }
                return;
            }
        };

        let currently_heating = match self.actuator.is_heating().await {
            Ok(state) => state,
            Err(err) => {
                warn!(error = %err, "relay state unknown, assuming off");
                false
            }
        };

        let fused = fuse(local, remote.map(|reading| reading.temperature), &setpoint);
        let heat = should_heat(
            fused,
            setpoint.temperature,
            self.config.overshoot,
            currently_heating,
        );
        info!(
            local,
            fused,
            desired = setpoint.temperature,
            heat,
            "tick decision"
        );

        let heating = match self.actuator.set_relay(heat).await {
            Ok(()) => heat,
            Err(err) => {
                warn!(error = %err, "relay actuation failed");
                currently_heating
            }
        };

        let measurement = Measurement {
            current: local,
            desired: setpoint.temperature,
            heating,
            remote,
        };
        if let Err(err) = self.store.write_measurement(&measurement).await {
            warn!(error = %err, "long-term write failed");
        }

        match serde_json::to_string(&self.cache.report()) {
            Ok(status) => debug!(%status, "tick complete"),
            Err(err) => warn!(error = %err, "status serialization failed"),
        }
    }
}
