use crate::types::DesiredSetpoint;

/// Blend the local reading with an optional remote reading using the
/// setpoint's priority weights. Without a remote reading the local value
/// is used as-is, which is the same as forcing the local weight to 100.
pub fn fuse(local: f64, remote: Option<f64>, setpoint: &DesiredSetpoint) -> f64 {
    match remote {
        Some(remote) => {
            local * f64::from(setpoint.local_weight) / 100.0
                + remote * f64::from(setpoint.remote_weight) / 100.0
        }
        None => local,
    }
}

/// Thermostat control law with a deadband of `overshoot` degrees above the
/// target. At or below the target the heater is always on; at or above
/// `target + overshoot` it is always off; strictly inside the band the
/// previous state is preserved so the relay does not chatter around the
/// setpoint.
pub fn should_heat(fused: f64, desired: f64, overshoot: f64, currently_heating: bool) -> bool {
    if fused <= desired {
        return true;
    }
    if fused >= desired + overshoot {
        return false;
    }
    currently_heating
}
