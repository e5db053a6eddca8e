use crate::types::DesiredSetpoint;

/// Parse a calendar event summary into a setpoint.
///
/// Two forms are accepted: a bare temperature (`"21.5"`), or a
/// `;`-separated triple (`"21.5;80;20"`) that additionally weights the
/// local and remote sensors. Weights are only trusted when they reconcile
/// to 100; anything that does not parse cleanly falls back to `min_temp`
/// with the local sensor at full priority.
pub fn parse_summary(summary: &str, min_temp: f64, max_temp: f64) -> DesiredSetpoint {
    let fields: Vec<&str> = summary.split(';').collect();

    let candidate = if fields.len() == 3 {
        parse_weighted(&fields)
    } else {
        parse_temperature(summary).map(DesiredSetpoint::local_only)
    };

    let Some(setpoint) = candidate else {
        return DesiredSetpoint::local_only(min_temp);
    };

    // Above the upper bound the whole setpoint is untrusted, weights
    // included.
    if setpoint.temperature > max_temp {
        return DesiredSetpoint::local_only(max_temp);
    }

    setpoint
}

fn parse_weighted(fields: &[&str]) -> Option<DesiredSetpoint> {
    let temperature = parse_temperature(fields[0])?;
    let local = fields[1].trim().parse::<u8>().ok()?;
    let remote = fields[2].trim().parse::<u8>().ok()?;

    if u16::from(local) + u16::from(remote) != 100 {
        return Some(DesiredSetpoint::local_only(temperature));
    }

    Some(DesiredSetpoint {
        temperature,
        local_weight: local,
        remote_weight: remote,
    })
}

fn parse_temperature(raw: &str) -> Option<f64> {
    let value = raw.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}
