use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use calora_common::cache::StatusCache;
use calora_common::{
    parse_summary, select_current_event, CalendarEvent, DesiredSetpoint, RecurrenceFrequency,
};

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("calendar io: {0}")]
    Io(#[from] std::io::Error),
    #[error("calendar data malformed: {0}")]
    Malformed(String),
    #[error("calendar request timed out")]
    Timeout,
}

/// Polymorphic interface over calendar backends. The concrete provider is
/// chosen once at construction; callers only ever ask for the event that
/// applies right now.
pub(crate) trait CalendarProvider {
    async fn current_event(&self) -> Result<Option<CalendarEvent>, CalendarError>;
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    summary: String,
    start: String,
    end: String,
    #[serde(default)]
    recurrence: Option<RecurrenceFrequency>,
}

/// Calendar backend reading a JSON event list from disk: RFC 3339 start
/// and end instants plus an optional recurrence frequency per event.
pub struct FileCalendar {
    path: PathBuf,
    timezone: Tz,
}

impl FileCalendar {
    pub fn new(path: PathBuf, timezone: Tz) -> Self {
        Self { path, timezone }
    }
}

impl CalendarProvider for FileCalendar {
    async fn current_event(&self) -> Result<Option<CalendarEvent>, CalendarError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let raw_events: Vec<RawEvent> =
            serde_json::from_str(&raw).map_err(|err| CalendarError::Malformed(err.to_string()))?;

        let events = raw_events
            .into_iter()
            .map(convert_event)
            .collect::<Result<Vec<_>, _>>()?;

        let now = now_in_timezone(&self.timezone);
        Ok(select_current_event(&events, now).cloned())
    }
}

fn convert_event(raw: RawEvent) -> Result<CalendarEvent, CalendarError> {
    let start = DateTime::parse_from_rfc3339(&raw.start)
        .map_err(|err| CalendarError::Malformed(format!("bad start instant: {err}")))?;
    let end = DateTime::parse_from_rfc3339(&raw.end)
        .map_err(|err| CalendarError::Malformed(format!("bad end instant: {err}")))?;

    Ok(CalendarEvent {
        summary: raw.summary,
        start,
        end,
        recurrence: raw.recurrence,
    })
}

pub(crate) fn now_in_timezone(timezone: &Tz) -> DateTime<FixedOffset> {
    let local = Utc::now().with_timezone(timezone);
    local.with_timezone(&local.offset().fix())
}

/// Resolves the desired setpoint for the current instant. Parsing
/// problems degrade to the minimum-temperature fallback; only provider
/// failures (including a hung provider) surface as errors.
pub(crate) struct SetpointResolver<C> {
    provider: C,
    cache: Arc<StatusCache>,
    min_temp: f64,
    max_temp: f64,
    timeout: Duration,
}

impl<C: CalendarProvider> SetpointResolver<C> {
    pub fn new(
        provider: C,
        cache: Arc<StatusCache>,
        min_temp: f64,
        max_temp: f64,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            cache,
            min_temp,
            max_temp,
            timeout,
        }
    }

    pub async fn resolve(&self) -> Result<DesiredSetpoint, CalendarError> {
        let event = tokio::time::timeout(self.timeout, self.provider.current_event())
            .await
            .map_err(|_| CalendarError::Timeout)??;

        let setpoint = match event {
            Some(event) => {
                debug!(summary = %event.summary, "resolving setpoint from current event");
                parse_summary(&event.summary, self.min_temp, self.max_temp)
            }
            None => {
                debug!("no current calendar event, falling back to minimum temperature");
                DesiredSetpoint::local_only(self.min_temp)
            }
        };

        self.cache.update_desired_setpoint(setpoint);
        Ok(setpoint)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    struct MockCalendar {
        event: Result<Option<CalendarEvent>, ()>,
        delay: Option<Duration>,
    }

    impl CalendarProvider for MockCalendar {
        async fn current_event(&self) -> Result<Option<CalendarEvent>, CalendarError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.event
                .clone()
                .map_err(|_| CalendarError::Malformed("calendar unreachable".to_string()))
        }
    }

    fn current_event(summary: &str) -> CalendarEvent {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = Utc::now().with_timezone(&offset);
        CalendarEvent {
            summary: summary.to_string(),
            start: now - chrono::Duration::hours(1),
            end: now + chrono::Duration::hours(1),
            recurrence: None,
        }
    }

    fn resolver(calendar: MockCalendar) -> SetpointResolver<MockCalendar> {
        SetpointResolver::new(
            calendar,
            Arc::new(StatusCache::new()),
            15.0,
            27.0,
            Duration::from_millis(50),
        )
    }

    #[tokio::test]
    async fn resolves_and_caches_the_current_event() {
        let resolver = resolver(MockCalendar {
            event: Ok(Some(current_event("21.5;80;20"))),
            delay: None,
        });

        let setpoint = resolver.resolve().await.unwrap();

        assert_eq!(
            setpoint,
            DesiredSetpoint {
                temperature: 21.5,
                local_weight: 80,
                remote_weight: 20,
            }
        );
        assert_eq!(resolver.cache.desired_setpoint().unwrap().value, setpoint);
    }

    #[tokio::test]
    async fn no_event_falls_back_to_minimum() {
        let resolver = resolver(MockCalendar {
            event: Ok(None),
            delay: None,
        });

        assert_eq!(
            resolver.resolve().await.unwrap(),
            DesiredSetpoint::local_only(15.0)
        );
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let resolver = resolver(MockCalendar {
            event: Err(()),
            delay: None,
        });

        assert!(resolver.resolve().await.is_err());
        assert!(resolver.cache.desired_setpoint().is_err());
    }

    #[tokio::test]
    async fn a_hung_provider_times_out() {
        let resolver = resolver(MockCalendar {
            event: Ok(None),
            delay: Some(Duration::from_secs(5)),
        });

        assert!(matches!(
            resolver.resolve().await,
            Err(CalendarError::Timeout)
        ));
    }

    #[test]
    fn converts_raw_events() {
        let raw = RawEvent {
            summary: "21".to_string(),
            start: "2026-03-10T06:00:00+02:00".to_string(),
            end: "2026-03-10T22:00:00+02:00".to_string(),
            recurrence: Some(RecurrenceFrequency::Daily),
        };

        let event = convert_event(raw).unwrap();
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();

        assert_eq!(
            event.start,
            offset.with_ymd_and_hms(2026, 3, 10, 6, 0, 0).unwrap()
        );
        assert_eq!(event.recurrence, Some(RecurrenceFrequency::Daily));
    }

    #[test]
    fn rejects_malformed_instants() {
        let raw = RawEvent {
            summary: "21".to_string(),
            start: "not-a-date".to_string(),
            end: "2026-03-10T22:00:00+02:00".to_string(),
            recurrence: None,
        };

        assert!(matches!(
            convert_event(raw),
            Err(CalendarError::Malformed(_))
        ));
    }

    #[test]
    fn raw_events_deserialize_without_recurrence() {
        let raw: RawEvent = serde_json::from_str(
            r#"{"summary":"19;70;30","start":"2026-03-10T06:00:00+02:00","end":"2026-03-10T22:00:00+02:00"}"#,
        )
        .unwrap();

        assert_eq!(raw.recurrence, None);
    }
}
