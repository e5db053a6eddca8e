use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, Months, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Backward window, in days, scanned when matching a recurring event to
/// the current calendar day.
const LOOKBACK_DAYS: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceFrequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

#[derive(Debug, Error)]
#[error("unknown recurrence frequency: {0}")]
pub struct ParseRecurrenceError(String);

impl FromStr for RecurrenceFrequency {
    type Err = ParseRecurrenceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(ParseRecurrenceError(other.to_string())),
        }
    }
}

/// Normalized calendar event as handed out by a calendar provider.
/// Instants carry the event's own UTC offset.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub summary: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub recurrence: Option<RecurrenceFrequency>,
}

impl CalendarEvent {
    /// Start/end instants of the occurrence that applies to `now`.
    ///
    /// Single events use their literal instants. Recurring events are
    /// matched to the current calendar day by generating occurrences in a
    /// short backward lookback window; on a match, the event's clock
    /// time-of-day is projected onto today's date in the event's own
    /// offset. Only daily rules reliably project; other frequencies match
    /// only when an occurrence literally falls inside the window.
    pub fn effective_window(
        &self,
        now: DateTime<FixedOffset>,
    ) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
        let Some(frequency) = self.recurrence else {
            return Some((self.start, self.end));
        };

        let today = now.with_timezone(self.start.offset()).date_naive();
        let window_start = today - Duration::days(LOOKBACK_DAYS);

        let matched = occurrence_days(self.start.date_naive(), frequency, window_start, today)
            .into_iter()
            .any(|day| day == today);
        if !matched {
            return None;
        }

        let start = project_onto(self.start, today)?;
        let end = project_onto(self.end, today)?;
        (start < end).then_some((start, end))
    }

    /// Whether `now` falls inside the event, i.e. `start <= now < end` for
    /// the effective occurrence.
    pub fn is_current(&self, now: DateTime<FixedOffset>) -> bool {
        self.effective_window(now)
            .map(|(start, end)| start <= now && now < end)
            .unwrap_or(false)
    }
}

/// First event considered current at `now`.
pub fn select_current_event(
    events: &[CalendarEvent],
    now: DateTime<FixedOffset>,
) -> Option<&CalendarEvent> {
    events.iter().find(|event| event.is_current(now))
}

fn occurrence_days(
    first: NaiveDate,
    frequency: RecurrenceFrequency,
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<NaiveDate> {
    if first > to {
        return Vec::new();
    }

    let mut days = Vec::new();
    match frequency {
        RecurrenceFrequency::Daily => {
            let mut day = first.max(from);
            while day <= to {
                days.push(day);
                day = day + Duration::days(1);
            }
        }
        RecurrenceFrequency::Weekly => {
            let mut day = first;
            if from > first {
                // Jump close to the window before stepping.
                let weeks = (from - first).num_days() / 7;
                day = day + Duration::weeks(weeks);
            }
            while day <= to {
                if day >= from {
                    days.push(day);
                }
                day = day + Duration::weeks(1);
            }
        }
        RecurrenceFrequency::Monthly | RecurrenceFrequency::Yearly => {
            let step = match frequency {
                RecurrenceFrequency::Monthly => Months::new(1),
                _ => Months::new(12),
            };
            let mut day = first;
            while day <= to {
                if day >= from {
                    days.push(day);
                }
                let Some(next) = day.checked_add_months(step) else {
                    break;
                };
                day = next;
            }
        }
    }
    days
}

/// Carry an instant's clock time (in its own offset) onto another date.
fn project_onto(instant: DateTime<FixedOffset>, day: NaiveDate) -> Option<DateTime<FixedOffset>> {
    instant
        .offset()
        .from_local_datetime(&day.and_time(instant.time()))
        .single()
}
