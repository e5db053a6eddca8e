pub mod cache;
pub mod config;
pub mod control;
pub mod event;
pub mod setpoint;
pub mod types;

pub use cache::{CacheError, Stamped, StatusCache};
pub use config::{ControllerConfig, RemoteConfig};
pub use control::{fuse, should_heat};
pub use event::{select_current_event, CalendarEvent, RecurrenceFrequency};
pub use setpoint::parse_summary;
pub use types::{
    DesiredSetpoint, LongTermPoint, LongTermStatus, Measurement, RelayStatus, RemoteReading,
    RemoteStatus, SetpointStatus, StatusReport, TemperatureStatus,
};
