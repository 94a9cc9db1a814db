pub mod calendar;
pub mod project;
pub mod schedule;

pub use calendar::{Day, Hour, ParseDayError, ParseHourError};
pub use project::{MasterProject, ScheduledProject};
pub use schedule::{DaySchedule, DayTemplate, WeeklySchedule, EPSILON, FULL_ALLOCATION};
