pub mod rules;
pub mod service;
pub mod time_of_day;

pub use rules::{BookingDenial, CreationDenial, RulesSnapshot, DEFAULT_ADVANCE_BOOKING_WEEKS};
pub use service::{RefetchSummary, SchedulingRulesService};
pub use time_of_day::{ClockTime, ClockTimeError};
