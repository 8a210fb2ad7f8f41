mod booking_window;
mod mentor_type;
mod mentor_type_visibility;
mod scheduling_rule;
mod time_slot;

pub use booking_window::*;
pub use mentor_type::*;
pub use mentor_type_visibility::*;
pub use scheduling_rule::{SchedulingRule, SchedulingRuleRow};
pub use time_slot::*;

#[cfg(test)]
pub(crate) use scheduling_rule::rule_row;
