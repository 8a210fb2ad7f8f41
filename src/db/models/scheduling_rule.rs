use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::{Duration, OffsetDateTime};
use validator::Validate;

use super::MentorType;
use crate::db::DatabaseError;

/// Raw `scheduling_rules` row as returned by the hosted backend.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize, Validate)]
pub struct SchedulingRuleRow {
    pub id: Uuid,
    pub mentor_type: String,
    #[validate(range(min = 0))]
    pub advance_booking_weeks: Option<i32>,
    #[validate(range(min = 0))]
    pub slot_creation_window_weeks: i32,
    #[validate(range(min = 0))]
    pub min_advance_booking_hours: i32,
    #[validate(range(min = 0))]
    pub max_advance_booking_days: i32,
    #[validate(range(min = 0))]
    pub max_sessions_per_week: Option<i32>,
    #[validate(range(min = 1, message = "Duration must be at least 1 minute"))]
    pub default_duration_minutes: Option<i32>,
    pub allow_recurring: Option<bool>,
    pub updated_at: Option<OffsetDateTime>,
}

/// Per mentor-category booking policy, validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulingRule {
    pub mentor_type: MentorType,
    pub advance_booking_weeks: Option<u32>,
    pub slot_creation_window_weeks: u32,
    pub min_advance_booking_hours: u32,
    pub max_advance_booking_days: u32,
    pub max_sessions_per_week: Option<u32>,
    pub default_duration_minutes: Option<u32>,
    pub allow_recurring: bool,
}

impl SchedulingRule {
    pub fn slot_creation_window(&self) -> Duration {
        Duration::weeks(i64::from(self.slot_creation_window_weeks))
    }

    pub fn min_advance_booking(&self) -> Duration {
        Duration::hours(i64::from(self.min_advance_booking_hours))
    }

    pub fn max_advance_booking(&self) -> Duration {
        Duration::days(i64::from(self.max_advance_booking_days))
    }
}

impl TryFrom<SchedulingRuleRow> for SchedulingRule {
    type Error = DatabaseError;

    fn try_from(row: SchedulingRuleRow) -> Result<Self, Self::Error> {
        row.validate()?;
        let mentor_type = row
            .mentor_type
            .parse::<MentorType>()
            .map_err(DatabaseError::InvalidInput)?;

        Ok(SchedulingRule {
            mentor_type,
            advance_booking_weeks: row.advance_booking_weeks.map(non_negative).transpose()?,
            slot_creation_window_weeks: non_negative(row.slot_creation_window_weeks)?,
            min_advance_booking_hours: non_negative(row.min_advance_booking_hours)?,
            max_advance_booking_days: non_negative(row.max_advance_booking_days)?,
            max_sessions_per_week: row.max_sessions_per_week.map(non_negative).transpose()?,
            default_duration_minutes: row.default_duration_minutes.map(non_negative).transpose()?,
            allow_recurring: row.allow_recurring.unwrap_or(false),
        })
    }
}

fn non_negative(value: i32) -> Result<u32, DatabaseError> {
    u32::try_from(value)
        .map_err(|_| DatabaseError::InvalidInput(format!("expected a non-negative value, got {value}")))
}

#[cfg(test)]
pub(crate) fn rule_row(mentor_type: &str) -> SchedulingRuleRow {
    SchedulingRuleRow {
        id: Uuid::new_v4(),
        mentor_type: mentor_type.to_string(),
        advance_booking_weeks: Some(2),
        slot_creation_window_weeks: 2,
        min_advance_booking_hours: 24,
        max_advance_booking_days: 30,
        max_sessions_per_week: Some(3),
        default_duration_minutes: Some(45),
        allow_recurring: Some(true),
        updated_at: None,
    }
}
