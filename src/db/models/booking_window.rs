use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::Weekday;
use validator::Validate;

use crate::db::DatabaseError;
use crate::scheduling::ClockTime;

/// Raw `booking_windows` row. Times arrive as text and are validated on conversion.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize, Validate)]
pub struct BookingWindowRow {
    pub id: Uuid,
    /// 0 = Sunday through 6 = Saturday.
    #[validate(range(min = 0, max = 6))]
    pub day_of_week: i32,
    pub start_time: String,
    pub end_time: String,
    pub is_active: bool,
}

/// A recurring weekly interval during which booking is permitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingWindow {
    pub id: Uuid,
    #[serde(serialize_with = "serialize_weekday")]
    pub day: Weekday,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub is_active: bool,
}

impl BookingWindow {
    /// Inclusive on both ends.
    pub fn contains(&self, day: Weekday, at: ClockTime) -> bool {
        self.day == day && self.start_time <= at && at <= self.end_time
    }
}

impl TryFrom<BookingWindowRow> for BookingWindow {
    type Error = DatabaseError;

    fn try_from(row: BookingWindowRow) -> Result<Self, Self::Error> {
        row.validate()?;
        let day = weekday_from_sunday(row.day_of_week)?;
        let start_time: ClockTime = row
            .start_time
            .parse()
            .map_err(|e| DatabaseError::InvalidInput(format!("booking window {}: {e}", row.id)))?;
        let end_time: ClockTime = row
            .end_time
            .parse()
            .map_err(|e| DatabaseError::InvalidInput(format!("booking window {}: {e}", row.id)))?;

        if start_time > end_time {
            return Err(DatabaseError::InvalidInput(format!(
                "booking window {} starts at {start_time} after it ends at {end_time}",
                row.id
            )));
        }

        Ok(BookingWindow {
            id: row.id,
            day,
            start_time,
            end_time,
            is_active: row.is_active,
        })
    }
}

fn weekday_from_sunday(day: i32) -> Result<Weekday, DatabaseError> {
    u8::try_from(day)
        .ok()
        .filter(|d| *d <= 6)
        .map(|d| Weekday::Sunday.nth_next(d))
        .ok_or_else(|| DatabaseError::InvalidInput(format!("day_of_week out of range: {day}")))
}

fn serialize_weekday<S: serde::Serializer>(day: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(day.number_days_from_sunday())
}
