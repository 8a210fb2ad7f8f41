use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::OffsetDateTime;

use super::MentorType;
use crate::db::DatabaseError;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TimeSlotRow {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub mentor_type: String,
    pub start_time: OffsetDateTime,
    pub end_time: OffsetDateTime,
    pub is_booked: bool,
}

/// A slot offered by a mentor. Read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub mentor_type: MentorType,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_time: OffsetDateTime,
    pub is_booked: bool,
}

impl TryFrom<TimeSlotRow> for TimeSlot {
    type Error = DatabaseError;

    fn try_from(row: TimeSlotRow) -> Result<Self, Self::Error> {
        if row.end_time <= row.start_time {
            return Err(DatabaseError::InvalidInput(format!(
                "time slot {} ends before it starts",
                row.id
            )));
        }

        Ok(TimeSlot {
            id: row.id,
            mentor_id: row.mentor_id,
            mentor_type: row.mentor_type.parse().map_err(DatabaseError::InvalidInput)?,
            start_time: row.start_time,
            end_time: row.end_time,
            is_booked: row.is_booked,
        })
    }
}
