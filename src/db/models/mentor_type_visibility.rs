use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;

use super::MentorType;
use crate::db::DatabaseError;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct MentorTypeVisibilityRow {
    pub id: Uuid,
    pub mentor_type: String,
    pub is_visible: bool,
}

/// Whether a mentor category is offered to booking users at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MentorTypeVisibility {
    pub mentor_type: MentorType,
    pub is_visible: bool,
}

impl TryFrom<MentorTypeVisibilityRow> for MentorTypeVisibility {
    type Error = DatabaseError;

    fn try_from(row: MentorTypeVisibilityRow) -> Result<Self, Self::Error> {
        Ok(MentorTypeVisibility {
            mentor_type: row.mentor_type.parse().map_err(DatabaseError::InvalidInput)?,
            is_visible: row.is_visible,
        })
    }
}
