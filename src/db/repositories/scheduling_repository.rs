use async_trait::async_trait;
use sqlx::types::Uuid;
use sqlx::PgPool;

use super::SchedulingConfigSource;
use crate::db::{BookingWindowRow, DatabaseError, MentorTypeVisibilityRow, SchedulingRuleRow, TimeSlotRow};

// Only columns listed in the select are used for ordering. When a mentor type
// has several rule rows the most recently updated one comes first and wins.
const SCHEDULING_RULES_QUERY: &str = r#"
    SELECT id, mentor_type, advance_booking_weeks, slot_creation_window_weeks,
           min_advance_booking_hours, max_advance_booking_days, max_sessions_per_week,
           default_duration_minutes, allow_recurring, updated_at
    FROM scheduling_rules
    ORDER BY updated_at DESC NULLS LAST, id
"#;

const VISIBILITY_QUERY: &str = r#"
    SELECT id, mentor_type, is_visible
    FROM mentor_type_visibility
    ORDER BY id
"#;

// Cast to text so `time` and `text` columns both validate the same way.
const BOOKING_WINDOWS_QUERY: &str = r#"
    SELECT id, day_of_week, start_time::text AS start_time, end_time::text AS end_time, is_active
    FROM booking_windows
    WHERE is_active = true
    ORDER BY day_of_week, start_time
"#;

const TIME_SLOT_QUERY: &str = r#"
    SELECT s.id, s.mentor_id, m.mentor_type, s.start_time, s.end_time, s.is_booked
    FROM time_slots s
    JOIN mentors m ON m.id = s.mentor_id
    WHERE s.id = $1
"#;

/// Reads the admin-managed scheduling tables from Postgres.
#[derive(Clone)]
pub struct PgSchedulingRepository {
    pool: PgPool,
}

impl PgSchedulingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SchedulingConfigSource for PgSchedulingRepository {
    fn source_tag(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn fetch_scheduling_rules(&self) -> Result<Vec<SchedulingRuleRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, SchedulingRuleRow>(SCHEDULING_RULES_QUERY)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn fetch_mentor_type_visibility(&self) -> Result<Vec<MentorTypeVisibilityRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, MentorTypeVisibilityRow>(VISIBILITY_QUERY)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn fetch_booking_windows(&self) -> Result<Vec<BookingWindowRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, BookingWindowRow>(BOOKING_WINDOWS_QUERY)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn fetch_time_slot(&self, slot_id: Uuid) -> Result<Option<TimeSlotRow>, DatabaseError> {
        let row = sqlx::query_as::<_, TimeSlotRow>(TIME_SLOT_QUERY)
            .bind(slot_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selected_and_ordered(query: &str) -> (String, Vec<String>) {
        let (head, order) = query.split_once("ORDER BY").expect("ordered query");
        let select = head.split_once("FROM").expect("select list").0.to_string();
        let keys = order
            .split(',')
            .filter_map(|key| key.split_whitespace().next())
            .map(str::to_string)
            .collect();
        (select, keys)
    }

    #[test]
    fn ordering_uses_only_selected_columns() {
        for query in [SCHEDULING_RULES_QUERY, VISIBILITY_QUERY, BOOKING_WINDOWS_QUERY] {
            let (select, keys) = selected_and_ordered(query);
            for key in keys {
                assert!(select.contains(&key), "{key} is not selected in {query}");
            }
        }
    }

    #[test]
    fn newest_rule_row_sorts_first() {
        assert!(SCHEDULING_RULES_QUERY.contains("ORDER BY updated_at DESC NULLS LAST, id"));
    }
}
