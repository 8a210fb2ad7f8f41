mod memory;
mod scheduling_repository;

use async_trait::async_trait;
use sqlx::types::Uuid;

use super::{BookingWindowRow, DatabaseError, MentorTypeVisibilityRow, SchedulingRuleRow, TimeSlotRow};

pub use memory::MemoryConfigSource;
pub use scheduling_repository::PgSchedulingRepository;

/// Where the scheduling configuration tables are read from.
#[async_trait]
pub trait SchedulingConfigSource: Send + Sync {
    fn source_tag(&self) -> &'static str;

    async fn ping(&self) -> Result<(), DatabaseError>;

    async fn fetch_scheduling_rules(&self) -> Result<Vec<SchedulingRuleRow>, DatabaseError>;

    async fn fetch_mentor_type_visibility(&self) -> Result<Vec<MentorTypeVisibilityRow>, DatabaseError>;

    /// Only rows flagged active.
    async fn fetch_booking_windows(&self) -> Result<Vec<BookingWindowRow>, DatabaseError>;

    async fn fetch_time_slot(&self, slot_id: Uuid) -> Result<Option<TimeSlotRow>, DatabaseError>;
}
