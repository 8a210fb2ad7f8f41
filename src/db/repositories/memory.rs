use async_trait::async_trait;
use sqlx::types::Uuid;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use super::SchedulingConfigSource;
use crate::db::{BookingWindowRow, DatabaseError, MentorTypeVisibilityRow, SchedulingRuleRow, TimeSlotRow};

/// In-memory scheduling tables, used by tests and local demos.
#[derive(Default)]
pub struct MemoryConfigSource {
    pub rules: Mutex<Vec<SchedulingRuleRow>>,
    pub visibility: Mutex<Vec<MentorTypeVisibilityRow>>,
    pub windows: Mutex<Vec<BookingWindowRow>>,
    pub slots: Mutex<Vec<TimeSlotRow>>,
    pub fetch_calls: AtomicU64,
    pub unavailable: AtomicBool,
    /// Held after the rules are read, to simulate a slow query.
    pub rules_delay_ms: AtomicU64,
}

impl MemoryConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn set_rules_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.rules_delay_ms.store(millis, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> u64 {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), DatabaseError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DatabaseError::ConnectionError("memory source marked unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SchedulingConfigSource for MemoryConfigSource {
    fn source_tag(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        self.check_available()
    }

    async fn fetch_scheduling_rules(&self) -> Result<Vec<SchedulingRuleRow>, DatabaseError> {
        self.check_available()?;
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let rules = self.rules.lock().await.clone();
        let delay = self.rules_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        Ok(rules)
    }

    async fn fetch_mentor_type_visibility(&self) -> Result<Vec<MentorTypeVisibilityRow>, DatabaseError> {
        self.check_available()?;
        Ok(self.visibility.lock().await.clone())
    }

    async fn fetch_booking_windows(&self) -> Result<Vec<BookingWindowRow>, DatabaseError> {
        self.check_available()?;
        Ok(self
            .windows
            .lock()
            .await
            .iter()
            .filter(|w| w.is_active)
            .cloned()
            .collect())
    }

    async fn fetch_time_slot(&self, slot_id: Uuid) -> Result<Option<TimeSlotRow>, DatabaseError> {
        self.check_available()?;
        Ok(self.slots.lock().await.iter().find(|s| s.id == slot_id).cloned())
    }
}
