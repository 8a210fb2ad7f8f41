use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use time::{OffsetDateTime, UtcOffset};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, Instrument};

use super::RulesSnapshot;
use crate::db::{
    BookingWindow, DatabaseError, MentorTypeVisibility, SchedulingConfigSource, SchedulingRule, TimeSlot,
};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefetchSummary {
    pub rules: usize,
    pub visibility_toggles: usize,
    pub booking_windows: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub loaded_at: OffsetDateTime,
}

/// Holds the current scheduling snapshot and reloads it from its source.
pub struct SchedulingRulesService {
    source: Arc<dyn SchedulingConfigSource>,
    snapshot: RwLock<Option<Arc<RulesSnapshot>>>,
    /// Serializes refetches so an older load never replaces a newer one.
    refetch_guard: Mutex<()>,
    booking_offset: UtcOffset,
}

impl SchedulingRulesService {
    /// Starts in the loading state; call [`refetch`](Self::refetch) to populate.
    pub fn new(source: Arc<dyn SchedulingConfigSource>, booking_offset: UtcOffset) -> Self {
        Self {
            source,
            snapshot: RwLock::new(None),
            refetch_guard: Mutex::new(()),
            booking_offset,
        }
    }

    pub fn source(&self) -> &dyn SchedulingConfigSource {
        self.source.as_ref()
    }

    /// Wall clock in the offset booking windows are written in.
    pub fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.booking_offset)
    }

    pub async fn snapshot(&self) -> AppResult<Arc<RulesSnapshot>> {
        self.snapshot
            .read()
            .await
            .clone()
            .ok_or_else(|| AppError::ServiceUnavailable("scheduling rules are still loading".to_string()))
    }

    /// Reloads every scheduling table. A failed load keeps the previous snapshot.
    ///
    /// Concurrent calls run one after another, so the snapshot left in place
    /// always comes from the load that started last.
    pub async fn refetch(&self) -> Result<RefetchSummary, DatabaseError> {
        let _guard = self.refetch_guard.lock().await;
        let span = info_span!("scheduling_refetch", source = self.source.source_tag());
        match self.load().instrument(span).await {
            Ok(snapshot) => {
                let summary = RefetchSummary {
                    rules: snapshot.rule_count(),
                    visibility_toggles: snapshot.visibility_count(),
                    booking_windows: snapshot.windows().len(),
                    loaded_at: snapshot.loaded_at(),
                };
                *self.snapshot.write().await = Some(Arc::new(snapshot));
                info!(
                    rules = summary.rules,
                    visibility_toggles = summary.visibility_toggles,
                    booking_windows = summary.booking_windows,
                    "Scheduling rules loaded"
                );
                Ok(summary)
            }
            Err(e) => {
                error!("Failed to load scheduling rules: {}", e);
                Err(e)
            }
        }
    }

    async fn load(&self) -> Result<RulesSnapshot, DatabaseError> {
        let (rules, visibility, windows) = tokio::try_join!(
            self.source.fetch_scheduling_rules(),
            self.source.fetch_mentor_type_visibility(),
            self.source.fetch_booking_windows(),
        )?;

        let rules = rules
            .into_iter()
            .map(SchedulingRule::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let visibility = visibility
            .into_iter()
            .map(MentorTypeVisibility::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let windows = windows
            .into_iter()
            .map(BookingWindow::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RulesSnapshot::new(rules, visibility, windows))
    }

    pub async fn time_slot(&self, slot_id: sqlx::types::Uuid) -> AppResult<TimeSlot> {
        let row = self
            .source
            .fetch_time_slot(slot_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("time slot {slot_id}")))?;
        Ok(TimeSlot::try_from(row)?)
    }

    /// Reloads on a fixed interval. Failures are logged and retried on the next tick.
    pub fn spawn_refresh(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let _ = self.refetch().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::rule_row;
    use crate::db::{BookingWindowRow, MemoryConfigSource, MentorType, MentorTypeVisibilityRow};
    use sqlx::types::Uuid;

    fn service(source: Arc<MemoryConfigSource>) -> SchedulingRulesService {
        SchedulingRulesService::new(source, UtcOffset::UTC)
    }

    async fn is_loading(service: &SchedulingRulesService) -> bool {
        matches!(service.snapshot().await, Err(AppError::ServiceUnavailable(_)))
    }

    #[tokio::test]
    async fn reports_loading_until_first_refetch() {
        let source = Arc::new(MemoryConfigSource::new());
        let service = service(source);
        assert!(is_loading(&service).await);

        let summary = service.refetch().await.unwrap();
        assert_eq!((summary.rules, summary.visibility_toggles, summary.booking_windows), (0, 0, 0));
        assert!(!is_loading(&service).await);
        assert_eq!(service.snapshot().await.unwrap().loaded_at(), summary.loaded_at);
    }

    #[tokio::test]
    async fn refetch_picks_up_admin_changes() {
        let source = Arc::new(MemoryConfigSource::new());
        let service = service(source.clone());
        service.refetch().await.unwrap();
        assert!(service.snapshot().await.unwrap().rule(MentorType::Coach).is_none());

        source.rules.lock().await.push(rule_row("coach"));
        source.visibility.lock().await.push(MentorTypeVisibilityRow {
            id: Uuid::new_v4(),
            mentor_type: "expert".to_string(),
            is_visible: false,
        });
        let summary = service.refetch().await.unwrap();
        assert_eq!(summary.rules, 1);
        assert_eq!(summary.visibility_toggles, 1);
        assert_eq!(source.fetch_count(), 2);

        let snapshot = service.snapshot().await.unwrap();
        assert!(snapshot.rule(MentorType::Coach).is_some());
        assert!(!snapshot.is_mentor_type_visible(MentorType::Expert));
    }

    #[tokio::test]
    async fn failed_refetch_keeps_previous_snapshot() {
        let source = Arc::new(MemoryConfigSource::new());
        source.rules.lock().await.push(rule_row("expert"));
        let service = service(source.clone());
        service.refetch().await.unwrap();

        source.set_unavailable(true);
        assert!(matches!(service.refetch().await, Err(DatabaseError::ConnectionError(_))));
        assert!(service.snapshot().await.unwrap().rule(MentorType::Expert).is_some());
        // The unavailable source refuses before counting a fetch.
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn overlapping_refetches_keep_the_latest_load() {
        let source = Arc::new(MemoryConfigSource::new());
        source.set_rules_delay(Duration::from_millis(100));
        let service = Arc::new(service(source.clone()));

        let slow = tokio::spawn({
            let service = service.clone();
            async move { service.refetch().await }
        });
        // Let the slow load read the empty table before the admin edit lands.
        while source.fetch_count() == 0 {
            tokio::task::yield_now().await;
        }
        source.set_rules_delay(Duration::ZERO);
        source.rules.lock().await.push(rule_row("expert"));

        let latest = service.refetch().await.unwrap();
        let earlier = slow.await.unwrap().unwrap();
        assert_eq!(earlier.rules, 0);
        assert_eq!(latest.rules, 1);
        assert!(latest.loaded_at >= earlier.loaded_at);
        assert!(service.snapshot().await.unwrap().rule(MentorType::Expert).is_some());
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn failed_first_load_stays_loading() {
        let source = Arc::new(MemoryConfigSource::new());
        source.set_unavailable(true);
        let service = service(source);
        assert!(service.refetch().await.is_err());
        assert!(is_loading(&service).await);
    }

    #[tokio::test]
    async fn malformed_window_rejects_the_whole_load() {
        let source = Arc::new(MemoryConfigSource::new());
        source.rules.lock().await.push(rule_row("expert"));
        source.windows.lock().await.push(BookingWindowRow {
            id: Uuid::new_v4(),
            day_of_week: 1,
            start_time: "9am".to_string(),
            end_time: "17:00:00".to_string(),
            is_active: true,
        });
        let service = service(source);
        assert!(matches!(service.refetch().await, Err(DatabaseError::InvalidInput(_))));
        assert!(is_loading(&service).await);
    }

    #[tokio::test]
    async fn missing_slot_is_not_found() {
        let service = service(Arc::new(MemoryConfigSource::new()));
        assert!(matches!(service.time_slot(Uuid::new_v4()).await, Err(AppError::NotFound(_))));
    }

    #[test]
    fn now_uses_booking_offset() {
        let offset = UtcOffset::from_hms(3, 0, 0).unwrap();
        let service = SchedulingRulesService::new(Arc::new(MemoryConfigSource::new()), offset);
        assert_eq!(service.now().offset(), offset);
    }
}
