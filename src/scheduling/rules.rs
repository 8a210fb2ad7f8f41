//! Booking-eligibility rules.
//!
//! Every predicate here is a pure function of a [`RulesSnapshot`] and an explicit
//! `now`. Day of week and time of day are read in the offset `now` carries.

use std::collections::HashMap;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::warn;

use super::ClockTime;
use crate::db::{BookingWindow, MentorType, MentorTypeVisibility, SchedulingRule};

pub const DEFAULT_ADVANCE_BOOKING_WEEKS: u32 = 1;

/// Why a booking was refused, listed in the order the checks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BookingDenial {
    #[error("mentor type is not offered for booking")]
    MentorTypeHidden,
    #[error("booking is closed at this time")]
    OutsideBookingWindow,
    #[error("no scheduling rule for mentor type")]
    NoRule,
    #[error("slot starts before the minimum advance booking time")]
    TooSoon,
    #[error("slot starts after the maximum advance booking time")]
    TooFar,
}

impl BookingDenial {
    pub fn code(&self) -> &'static str {
        match self {
            BookingDenial::MentorTypeHidden => "mentor_type_hidden",
            BookingDenial::OutsideBookingWindow => "outside_booking_window",
            BookingDenial::NoRule => "no_rule",
            BookingDenial::TooSoon => "too_soon",
            BookingDenial::TooFar => "too_far",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CreationDenial {
    #[error("no scheduling rule for mentor type")]
    NoRule,
    #[error("slot date is beyond the slot creation window")]
    BeyondCreationWindow,
}

impl CreationDenial {
    pub fn code(&self) -> &'static str {
        match self {
            CreationDenial::NoRule => "no_rule",
            CreationDenial::BeyondCreationWindow => "beyond_creation_window",
        }
    }
}

/// One validated load of the scheduling tables.
#[derive(Debug, Clone)]
pub struct RulesSnapshot {
    rules: HashMap<MentorType, SchedulingRule>,
    visibility: HashMap<MentorType, bool>,
    windows: Vec<BookingWindow>,
    loaded_at: OffsetDateTime,
}

impl RulesSnapshot {
    /// When a mentor type has more than one rule or toggle, the first one wins.
    pub fn new(
        rules: Vec<SchedulingRule>,
        visibility: Vec<MentorTypeVisibility>,
        windows: Vec<BookingWindow>,
    ) -> Self {
        let mut by_type = HashMap::new();
        for rule in rules {
            if by_type.contains_key(&rule.mentor_type) {
                warn!(mentor_type = %rule.mentor_type, "Ignoring duplicate scheduling rule");
                continue;
            }
            by_type.insert(rule.mentor_type, rule);
        }

        let mut toggles = HashMap::new();
        for row in visibility {
            toggles.entry(row.mentor_type).or_insert(row.is_visible);
        }

        Self {
            rules: by_type,
            visibility: toggles,
            windows: windows.into_iter().filter(|w| w.is_active).collect(),
            loaded_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new())
    }

    pub fn loaded_at(&self) -> OffsetDateTime {
        self.loaded_at
    }

    pub fn rule(&self, mentor_type: MentorType) -> Option<&SchedulingRule> {
        self.rules.get(&mentor_type)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn visibility_count(&self) -> usize {
        self.visibility.len()
    }

    pub fn windows(&self) -> &[BookingWindow] {
        &self.windows
    }

    /// Visible unless a toggle explicitly hides it.
    pub fn is_mentor_type_visible(&self, mentor_type: MentorType) -> bool {
        self.visibility.get(&mentor_type).copied().unwrap_or(true)
    }

    pub fn visible_mentor_types(&self) -> Vec<MentorType> {
        MentorType::all()
            .iter()
            .copied()
            .filter(|t| self.is_mentor_type_visible(*t))
            .collect()
    }

    /// With no active windows configured, booking is always open.
    pub fn is_within_booking_window(&self, now: OffsetDateTime) -> bool {
        if self.windows.is_empty() {
            return true;
        }
        let at = ClockTime::of(now.time());
        self.windows.iter().any(|w| w.contains(now.weekday(), at))
    }

    pub fn slot_creation_deadline(&self, mentor_type: MentorType, now: OffsetDateTime) -> Option<OffsetDateTime> {
        self.rule(mentor_type)
            .map(|rule| now.saturating_add(rule.slot_creation_window()))
    }

    pub fn check_slot_creation(
        &self,
        mentor_type: MentorType,
        target: OffsetDateTime,
        now: OffsetDateTime,
    ) -> Result<(), CreationDenial> {
        let deadline = self
            .slot_creation_deadline(mentor_type, now)
            .ok_or(CreationDenial::NoRule)?;
        if target > deadline {
            return Err(CreationDenial::BeyondCreationWindow);
        }
        Ok(())
    }

    pub fn can_create_slot(&self, mentor_type: MentorType, target: OffsetDateTime, now: OffsetDateTime) -> bool {
        self.check_slot_creation(mentor_type, target, now).is_ok()
    }

    /// Inclusive `[earliest, latest]` range of bookable slot starts.
    pub fn booking_range(
        &self,
        mentor_type: MentorType,
        now: OffsetDateTime,
    ) -> Option<(OffsetDateTime, OffsetDateTime)> {
        self.rule(mentor_type).map(|rule| {
            (
                now.saturating_add(rule.min_advance_booking()),
                now.saturating_add(rule.max_advance_booking()),
            )
        })
    }

    pub fn check_booking(
        &self,
        mentor_type: MentorType,
        slot_start: OffsetDateTime,
        now: OffsetDateTime,
    ) -> Result<(), BookingDenial> {
        if !self.is_mentor_type_visible(mentor_type) {
            return Err(BookingDenial::MentorTypeHidden);
        }
        if !self.is_within_booking_window(now) {
            return Err(BookingDenial::OutsideBookingWindow);
        }
        let (earliest, latest) = self
            .booking_range(mentor_type, now)
            .ok_or(BookingDenial::NoRule)?;
        if slot_start < earliest {
            return Err(BookingDenial::TooSoon);
        }
        if slot_start > latest {
            return Err(BookingDenial::TooFar);
        }
        Ok(())
    }

    pub fn can_book_slot(&self, mentor_type: MentorType, slot_start: OffsetDateTime, now: OffsetDateTime) -> bool {
        self.check_booking(mentor_type, slot_start, now).is_ok()
    }

    pub fn advance_booking_weeks(&self, mentor_type: MentorType) -> u32 {
        self.rule(mentor_type)
            .and_then(|rule| rule.advance_booking_weeks)
            .unwrap_or(DEFAULT_ADVANCE_BOOKING_WEEKS)
    }

    pub fn max_sessions_per_week(&self, mentor_type: MentorType) -> Option<u32> {
        self.rule(mentor_type).and_then(|rule| rule.max_sessions_per_week)
    }

    pub fn default_session_duration(&self, mentor_type: MentorType) -> Option<Duration> {
        self.rule(mentor_type)
            .and_then(|rule| rule.default_duration_minutes)
            .map(|minutes| Duration::minutes(i64::from(minutes)))
    }

    pub fn allows_recurring_slots(&self, mentor_type: MentorType) -> bool {
        self.rule(mentor_type).map(|rule| rule.allow_recurring).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::rule_row;
    use crate::db::BookingWindowRow;
    use sqlx::types::Uuid;
    use time::macros::datetime;

    // 2024-01-01 is a Monday.
    const MONDAY_10: OffsetDateTime = datetime!(2024-01-01 10:00:00 UTC);

    fn rule(mentor_type: &str) -> SchedulingRule {
        SchedulingRule::try_from(rule_row(mentor_type)).unwrap()
    }

    fn window(day: i32, start: &str, end: &str, is_active: bool) -> BookingWindow {
        BookingWindow::try_from(BookingWindowRow {
            id: Uuid::new_v4(),
            day_of_week: day,
            start_time: start.to_string(),
            end_time: end.to_string(),
            is_active,
        })
        .unwrap()
    }

    fn hidden(mentor_type: MentorType) -> MentorTypeVisibility {
        MentorTypeVisibility { mentor_type, is_visible: false }
    }

    fn monday_nine_to_five() -> RulesSnapshot {
        RulesSnapshot::new(vec![rule("expert")], Vec::new(), vec![window(1, "09:00:00", "17:00:00", true)])
    }

    #[test]
    fn types_without_toggle_are_visible() {
        let snapshot = RulesSnapshot::empty();
        for mentor_type in MentorType::all() {
            assert!(snapshot.is_mentor_type_visible(*mentor_type));
        }
    }

    #[test]
    fn hidden_toggle_hides_type() {
        let snapshot = RulesSnapshot::new(Vec::new(), vec![hidden(MentorType::Coach)], Vec::new());
        assert!(!snapshot.is_mentor_type_visible(MentorType::Coach));
        assert!(snapshot.is_mentor_type_visible(MentorType::Expert));
        assert_eq!(
            snapshot.visible_mentor_types(),
            vec![MentorType::FounderMentor, MentorType::Expert]
        );
    }

    #[test]
    fn first_visibility_toggle_wins() {
        let snapshot = RulesSnapshot::new(
            Vec::new(),
            vec![
                hidden(MentorType::Expert),
                MentorTypeVisibility { mentor_type: MentorType::Expert, is_visible: true },
            ],
            Vec::new(),
        );
        assert!(!snapshot.is_mentor_type_visible(MentorType::Expert));
    }

    #[test]
    fn no_windows_means_always_open() {
        let snapshot = RulesSnapshot::empty();
        assert!(snapshot.is_within_booking_window(MONDAY_10));
        assert!(snapshot.is_within_booking_window(datetime!(2024-01-06 03:17:00 UTC)));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let snapshot = monday_nine_to_five();
        assert!(snapshot.is_within_booking_window(MONDAY_10));
        assert!(!snapshot.is_within_booking_window(datetime!(2024-01-01 08:59:59 UTC)));
        assert!(snapshot.is_within_booking_window(datetime!(2024-01-01 09:00:00 UTC)));
        assert!(snapshot.is_within_booking_window(datetime!(2024-01-01 17:00:00 UTC)));
        assert!(snapshot.is_within_booking_window(datetime!(2024-01-01 17:00:00.750 UTC)));
        assert!(!snapshot.is_within_booking_window(datetime!(2024-01-01 17:00:01 UTC)));
    }

    #[test]
    fn window_only_applies_to_its_day() {
        let snapshot = monday_nine_to_five();
        assert!(!snapshot.is_within_booking_window(datetime!(2024-01-02 10:00:00 UTC)));
    }

    #[test]
    fn windows_form_a_union() {
        let snapshot = RulesSnapshot::new(
            Vec::new(),
            Vec::new(),
            vec![
                window(1, "09:00:00", "12:00:00", true),
                window(1, "14:00:00", "18:00:00", true),
                window(3, "09:00:00", "17:00:00", true),
            ],
        );
        assert!(snapshot.is_within_booking_window(datetime!(2024-01-01 15:00:00 UTC)));
        assert!(!snapshot.is_within_booking_window(datetime!(2024-01-01 13:00:00 UTC)));
        assert!(snapshot.is_within_booking_window(datetime!(2024-01-03 09:30:00 UTC)));
    }

    #[test]
    fn inactive_windows_are_ignored() {
        let snapshot = RulesSnapshot::new(Vec::new(), Vec::new(), vec![window(2, "09:00:00", "10:00:00", false)]);
        assert!(snapshot.windows().is_empty());
        assert!(snapshot.is_within_booking_window(MONDAY_10));
    }

    #[test]
    fn window_is_read_in_the_offset_of_now() {
        let snapshot = monday_nine_to_five();
        // 07:00 UTC on Monday is 10:00 at +03:00.
        let now = datetime!(2024-01-01 07:00:00 UTC).to_offset(time::macros::offset!(+3));
        assert!(snapshot.is_within_booking_window(now));
        assert!(!snapshot.is_within_booking_window(datetime!(2024-01-01 07:00:00 UTC)));
    }

    #[test]
    fn slot_creation_respects_window_weeks() {
        let snapshot = RulesSnapshot::new(vec![rule("founder_mentor")], Vec::new(), Vec::new());
        let t = MentorType::FounderMentor;
        assert!(snapshot.can_create_slot(t, MONDAY_10 + Duration::days(13), MONDAY_10));
        assert!(snapshot.can_create_slot(t, MONDAY_10 + Duration::weeks(2), MONDAY_10));
        assert!(!snapshot.can_create_slot(t, MONDAY_10 + Duration::days(15), MONDAY_10));
        assert_eq!(
            snapshot.check_slot_creation(t, MONDAY_10 + Duration::days(15), MONDAY_10),
            Err(CreationDenial::BeyondCreationWindow)
        );
    }

    #[test]
    fn slot_creation_without_rule_is_denied() {
        let snapshot = RulesSnapshot::empty();
        assert!(!snapshot.can_create_slot(MentorType::Coach, MONDAY_10, MONDAY_10));
        assert_eq!(
            snapshot.check_slot_creation(MentorType::Coach, MONDAY_10, MONDAY_10),
            Err(CreationDenial::NoRule)
        );
        assert_eq!(snapshot.slot_creation_deadline(MentorType::Coach, MONDAY_10), None);
    }

    #[test]
    fn booking_respects_advance_range() {
        let snapshot = RulesSnapshot::new(vec![rule("expert")], Vec::new(), Vec::new());
        let t = MentorType::Expert;
        assert_eq!(
            snapshot.check_booking(t, MONDAY_10 + Duration::hours(23), MONDAY_10),
            Err(BookingDenial::TooSoon)
        );
        assert!(snapshot.can_book_slot(t, MONDAY_10 + Duration::hours(25), MONDAY_10));
        assert_eq!(
            snapshot.check_booking(t, MONDAY_10 + Duration::days(31), MONDAY_10),
            Err(BookingDenial::TooFar)
        );
    }

    #[test]
    fn booking_range_is_inclusive() {
        let snapshot = RulesSnapshot::new(vec![rule("expert")], Vec::new(), Vec::new());
        let t = MentorType::Expert;
        let (earliest, latest) = snapshot.booking_range(t, MONDAY_10).unwrap();
        assert_eq!(earliest, MONDAY_10 + Duration::hours(24));
        assert_eq!(latest, MONDAY_10 + Duration::days(30));
        assert!(snapshot.can_book_slot(t, earliest, MONDAY_10));
        assert!(snapshot.can_book_slot(t, latest, MONDAY_10));
    }

    #[test]
    fn hidden_type_short_circuits_booking() {
        let snapshot = RulesSnapshot::new(vec![rule("coach")], vec![hidden(MentorType::Coach)], Vec::new());
        let slot = MONDAY_10 + Duration::days(2);
        assert_eq!(
            snapshot.check_booking(MentorType::Coach, slot, MONDAY_10),
            Err(BookingDenial::MentorTypeHidden)
        );
        // Even a slot that would also be too soon reports the visibility reason.
        assert_eq!(
            snapshot.check_booking(MentorType::Coach, MONDAY_10, MONDAY_10),
            Err(BookingDenial::MentorTypeHidden)
        );

        // No rule, and the only window is on Tuesday: still the visibility reason.
        let closed = RulesSnapshot::new(
            vec![rule("expert")],
            vec![hidden(MentorType::Coach)],
            vec![window(2, "09:00:00", "17:00:00", true)],
        );
        assert!(!closed.is_within_booking_window(MONDAY_10));
        assert!(closed.rule(MentorType::Coach).is_none());
        assert_eq!(
            closed.check_booking(MentorType::Coach, slot, MONDAY_10),
            Err(BookingDenial::MentorTypeHidden)
        );
        assert!(!closed.can_book_slot(MentorType::Coach, slot, MONDAY_10));
    }

    #[test]
    fn window_ending_at_midnight_covers_the_last_second() {
        let snapshot = RulesSnapshot::new(Vec::new(), Vec::new(), vec![window(1, "18:00:00", "24:00:00", true)]);
        assert!(snapshot.is_within_booking_window(datetime!(2024-01-01 23:59:59.900 UTC)));
        assert!(!snapshot.is_within_booking_window(datetime!(2024-01-02 00:00:00 UTC)));
    }

    #[test]
    fn booking_outside_window_is_denied() {
        let snapshot = monday_nine_to_five();
        let tuesday = datetime!(2024-01-02 10:00:00 UTC);
        assert_eq!(
            snapshot.check_booking(MentorType::Expert, tuesday + Duration::days(2), tuesday),
            Err(BookingDenial::OutsideBookingWindow)
        );
        assert!(snapshot.can_book_slot(MentorType::Expert, MONDAY_10 + Duration::days(2), MONDAY_10));
    }

    #[test]
    fn booking_without_rule_is_denied() {
        let snapshot = RulesSnapshot::empty();
        assert_eq!(
            snapshot.check_booking(MentorType::Expert, MONDAY_10 + Duration::days(2), MONDAY_10),
            Err(BookingDenial::NoRule)
        );
    }

    #[test]
    fn advance_booking_weeks_defaults_to_one() {
        let mut row = rule_row("coach");
        row.advance_booking_weeks = None;
        let snapshot = RulesSnapshot::new(
            vec![rule("expert"), SchedulingRule::try_from(row).unwrap()],
            Vec::new(),
            Vec::new(),
        );
        assert_eq!(snapshot.advance_booking_weeks(MentorType::Expert), 2);
        assert_eq!(snapshot.advance_booking_weeks(MentorType::Coach), 1);
        assert_eq!(snapshot.advance_booking_weeks(MentorType::FounderMentor), 1);
    }

    #[test]
    fn first_rule_for_a_type_wins() {
        let mut second = rule_row("expert");
        second.slot_creation_window_weeks = 8;
        let snapshot = RulesSnapshot::new(
            vec![rule("expert"), SchedulingRule::try_from(second).unwrap()],
            Vec::new(),
            Vec::new(),
        );
        assert_eq!(snapshot.rule_count(), 1);
        assert_eq!(snapshot.rule(MentorType::Expert).unwrap().slot_creation_window_weeks, 2);
    }

    #[test]
    fn rule_lookups() {
        let snapshot = RulesSnapshot::new(vec![rule("expert")], Vec::new(), Vec::new());
        assert_eq!(snapshot.max_sessions_per_week(MentorType::Expert), Some(3));
        assert_eq!(snapshot.default_session_duration(MentorType::Expert), Some(Duration::minutes(45)));
        assert!(snapshot.allows_recurring_slots(MentorType::Expert));
        assert_eq!(snapshot.max_sessions_per_week(MentorType::Coach), None);
        assert!(!snapshot.allows_recurring_slots(MentorType::Coach));
    }
}
