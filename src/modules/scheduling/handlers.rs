use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::OffsetDateTime;
use tracing::debug;
use validator::Validate;

use crate::app_state::AppState;
use crate::db::{BookingWindow, MentorType, SchedulingRule};
use crate::error::{AppError, AppResult};
use crate::scheduling::RefetchSummary;

#[derive(Debug, Serialize)]
pub struct MentorTypeInfo {
    pub mentor_type: MentorType,
    pub is_visible: bool,
    pub has_rule: bool,
}

#[derive(Debug, Serialize)]
pub struct BookingRange {
    #[serde(with = "time::serde::rfc3339")]
    pub earliest: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub latest: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct MentorTypeRuleResponse {
    pub mentor_type: MentorType,
    pub is_visible: bool,
    pub advance_booking_weeks: u32,
    pub rule: Option<SchedulingRule>,
    pub booking_range: Option<BookingRange>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub slot_creation_deadline: Option<OffsetDateTime>,
    pub max_sessions_per_week: Option<u32>,
    pub default_duration_minutes: Option<i64>,
    pub allows_recurring_slots: bool,
}

#[derive(Debug, Serialize)]
pub struct BookingWindowStatus {
    pub open: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub evaluated_at: OffsetDateTime,
    pub windows: Vec<BookingWindow>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SlotCreationRequest {
    #[validate(length(min = 1, message = "mentor_type is required"))]
    pub mentor_type: String,
    #[serde(with = "time::serde::rfc3339")]
    pub target: OffsetDateTime,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SlotBookingRequest {
    #[validate(length(min = 1, message = "mentor_type is required"))]
    pub mentor_type: String,
    #[serde(with = "time::serde::rfc3339")]
    pub slot_start: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub allowed: bool,
    pub reason: Option<&'static str>,
    #[serde(with = "time::serde::rfc3339")]
    pub evaluated_at: OffsetDateTime,
}

impl DecisionResponse {
    fn new(reason: Option<&'static str>, evaluated_at: OffsetDateTime) -> Self {
        Self {
            allowed: reason.is_none(),
            reason,
            evaluated_at,
        }
    }
}

fn parse_mentor_type(raw: &str) -> AppResult<MentorType> {
    raw.parse::<MentorType>().map_err(AppError::BadRequest)
}

/// Visibility and rule presence for every mentor category
pub async fn list_mentor_types(State(state): State<AppState>) -> AppResult<Json<Vec<MentorTypeInfo>>> {
    let snapshot = state.rules.snapshot().await?;

    let types = MentorType::all()
        .iter()
        .map(|t| MentorTypeInfo {
            mentor_type: *t,
            is_visible: snapshot.is_mentor_type_visible(*t),
            has_rule: snapshot.rule(*t).is_some(),
        })
        .collect();

    Ok(Json(types))
}

pub async fn get_mentor_type_rule(
    State(state): State<AppState>,
    Path(mentor_type): Path<String>,
) -> AppResult<Json<MentorTypeRuleResponse>> {
    let mentor_type = parse_mentor_type(&mentor_type)?;
    let snapshot = state.rules.snapshot().await?;
    let now = state.rules.now();

    let response = MentorTypeRuleResponse {
        mentor_type,
        is_visible: snapshot.is_mentor_type_visible(mentor_type),
        advance_booking_weeks: snapshot.advance_booking_weeks(mentor_type),
        rule: snapshot.rule(mentor_type).cloned(),
        booking_range: snapshot
            .booking_range(mentor_type, now)
            .map(|(earliest, latest)| BookingRange { earliest, latest }),
        slot_creation_deadline: snapshot.slot_creation_deadline(mentor_type, now),
        max_sessions_per_week: snapshot.max_sessions_per_week(mentor_type),
        default_duration_minutes: snapshot
            .default_session_duration(mentor_type)
            .map(|d| d.whole_minutes()),
        allows_recurring_slots: snapshot.allows_recurring_slots(mentor_type),
    };

    Ok(Json(response))
}

pub async fn booking_window_status(State(state): State<AppState>) -> AppResult<Json<BookingWindowStatus>> {
    let snapshot = state.rules.snapshot().await?;
    let now = state.rules.now();

    Ok(Json(BookingWindowStatus {
        open: snapshot.is_within_booking_window(now),
        evaluated_at: now,
        windows: snapshot.windows().to_vec(),
    }))
}

pub async fn can_create_slot(
    State(state): State<AppState>,
    Json(payload): Json<SlotCreationRequest>,
) -> AppResult<Json<DecisionResponse>> {
    payload.validate()?;
    let mentor_type = parse_mentor_type(&payload.mentor_type)?;
    let snapshot = state.rules.snapshot().await?;
    let now = state.rules.now();

    let reason = snapshot
        .check_slot_creation(mentor_type, payload.target, now)
        .err()
        .map(|denial| denial.code());
    if let Some(reason) = reason {
        debug!(%mentor_type, reason, "Slot creation denied");
    }

    Ok(Json(DecisionResponse::new(reason, now)))
}

pub async fn can_book_slot(
    State(state): State<AppState>,
    Json(payload): Json<SlotBookingRequest>,
) -> AppResult<Json<DecisionResponse>> {
    payload.validate()?;
    let mentor_type = parse_mentor_type(&payload.mentor_type)?;
    let snapshot = state.rules.snapshot().await?;
    let now = state.rules.now();

    let reason = snapshot
        .check_booking(mentor_type, payload.slot_start, now)
        .err()
        .map(|denial| denial.code());
    if let Some(reason) = reason {
        debug!(%mentor_type, reason, "Booking denied");
    }

    Ok(Json(DecisionResponse::new(reason, now)))
}

/// Checks a stored slot. A slot that is already taken is never bookable.
pub async fn slot_bookable(
    State(state): State<AppState>,
    Path(slot_id): Path<Uuid>,
) -> AppResult<Json<DecisionResponse>> {
    let slot = state.rules.time_slot(slot_id).await?;
    let snapshot = state.rules.snapshot().await?;
    let now = state.rules.now();

    let reason = if slot.is_booked {
        Some("slot_already_booked")
    } else {
        snapshot
            .check_booking(slot.mentor_type, slot.start_time, now)
            .err()
            .map(|denial| denial.code())
    };

    Ok(Json(DecisionResponse::new(reason, now)))
}

pub async fn refetch_rules(State(state): State<AppState>) -> AppResult<Json<RefetchSummary>> {
    let summary = state.rules.refetch().await?;
    Ok(Json(summary))
}
