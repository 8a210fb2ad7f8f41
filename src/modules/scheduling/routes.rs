use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    booking_window_status, can_book_slot, can_create_slot, get_mentor_type_rule, list_mentor_types,
    refetch_rules, slot_bookable,
};
use crate::app_state::AppState;

pub fn scheduling_routes() -> Router<AppState> {
    Router::new()
        .route("/mentor-types", get(list_mentor_types))
        .route("/mentor-types/{mentor_type}/rule", get(get_mentor_type_rule))
        .route("/booking-window", get(booking_window_status))
        .route("/can-create", post(can_create_slot))
        .route("/can-book", post(can_book_slot))
        .route("/slots/{slot_id}/bookable", get(slot_bookable))
        .route("/refetch", post(refetch_rules))
}
