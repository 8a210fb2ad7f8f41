pub mod app;
pub mod app_state;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod modules;
pub mod scheduling;
pub mod telemetry;

pub use app::create_router;
pub use app_state::AppState;
pub use error::{AppError, AppResult};
pub use scheduling::{BookingDenial, CreationDenial, RulesSnapshot, SchedulingRulesService};
