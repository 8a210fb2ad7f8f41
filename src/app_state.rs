use std::sync::Arc;

use crate::config;
use crate::scheduling::SchedulingRulesService;
use crate::telemetry::TelemetryConfig;

#[derive(Clone)]
pub struct AppState {
    pub env: config::Config,
    pub rules: Arc<SchedulingRulesService>,
    pub telemetry: TelemetryConfig,
}

impl AppState {
    pub fn new(env: config::Config, rules: Arc<SchedulingRulesService>, telemetry: TelemetryConfig) -> Self {
        Self { env, rules, telemetry }
    }
}
