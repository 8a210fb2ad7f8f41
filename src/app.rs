use axum::{
    extract::State,
    http::{HeaderValue, Method},
    middleware,
    routing::get,
    Json, Router,
};
use serde_json::json;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::{
    app_state::AppState, middleware::observability_middleware, modules::scheduling::scheduling_routes,
};

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(state.env.server.cors_allow_origin.as_deref());

    Router::new()
        .route("/health", get(health_check))
        .nest("/scheduling", scheduling_routes())
        .layer(middleware::from_fn(observability_middleware))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(allow_origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    match allow_origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(e)) => {
            warn!("Ignoring invalid CORS_ALLOW_ORIGIN: {}", e);
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let db_status = match state.rules.source().ping().await {
        Ok(()) => "healthy",
        Err(e) => {
            tracing::info!("Database health check failed: {}", e);
            "unhealthy"
        }
    };

    let (rules_status, rules_loaded_at) = match state.rules.snapshot().await {
        Ok(snapshot) => ("loaded", snapshot.loaded_at().format(&Rfc3339).ok()),
        Err(_) => ("loading", None),
    };

    let telemetry_health = crate::telemetry::telemetry_health_check(&state.telemetry);

    Json(json!({
        "status": "ok",
        "timestamp": OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "database": db_status,
            "scheduling_rules": rules_status,
            "scheduling_rules_loaded_at": rules_loaded_at,
            "telemetry": telemetry_health
        }
    }))
}
