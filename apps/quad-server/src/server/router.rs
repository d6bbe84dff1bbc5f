use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, StatusCode},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::{
    core::{AppConfig, AppState},
    handlers::{authorize, authorize_batch, effective_permissions},
    types::{health, metrics},
};

/// Build the axum router with global security middleware.
///
/// # Errors
/// Returns an error if configured limits are invalid.
pub fn build_router(config: &AppConfig) -> anyhow::Result<Router> {
    if config.max_body_bytes == 0 {
        return Err(anyhow!("max body bytes must be at least 1 byte"));
    }
    if config.request_timeout.is_zero() {
        return Err(anyhow!("request timeout must be non-zero"));
    }
    if config.rate_limit_requests_per_minute == 0 {
        return Err(anyhow!(
            "rate limit must be at least 1 request per minute"
        ));
    }
    if config.max_batch_permissions == 0
        || config.max_batch_permissions > quad_protocol::MAX_BATCH_PERMISSIONS
    {
        return Err(anyhow!(
            "max batch permissions must be between 1 and {}",
            quad_protocol::MAX_BATCH_PERMISSIONS
        ));
    }

    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(replenish_interval_ms(config.rate_limit_requests_per_minute))
            .burst_size(config.rate_limit_requests_per_minute)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow!("invalid governor configuration"))?,
    );
    let app_state = AppState::new(config);
    let request_id_header = HeaderName::from_static("x-request-id");
    let governor_layer = GovernorLayer::new(governor_config);

    Ok(Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/authorize", post(authorize))
        .route("/authorize/batch", post(authorize_batch))
        .route("/permissions/effective", post(effective_permissions))
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(SetRequestIdLayer::new(
                    request_id_header.clone(),
                    MakeRequestUuid,
                ))
                .layer(PropagateRequestIdLayer::new(request_id_header))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    config.request_timeout,
                ))
                .layer(governor_layer),
        ))
}

/// Milliseconds between replenished rate-limit cells so that a full minute
/// refills `requests_per_minute` requests. Never below one millisecond.
pub(crate) fn replenish_interval_ms(requests_per_minute: u32) -> u64 {
    (60_000 / u64::from(requests_per_minute.max(1))).max(1)
}
