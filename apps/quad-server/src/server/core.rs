use std::{
    collections::HashMap,
    sync::{Mutex, OnceLock},
    time::Duration,
};

pub const DEFAULT_JSON_BODY_LIMIT_BYTES: usize = quad_protocol::MAX_QUERY_BYTES;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RATE_LIMIT_REQUESTS_PER_MINUTE: u32 = 600;
pub const DEFAULT_MAX_BATCH_PERMISSIONS: usize = quad_protocol::MAX_BATCH_PERMISSIONS;
pub(crate) const METRICS_TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub(crate) static METRICS_STATE: OnceLock<MetricsState> = OnceLock::new();

#[derive(Default)]
pub(crate) struct MetricsState {
    pub(crate) decisions: Mutex<HashMap<(&'static str, &'static str), u64>>,
    pub(crate) rejected_queries: Mutex<HashMap<&'static str, u64>>,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub max_body_bytes: usize,
    pub request_timeout: Duration,
    pub rate_limit_requests_per_minute: u32,
    pub max_batch_permissions: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_JSON_BODY_LIMIT_BYTES,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            rate_limit_requests_per_minute: DEFAULT_RATE_LIMIT_REQUESTS_PER_MINUTE,
            max_batch_permissions: DEFAULT_MAX_BATCH_PERMISSIONS,
        }
    }
}

/// Request handlers share no mutable state; each query carries its own snapshots.
#[derive(Clone, Debug)]
pub(crate) struct AppState {
    pub(crate) max_batch_permissions: usize,
}

impl AppState {
    pub(crate) fn new(config: &AppConfig) -> Self {
        Self {
            max_batch_permissions: config.max_batch_permissions,
        }
    }
}
