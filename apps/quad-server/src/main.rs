#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use quad_server::{build_router, init_tracing, AppConfig};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let defaults = AppConfig::default();
    let app_config = AppConfig {
        max_body_bytes: env_or("QUAD_MAX_BODY_BYTES", defaults.max_body_bytes)?,
        request_timeout: Duration::from_secs(env_or(
            "QUAD_REQUEST_TIMEOUT_SECS",
            defaults.request_timeout.as_secs(),
        )?),
        rate_limit_requests_per_minute: env_or(
            "QUAD_RATE_LIMIT_REQUESTS_PER_MINUTE",
            defaults.rate_limit_requests_per_minute,
        )?,
        max_batch_permissions: env_or(
            "QUAD_MAX_BATCH_PERMISSIONS",
            defaults.max_batch_permissions,
        )?,
    };
    let app = build_router(&app_config)?;
    let addr = std::env::var("QUAD_BIND_ADDR")
        .unwrap_or_else(|_| String::from("0.0.0.0:3000"))
        .parse::<SocketAddr>()
        .map_err(|e| anyhow::anyhow!("invalid QUAD_BIND_ADDR: {e}"))?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "quad-server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key).map_or_else(
        |_| Ok(default),
        |value| {
            value
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("invalid {key} value {value:?}: {e}"))
        },
    )
}
