#[cfg(test)]
mod tests {
    use super::super::{
        core::AppConfig,
        errors::ApiFailure,
        metrics::{record_decision, record_rejected_query, render_metrics},
        router::{build_router, replenish_interval_ms},
    };
    use axum::{body::Body, http::Request, http::StatusCode, response::IntoResponse};
    use quad_core::{Decision, DecisionReason};
    use quad_protocol::{ProtocolError, MAX_BATCH_PERMISSIONS};
    use std::time::Duration;
    use tower::ServiceExt;

    #[test]
    fn protocol_errors_map_to_api_failures() {
        assert_eq!(
            ApiFailure::from(ProtocolError::InvalidJson),
            ApiFailure::InvalidRequest
        );
        assert_eq!(
            ApiFailure::from(ProtocolError::UnsupportedVersion {
                expected: 1,
                actual: 2,
            }),
            ApiFailure::UnsupportedVersion
        );
        assert_eq!(
            ApiFailure::from(ProtocolError::OversizedPayload { max: 1, actual: 2 }),
            ApiFailure::PayloadTooLarge
        );
        assert_eq!(
            ApiFailure::from(ProtocolError::InvalidBatchSize {
                max: MAX_BATCH_PERMISSIONS,
                actual: 0,
            }),
            ApiFailure::InvalidRequest
        );
        assert_eq!(
            ApiFailure::from(ProtocolError::InvalidBatchSize {
                max: MAX_BATCH_PERMISSIONS,
                actual: MAX_BATCH_PERMISSIONS + 1,
            }),
            ApiFailure::BatchTooLarge
        );
    }

    #[test]
    fn api_failures_use_expected_status_codes() {
        assert_eq!(
            ApiFailure::InvalidRequest.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiFailure::PayloadTooLarge.into_response().status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn metrics_render_recorded_counters() {
        record_decision(Decision {
            allowed: false,
            reason: DecisionReason::MemberOverwriteDeny,
        });
        record_rejected_query("unsupported_version");

        let rendered = render_metrics();
        assert!(rendered.contains("# TYPE quad_authorize_decisions_total counter"));
        assert!(rendered.contains(
            "quad_authorize_decisions_total{outcome=\"denied\",reason=\"member_overwrite_deny\"}"
        ));
        assert!(rendered.contains("quad_rejected_queries_total{reason=\"unsupported_version\"}"));
    }

    #[test]
    fn router_rejects_invalid_limits() {
        assert!(build_router(&AppConfig {
            max_batch_permissions: 0,
            ..AppConfig::default()
        })
        .is_err());
        assert!(build_router(&AppConfig {
            max_batch_permissions: MAX_BATCH_PERMISSIONS + 1,
            ..AppConfig::default()
        })
        .is_err());
        assert!(build_router(&AppConfig {
            rate_limit_requests_per_minute: 0,
            ..AppConfig::default()
        })
        .is_err());
        assert!(build_router(&AppConfig {
            request_timeout: Duration::ZERO,
            ..AppConfig::default()
        })
        .is_err());
        assert!(build_router(&AppConfig::default()).is_ok());
    }

    #[test]
    fn rate_limit_refills_the_configured_requests_each_minute() {
        assert_eq!(replenish_interval_ms(1), 60_000);
        assert_eq!(replenish_interval_ms(600), 100);
        assert_eq!(replenish_interval_ms(500), 120);
        assert_eq!(replenish_interval_ms(120_000), 1);
        assert!(build_router(&AppConfig {
            rate_limit_requests_per_minute: 120_000,
            ..AppConfig::default()
        })
        .is_ok());
    }

    #[tokio::test]
    async fn health_reports_ok_with_request_id() {
        let app = build_router(&AppConfig::default()).unwrap();
        let request = Request::builder()
            .uri("/health")
            .header("x-forwarded-for", "198.51.100.1")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn caller_request_id_is_echoed_back() {
        let app = build_router(&AppConfig::default()).unwrap();
        let request = Request::builder()
            .uri("/health")
            .header("x-forwarded-for", "198.51.100.2")
            .header("x-request-id", "campus-req-42")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "campus-req-42");
    }
}
