use axum::{
    extract::{rejection::BytesRejection, State},
    Json,
};
use bytes::Bytes;
use quad_core::{Decision, Permission};
use quad_protocol::{
    parse_batch, parse_effective, parse_query, AuthorizeResponse, BatchResponse,
    EffectiveResponse, PermissionDecision, QueryContext, PROTOCOL_VERSION,
};

use super::{core::AppState, errors::ApiFailure, metrics::record_decision};

// Body extraction failures (over the configured limit, unreadable stream) go
// through `ApiFailure` so they get the same JSON error and counters.
pub(crate) async fn authorize(
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<AuthorizeResponse>, ApiFailure> {
    let query = parse_query(&body?)?;
    let decision = query.context.resolver().decide(query.permission);
    observe_decision(&query.context, query.permission, decision);

    Ok(Json(AuthorizeResponse {
        v: PROTOCOL_VERSION,
        decision: PermissionDecision::new(query.permission, decision),
    }))
}

pub(crate) async fn authorize_batch(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<BatchResponse>, ApiFailure> {
    let batch = parse_batch(&body?)?;
    if batch.permissions.len() > state.max_batch_permissions {
        return Err(ApiFailure::BatchTooLarge);
    }

    let resolver = batch.context.resolver();
    let decisions = batch
        .permissions
        .iter()
        .map(|permission| {
            let decision = resolver.decide(*permission);
            observe_decision(&batch.context, *permission, decision);
            PermissionDecision::new(*permission, decision)
        })
        .collect();

    Ok(Json(BatchResponse {
        v: PROTOCOL_VERSION,
        decisions,
    }))
}

pub(crate) async fn effective_permissions(
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<EffectiveResponse>, ApiFailure> {
    let query = parse_effective(&body?)?;
    let permissions = query.context.resolver().effective_permissions();
    tracing::debug!(
        event = "authorize.effective",
        server_id = %display_id(query.context.server.as_ref().map(|server| server.id)),
        user_id = %display_id(query.context.member.as_ref().map(|member| member.user_id)),
        granted = permissions.len(),
    );

    Ok(Json(EffectiveResponse {
        v: PROTOCOL_VERSION,
        permissions,
    }))
}

fn observe_decision(context: &QueryContext, permission: Permission, decision: Decision) {
    record_decision(decision);
    let outcome = if decision.allowed { "allowed" } else { "denied" };
    tracing::info!(
        event = "authorize.decision",
        outcome,
        reason = decision.reason.as_str(),
        permission = permission.as_str(),
        server_id = %display_id(context.server.as_ref().map(|server| server.id)),
        user_id = %display_id(context.member.as_ref().map(|member| member.user_id)),
        channel_id = %display_id(context.channel.as_ref().map(|channel| channel.id)),
    );
}

fn display_id<T: ToString>(id: Option<T>) -> String {
    id.map_or_else(|| String::from("-"), |id| id.to_string())
}
