#![forbid(unsafe_code)]

use quad_core::{
    Channel, Decision, DecisionReason, Member, Permission, PermissionSet, Resolver, RoleId, Server,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Current query envelope version.
pub const PROTOCOL_VERSION: u16 = 1;
/// Maximum allowed query payload bytes.
pub const MAX_QUERY_BYTES: usize = 256 * 1024;
/// Maximum permissions in one batch query.
pub const MAX_BATCH_PERMISSIONS: usize = 64;

/// Snapshots supplied by the caller for one decision.
///
/// A missing `server` or `member` is accepted here and denied by the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryContext {
    #[serde(default)]
    pub server: Option<Server>,
    #[serde(default)]
    pub member: Option<Member>,
    #[serde(default)]
    pub channel: Option<Channel>,
    #[serde(default)]
    pub role_order: Option<Vec<RoleId>>,
}

impl QueryContext {
    #[must_use]
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self.server.as_ref(), self.member.as_ref())
            .in_channel(self.channel.as_ref())
            .with_role_order(self.role_order.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorizeQuery {
    pub v: u16,
    pub context: QueryContext,
    pub permission: Permission,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorizeBatch {
    pub v: u16,
    pub context: QueryContext,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EffectiveQuery {
    pub v: u16,
    pub context: QueryContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDecision {
    pub permission: Permission,
    pub allowed: bool,
    pub reason: DecisionReason,
}

impl PermissionDecision {
    #[must_use]
    pub const fn new(permission: Permission, decision: Decision) -> Self {
        Self {
            permission,
            allowed: decision.allowed,
            reason: decision.reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeResponse {
    pub v: u16,
    #[serde(flatten)]
    pub decision: PermissionDecision,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub v: u16,
    pub decisions: Vec<PermissionDecision>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveResponse {
    pub v: u16,
    pub permissions: PermissionSet,
}

trait Versioned {
    fn version(&self) -> u16;
}

impl Versioned for AuthorizeQuery {
    fn version(&self) -> u16 {
        self.v
    }
}

impl Versioned for AuthorizeBatch {
    fn version(&self) -> u16 {
        self.v
    }
}

impl Versioned for EffectiveQuery {
    fn version(&self) -> u16 {
        self.v
    }
}

/// Parse and validate a single-permission query at the network boundary.
///
/// # Errors
/// Returns [`ProtocolError`] if the payload exceeds limits, is malformed JSON,
/// names an unknown permission, or carries an unsupported version.
pub fn parse_query(input: &[u8]) -> Result<AuthorizeQuery, ProtocolError> {
    parse_versioned(input)
}

/// Parse and validate a batch query.
///
/// # Errors
/// Returns [`ProtocolError`] for the same reasons as [`parse_query`], and when the
/// batch is empty or lists more than [`MAX_BATCH_PERMISSIONS`] permissions.
pub fn parse_batch(input: &[u8]) -> Result<AuthorizeBatch, ProtocolError> {
    let batch: AuthorizeBatch = parse_versioned(input)?;
    if batch.permissions.is_empty() || batch.permissions.len() > MAX_BATCH_PERMISSIONS {
        return Err(ProtocolError::InvalidBatchSize {
            max: MAX_BATCH_PERMISSIONS,
            actual: batch.permissions.len(),
        });
    }
    Ok(batch)
}

/// Parse and validate an effective-permissions query.
///
/// # Errors
/// Returns [`ProtocolError`] for the same reasons as [`parse_query`].
pub fn parse_effective(input: &[u8]) -> Result<EffectiveQuery, ProtocolError> {
    parse_versioned(input)
}

fn parse_versioned<T: DeserializeOwned + Versioned>(input: &[u8]) -> Result<T, ProtocolError> {
    if input.len() > MAX_QUERY_BYTES {
        return Err(ProtocolError::OversizedPayload {
            max: MAX_QUERY_BYTES,
            actual: input.len(),
        });
    }

    let parsed: T = serde_json::from_slice(input)?;
    if parsed.version() != PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedVersion {
            expected: PROTOCOL_VERSION,
            actual: parsed.version(),
        });
    }

    Ok(parsed)
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("payload exceeds max size: max={max} bytes actual={actual} bytes")]
    OversizedPayload { max: usize, actual: usize },
    #[error("unsupported query version: expected={expected} actual={actual}")]
    UnsupportedVersion { expected: u16, actual: u16 },
    #[error("batch size out of range: max={max} actual={actual}")]
    InvalidBatchSize { max: usize, actual: usize },
    #[error("invalid json payload")]
    InvalidJson,
}

impl From<serde_json::Error> for ProtocolError {
    fn from(_: serde_json::Error) -> Self {
        Self::InvalidJson
    }
}
