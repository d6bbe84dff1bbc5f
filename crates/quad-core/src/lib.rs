#![forbid(unsafe_code)]

mod model;
mod permission;
mod resolver;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

pub use model::{Channel, Member, Overwrite, OverwriteSubject, Role, Server, BASELINE_ROLE_NAME};
pub use permission::{Permission, PermissionSet};
pub use resolver::{effective_permissions, explain, resolve, Decision, DecisionReason, Resolver};

/// Returns the project code name.
#[must_use]
pub const fn project_name() -> &'static str {
    "quad"
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("name is invalid")]
    InvalidName,
    #[error("user id is invalid")]
    InvalidUserId,
    #[error("role id is invalid")]
    InvalidRoleId,
    #[error("server id is invalid")]
    InvalidServerId,
    #[error("channel id is invalid")]
    InvalidChannelId,
    #[error("permission is unknown")]
    UnknownPermission,
    #[error("overwrite subject is invalid")]
    InvalidOverwriteSubject,
}

macro_rules! ulid_id {
    ($name:ident, $error:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Ulid);

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl TryFrom<String> for $name {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                let parsed = Ulid::from_string(&value).map_err(|_| DomainError::$error)?;
                Ok(Self(parsed))
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0.to_string()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

ulid_id!(UserId, InvalidUserId);
ulid_id!(RoleId, InvalidRoleId);
ulid_id!(ServerId, InvalidServerId);
ulid_id!(ChannelId, InvalidChannelId);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleName(String);

impl RoleName {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoleName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_name(&value, 1, 32)?;
        Ok(Self(value))
    }
}

impl From<RoleName> for String {
    fn from(value: RoleName) -> Self {
        value.0
    }
}

fn validate_name(value: &str, min: usize, max: usize) -> Result<(), DomainError> {
    if !(min..=max).contains(&value.chars().count()) {
        return Err(DomainError::InvalidName);
    }

    if value.chars().all(|c| !c.is_control()) && value.trim() == value {
        return Ok(());
    }

    Err(DomainError::InvalidName)
}
