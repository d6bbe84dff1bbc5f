use serde::{Deserialize, Deserializer, Serialize};

use crate::{ChannelId, DomainError, PermissionSet, RoleId, RoleName, ServerId, UserId};

/// Display name given to a freshly created baseline role.
///
/// Lookups never match on this name; see [`Role::is_baseline`].
pub const BASELINE_ROLE_NAME: &str = "@everyone";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Role {
    pub id: RoleId,
    pub name: RoleName,
    #[serde(default)]
    pub permissions: PermissionSet,
    /// Marks the role every member holds implicitly. Set at creation time.
    #[serde(default)]
    pub is_baseline: bool,
}

impl Role {
    #[must_use]
    pub fn new(name: RoleName, permissions: PermissionSet) -> Self {
        Self {
            id: RoleId::new(),
            name,
            permissions,
            is_baseline: false,
        }
    }

    #[must_use]
    pub fn baseline(permissions: PermissionSet) -> Self {
        Self {
            id: RoleId::new(),
            name: RoleName(String::from(BASELINE_ROLE_NAME)),
            permissions,
            is_baseline: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Server {
    pub id: ServerId,
    pub owner_id: UserId,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl Server {
    #[must_use]
    pub fn new(owner_id: UserId, roles: Vec<Role>) -> Self {
        Self {
            id: ServerId::new(),
            owner_id,
            roles,
        }
    }

    /// First role flagged as baseline, if any.
    #[must_use]
    pub fn baseline_role(&self) -> Option<&Role> {
        self.roles.iter().find(|role| role.is_baseline)
    }

    #[must_use]
    pub fn role(&self, id: RoleId) -> Option<&Role> {
        self.roles.iter().find(|role| role.id == id)
    }

    #[must_use]
    pub fn is_owner(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Member {
    pub user_id: UserId,
    #[serde(default)]
    pub role_ids: Vec<RoleId>,
}

impl Member {
    #[must_use]
    pub fn new(user_id: UserId, role_ids: Vec<RoleId>) -> Self {
        Self { user_id, role_ids }
    }

    #[must_use]
    pub fn holds_role(&self, id: RoleId) -> bool {
        self.role_ids.contains(&id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverwriteSubject {
    Role(RoleId),
    Member(UserId),
}

/// Per-channel exception for one role or member.
///
/// `allow` and `deny` are expected to be disjoint but this is not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OverwriteRecord", into = "OverwriteRecord")]
pub struct Overwrite {
    pub subject: OverwriteSubject,
    pub allow: PermissionSet,
    pub deny: PermissionSet,
}

impl Overwrite {
    #[must_use]
    pub const fn role(role_id: RoleId, allow: PermissionSet, deny: PermissionSet) -> Self {
        Self {
            subject: OverwriteSubject::Role(role_id),
            allow,
            deny,
        }
    }

    #[must_use]
    pub const fn member(user_id: UserId, allow: PermissionSet, deny: PermissionSet) -> Self {
        Self {
            subject: OverwriteSubject::Member(user_id),
            allow,
            deny,
        }
    }

    #[must_use]
    pub fn targets_role(&self, role_id: RoleId) -> bool {
        self.subject == OverwriteSubject::Role(role_id)
    }

    #[must_use]
    pub fn targets_member(&self, user_id: UserId) -> bool {
        self.subject == OverwriteSubject::Member(user_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SubjectType {
    Role,
    Member,
    #[serde(other, skip_serializing)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct OverwriteRecord {
    subject_type: SubjectType,
    subject_id: String,
    #[serde(default)]
    allow: PermissionSet,
    #[serde(default)]
    deny: PermissionSet,
}

impl TryFrom<OverwriteRecord> for Overwrite {
    type Error = DomainError;

    fn try_from(value: OverwriteRecord) -> Result<Self, Self::Error> {
        let subject = match value.subject_type {
            SubjectType::Role => OverwriteSubject::Role(RoleId::try_from(value.subject_id)?),
            SubjectType::Member => OverwriteSubject::Member(UserId::try_from(value.subject_id)?),
            SubjectType::Unknown => return Err(DomainError::InvalidOverwriteSubject),
        };
        Ok(Self {
            subject,
            allow: value.allow,
            deny: value.deny,
        })
    }
}

impl From<Overwrite> for OverwriteRecord {
    fn from(value: Overwrite) -> Self {
        let (subject_type, subject_id) = match value.subject {
            OverwriteSubject::Role(id) => (SubjectType::Role, id.to_string()),
            OverwriteSubject::Member(id) => (SubjectType::Member, id.to_string()),
        };
        Self {
            subject_type,
            subject_id,
            allow: value.allow,
            deny: value.deny,
        }
    }
}

/// Channel snapshot. Overwrites are evaluated in list order.
///
/// Overwrites whose subject cannot be read (unknown subject type, unparseable
/// id) are dropped while deserializing and never apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Channel {
    pub id: ChannelId,
    #[serde(default, deserialize_with = "readable_overwrites")]
    pub overwrites: Vec<Overwrite>,
}

fn readable_overwrites<'de, D>(deserializer: D) -> Result<Vec<Overwrite>, D::Error>
where
    D: Deserializer<'de>,
{
    let records = Vec::<OverwriteRecord>::deserialize(deserializer)?;
    Ok(records
        .into_iter()
        .filter_map(|record| Overwrite::try_from(record).ok())
        .collect())
}

impl Channel {
    #[must_use]
    pub fn new(overwrites: Vec<Overwrite>) -> Self {
        Self {
            id: ChannelId::new(),
            overwrites,
        }
    }
}
