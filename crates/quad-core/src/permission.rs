use serde::{Deserialize, Serialize};

use crate::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    ViewChannels,
    ManageServer,
    ManageRoles,
    ManageChannels,
    KickMembers,
    BanMembers,
    CreateInvite,
    SendMessages,
    ManageMessages,
    AttachFiles,
    Connect,
    Speak,
    Administrator,
}

impl Permission {
    pub const ALL: [Self; 13] = [
        Self::ViewChannels,
        Self::ManageServer,
        Self::ManageRoles,
        Self::ManageChannels,
        Self::KickMembers,
        Self::BanMembers,
        Self::CreateInvite,
        Self::SendMessages,
        Self::ManageMessages,
        Self::AttachFiles,
        Self::Connect,
        Self::Speak,
        Self::Administrator,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ViewChannels => "VIEW_CHANNELS",
            Self::ManageServer => "MANAGE_SERVER",
            Self::ManageRoles => "MANAGE_ROLES",
            Self::ManageChannels => "MANAGE_CHANNELS",
            Self::KickMembers => "KICK_MEMBERS",
            Self::BanMembers => "BAN_MEMBERS",
            Self::CreateInvite => "CREATE_INVITE",
            Self::SendMessages => "SEND_MESSAGES",
            Self::ManageMessages => "MANAGE_MESSAGES",
            Self::AttachFiles => "ATTACH_FILES",
            Self::Connect => "CONNECT",
            Self::Speak => "SPEAK",
            Self::Administrator => "ADMINISTRATOR",
        }
    }

    const fn mask(self) -> u64 {
        1 << self as u8
    }
}

impl TryFrom<&str> for Permission {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|permission| permission.as_str() == value)
            .ok_or(DomainError::UnknownPermission)
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bitset over [`Permission`]. Serialized as a sorted list of permission names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Permission>", into = "Vec<Permission>")]
pub struct PermissionSet(u64);

impl PermissionSet {
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub fn all() -> Self {
        Self::from_bits(u64::MAX)
    }

    /// Bits that do not correspond to a known permission are dropped.
    #[must_use]
    pub fn from_bits(bits: u64) -> Self {
        Self(bits & known_permission_mask())
    }

    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, permission: Permission) -> bool {
        self.0 & permission.mask() != 0
    }

    pub fn insert(&mut self, permission: Permission) {
        self.0 |= permission.mask();
    }

    pub fn remove(&mut self, permission: Permission) {
        self.0 &= !permission.mask();
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Permission> {
        Permission::ALL
            .into_iter()
            .filter(move |permission| self.contains(*permission))
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        let mut set = Self::empty();
        set.extend(iter);
        set
    }
}

impl Extend<Permission> for PermissionSet {
    fn extend<I: IntoIterator<Item = Permission>>(&mut self, iter: I) {
        for permission in iter {
            self.insert(permission);
        }
    }
}

impl From<Vec<Permission>> for PermissionSet {
    fn from(value: Vec<Permission>) -> Self {
        value.into_iter().collect()
    }
}

impl From<PermissionSet> for Vec<Permission> {
    fn from(value: PermissionSet) -> Self {
        value.iter().collect()
    }
}

fn known_permission_mask() -> u64 {
    Permission::ALL
        .into_iter()
        .fold(0_u64, |bits, permission| bits | permission.mask())
}

#[cfg(test)]
mod tests {
    use super::{Permission, PermissionSet};
    use crate::DomainError;

    #[test]
    fn permission_names_are_stable() {
        assert_eq!(Permission::SendMessages.as_str(), "SEND_MESSAGES");
        assert_eq!(
            Permission::try_from("ADMINISTRATOR").unwrap(),
            Permission::Administrator
        );
        assert_eq!(
            Permission::try_from("send_messages").unwrap_err(),
            DomainError::UnknownPermission
        );
        assert_eq!(
            serde_json::to_string(&Permission::ViewChannels).unwrap(),
            "\"VIEW_CHANNELS\""
        );
    }

    #[test]
    fn every_permission_has_a_distinct_bit() {
        let all = PermissionSet::all();
        assert_eq!(all.len(), Permission::ALL.len());
        for permission in Permission::ALL {
            assert!(all.contains(permission));
        }
    }

    #[test]
    fn from_bits_masks_unknown_bits() {
        let set = PermissionSet::from_bits((1 << 40) | 1);
        assert_eq!(set.bits(), 1);
        assert!(set.contains(Permission::ViewChannels));
    }

    #[test]
    fn insert_is_idempotent_and_remove_clears() {
        let mut set = PermissionSet::empty();
        set.insert(Permission::Speak);
        set.insert(Permission::Speak);
        assert_eq!(set.len(), 1);
        set.remove(Permission::Speak);
        assert!(set.is_empty());
        set.remove(Permission::Speak);
        assert!(set.is_empty());
    }

    #[test]
    fn serializes_as_ordered_name_list() {
        let set: PermissionSet = [Permission::Speak, Permission::ViewChannels]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["VIEW_CHANNELS","SPEAK"]"#);

        let parsed: PermissionSet =
            serde_json::from_str(r#"["SPEAK","SPEAK","CONNECT"]"#).unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(parsed.contains(Permission::Connect));

        assert!(serde_json::from_str::<PermissionSet>(r#"["FLY"]"#).is_err());
    }
}
