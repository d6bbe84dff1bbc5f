//! Permission resolution for a member of a server, optionally scoped to a channel.
//!
//! Evaluation order:
//! 1. the server owner is always allowed
//! 2. base permissions are the baseline role's set unioned with every held role's set
//! 3. `ADMINISTRATOR` in the base set allows everything, channel overwrites included
//! 4. without a channel the base set decides
//! 5. a baseline-role overwrite denies immediately, or adds an allowed permission
//! 6. overwrites for held roles are folded in order: deny removes, then allow adds
//! 7. a member overwrite decides immediately on deny or allow
//! 8. otherwise the accumulated set decides
//!
//! Steps 5 and 7 short-circuit while step 6 does not, so a later role overwrite can
//! re-grant what an earlier one removed. Missing server or member context is a deny.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::{Channel, Member, Overwrite, OverwriteSubject, Permission, PermissionSet, RoleId, Server};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    MissingContext,
    Owner,
    Administrator,
    ServerRoles,
    BaselineOverwriteDeny,
    MemberOverwriteDeny,
    MemberOverwriteAllow,
    ChannelRoles,
}

impl DecisionReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingContext => "missing_context",
            Self::Owner => "owner",
            Self::Administrator => "administrator",
            Self::ServerRoles => "server_roles",
            Self::BaselineOverwriteDeny => "baseline_overwrite_deny",
            Self::MemberOverwriteDeny => "member_overwrite_deny",
            Self::MemberOverwriteAllow => "member_overwrite_allow",
            Self::ChannelRoles => "channel_roles",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub allowed: bool,
    pub reason: DecisionReason,
}

impl Decision {
    const fn allow(reason: DecisionReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    const fn deny(reason: DecisionReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

/// Borrowed snapshot of everything one decision needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolver<'a> {
    server: Option<&'a Server>,
    member: Option<&'a Member>,
    channel: Option<&'a Channel>,
    role_order: Option<&'a [RoleId]>,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub const fn new(server: Option<&'a Server>, member: Option<&'a Member>) -> Self {
        Self {
            server,
            member,
            channel: None,
            role_order: None,
        }
    }

    #[must_use]
    pub const fn in_channel(mut self, channel: Option<&'a Channel>) -> Self {
        self.channel = channel;
        self
    }

    /// Orders role overwrites by priority instead of list order.
    ///
    /// `role_order` runs from highest to lowest priority. Higher priority overwrites
    /// are applied later and therefore win. Overwrites for unranked roles keep their
    /// list order and run before every ranked one.
    #[must_use]
    pub const fn with_role_order(mut self, role_order: Option<&'a [RoleId]>) -> Self {
        self.role_order = role_order;
        self
    }

    #[must_use]
    pub fn allows(&self, permission: Permission) -> bool {
        self.decide(permission).allowed
    }

    #[must_use]
    pub fn decide(&self, permission: Permission) -> Decision {
        let (Some(server), Some(member)) = (self.server, self.member) else {
            return Decision::deny(DecisionReason::MissingContext);
        };

        if server.is_owner(member.user_id) {
            return Decision::allow(DecisionReason::Owner);
        }

        let baseline = server.baseline_role();
        let mut current = base_permissions(server, member);
        if current.contains(Permission::Administrator) {
            return Decision::allow(DecisionReason::Administrator);
        }

        let Some(channel) = self.channel else {
            return decide_from(current, permission, DecisionReason::ServerRoles);
        };

        if let Some(overwrite) = baseline.and_then(|role| {
            channel
                .overwrites
                .iter()
                .find(|overwrite| overwrite.targets_role(role.id))
        }) {
            if overwrite.deny.contains(permission) {
                return Decision::deny(DecisionReason::BaselineOverwriteDeny);
            }
            if overwrite.allow.contains(permission) {
                current.insert(permission);
            }
        }

        let baseline_id = baseline.map(|role| role.id);
        for overwrite in self.held_role_overwrites(channel, member, baseline_id) {
            if overwrite.deny.contains(permission) {
                current.remove(permission);
            }
            if overwrite.allow.contains(permission) {
                current.insert(permission);
            }
        }

        if let Some(overwrite) = channel
            .overwrites
            .iter()
            .find(|overwrite| overwrite.targets_member(member.user_id))
        {
            if overwrite.deny.contains(permission) {
                return Decision::deny(DecisionReason::MemberOverwriteDeny);
            }
            if overwrite.allow.contains(permission) {
                return Decision::allow(DecisionReason::MemberOverwriteAllow);
            }
        }

        decide_from(current, permission, DecisionReason::ChannelRoles)
    }

    /// Every permission this context would be allowed.
    #[must_use]
    pub fn effective_permissions(&self) -> PermissionSet {
        Permission::ALL
            .into_iter()
            .filter(|permission| self.allows(*permission))
            .collect()
    }

    fn held_role_overwrites(
        &self,
        channel: &'a Channel,
        member: &Member,
        baseline_id: Option<RoleId>,
    ) -> Vec<&'a Overwrite> {
        let mut overwrites: Vec<&Overwrite> = channel
            .overwrites
            .iter()
            .filter(|overwrite| match overwrite.subject {
                OverwriteSubject::Role(role_id) => {
                    Some(role_id) != baseline_id && member.holds_role(role_id)
                }
                OverwriteSubject::Member(_) => false,
            })
            .collect();

        if let Some(order) = self.role_order {
            overwrites.sort_by_key(|overwrite| match overwrite.subject {
                OverwriteSubject::Role(role_id) => order
                    .iter()
                    .position(|ranked| *ranked == role_id)
                    .map(Reverse),
                OverwriteSubject::Member(_) => None,
            });
        }
        overwrites
    }
}

/// Decides whether `member` may use `permission`, in `channel` when given.
///
/// Returns `false` when either `member` or `server` is missing.
#[must_use]
pub fn resolve(
    member: Option<&Member>,
    permission: Permission,
    channel: Option<&Channel>,
    server: Option<&Server>,
) -> bool {
    Resolver::new(server, member)
        .in_channel(channel)
        .allows(permission)
}

/// Same decision as [`resolve`], with the step that produced it.
#[must_use]
pub fn explain(
    member: Option<&Member>,
    permission: Permission,
    channel: Option<&Channel>,
    server: Option<&Server>,
) -> Decision {
    Resolver::new(server, member)
        .in_channel(channel)
        .decide(permission)
}

#[must_use]
pub fn effective_permissions(
    member: Option<&Member>,
    channel: Option<&Channel>,
    server: Option<&Server>,
) -> PermissionSet {
    Resolver::new(server, member)
        .in_channel(channel)
        .effective_permissions()
}

fn base_permissions(server: &Server, member: &Member) -> PermissionSet {
    let baseline = server
        .baseline_role()
        .map_or_else(PermissionSet::empty, |role| role.permissions);
    member
        .role_ids
        .iter()
        .filter_map(|role_id| server.role(*role_id))
        .fold(baseline, |set, role| set.union(role.permissions))
}

fn decide_from(current: PermissionSet, permission: Permission, reason: DecisionReason) -> Decision {
    Decision {
        allowed: current.contains(permission),
        reason,
    }
}
