//! Declarative default-permission policy for new organizations.
//!
//! Policy is data: an ordered list of [`PolicyRule`]s evaluated against
//! an [`OrgRegistry`] of the org's containers and groups. Ordering is
//! significant — a rule referencing a container or group no earlier
//! rule created fails fast with `PolicyViolation`, which indicates a
//! bug in the policy table rather than a runtime condition.
//!
//! Grants are recorded by inserting the granted group's authz id into
//! the target's ACE group list, never by enumerating the group's
//! members onto the target. Each grant is a read-modify-write against
//! the remote ACL; the remote update is skipped when the ACE already
//! carries the grant, so re-applying a policy issues no mutations.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::error::{DomainError, DomainResult};
use crate::gateway::{AuthzApi, RequestContext};
use crate::model::{AuthzId, MemberRef, ObjectKind, Permission};

/// What a grant applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantTarget {
    Container(String),
    Group(String),
    Organization,
}

impl fmt::Display for GrantTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantTarget::Container(name) => write!(f, "container '{name}'"),
            GrantTarget::Group(name) => write!(f, "group '{name}'"),
            GrantTarget::Organization => f.write_str("organization"),
        }
    }
}

/// One step of a declarative org policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyRule {
    /// Ensures the named containers exist, each with an initially
    /// empty ACL.
    CreateContainers { names: Vec<String> },
    /// Ensures the named groups exist, each with empty membership.
    CreateGroups { names: Vec<String> },
    /// Adds the configured superuser to a group's actor membership.
    IncludeSuperuser { group: String },
    /// Inserts `group`'s authz id into the named ACE kinds on each
    /// target.
    GrantGroup {
        group: String,
        kinds: Vec<Permission>,
        targets: Vec<GrantTarget>,
    },
    /// Empties the group list of the named ACEs on `group`'s own ACL,
    /// so no other group holds rights onto it.
    ClearGroupsFromAce {
        group: String,
        kinds: Vec<Permission>,
    },
}

impl PolicyRule {
    fn name(&self) -> &'static str {
        match self {
            PolicyRule::CreateContainers { .. } => "create_containers",
            PolicyRule::CreateGroups { .. } => "create_groups",
            PolicyRule::IncludeSuperuser { .. } => "include_superuser",
            PolicyRule::GrantGroup { .. } => "grant_group",
            PolicyRule::ClearGroupsFromAce { .. } => "clear_groups_from_ace",
        }
    }
}

/// The authz ids of one organization's scope: the org object itself
/// plus its containers and groups by name.
///
/// Pre-seeding the registry with already-existing names gives the
/// create rules their ensure semantics.
#[derive(Debug, Clone)]
pub struct OrgRegistry {
    org_id: AuthzId,
    containers: BTreeMap<String, AuthzId>,
    groups: BTreeMap<String, AuthzId>,
}

impl OrgRegistry {
    pub fn new(org_id: AuthzId) -> Self {
        Self {
            org_id,
            containers: BTreeMap::new(),
            groups: BTreeMap::new(),
        }
    }

    pub fn org_id(&self) -> &AuthzId {
        &self.org_id
    }

    pub fn container(&self, name: &str) -> Option<&AuthzId> {
        self.containers.get(name)
    }

    pub fn group(&self, name: &str) -> Option<&AuthzId> {
        self.groups.get(name)
    }

    pub fn insert_container(&mut self, name: impl Into<String>, id: AuthzId) {
        self.containers.insert(name.into(), id);
    }

    pub fn insert_group(&mut self, name: impl Into<String>, id: AuthzId) {
        self.groups.insert(name.into(), id);
    }

    /// Resolves a grant target to its object kind and authz id.
    fn locate(&self, target: &GrantTarget) -> Option<(ObjectKind, AuthzId)> {
        match target {
            GrantTarget::Container(name) => self
                .containers
                .get(name)
                .map(|id| (ObjectKind::Container, id.clone())),
            GrantTarget::Group(name) => {
                self.groups.get(name).map(|id| (ObjectKind::Group, id.clone()))
            }
            GrantTarget::Organization => Some((ObjectKind::Object, self.org_id.clone())),
        }
    }
}

/// Counters describing what a policy application changed remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyOutcome {
    pub containers_created: usize,
    pub groups_created: usize,
    pub aces_updated: usize,
    pub members_added: usize,
}

/// Evaluates policy rule lists against the remote authorization
/// service.
pub struct PolicyEngine<A> {
    gateway: Arc<A>,
    superuser: AuthzId,
}

impl<A: AuthzApi> PolicyEngine<A> {
    /// The superuser id is configuration, known a priori; it is never
    /// resolved by name.
    pub fn new(gateway: Arc<A>, superuser: AuthzId) -> Self {
        Self { gateway, superuser }
    }

    /// Applies the rules in order, failing fast on the first error.
    #[instrument(skip_all, fields(org = %registry.org_id(), rules = rules.len()))]
    pub async fn apply(
        &self,
        ctx: &RequestContext,
        registry: &mut OrgRegistry,
        rules: &[PolicyRule],
    ) -> DomainResult<PolicyOutcome> {
        let mut outcome = PolicyOutcome::default();
        for rule in rules {
            self.apply_rule(ctx, registry, rule, &mut outcome).await?;
        }
        debug!(?outcome, "policy applied");
        Ok(outcome)
    }

    async fn apply_rule(
        &self,
        ctx: &RequestContext,
        registry: &mut OrgRegistry,
        rule: &PolicyRule,
        outcome: &mut PolicyOutcome,
    ) -> DomainResult<()> {
        match rule {
            PolicyRule::CreateContainers { names } => {
                for name in names {
                    if registry.container(name).is_some() {
                        continue;
                    }
                    let id = self.gateway.create_object(ctx, ObjectKind::Container).await?;
                    registry.insert_container(name.clone(), id);
                    outcome.containers_created += 1;
                }
            }
            PolicyRule::CreateGroups { names } => {
                for name in names {
                    if registry.group(name).is_some() {
                        continue;
                    }
                    let id = self.gateway.create_object(ctx, ObjectKind::Group).await?;
                    registry.insert_group(name.clone(), id);
                    outcome.groups_created += 1;
                }
            }
            PolicyRule::IncludeSuperuser { group } => {
                let group_id = self.require_group(rule, registry, group)?;
                let membership = self.gateway.fetch_group(ctx, &group_id).await?;
                if !membership.contains_actor(&self.superuser) {
                    self.gateway
                        .add_member(ctx, &group_id, &MemberRef::actor(self.superuser.clone()))
                        .await?;
                    outcome.members_added += 1;
                }
            }
            PolicyRule::GrantGroup {
                group,
                kinds,
                targets,
            } => {
                let group_id = self.require_group(rule, registry, group)?;
                for target in targets {
                    let (kind, target_id) =
                        registry
                            .locate(target)
                            .ok_or_else(|| DomainError::PolicyViolation {
                                rule: rule.name().to_string(),
                                missing: target.to_string(),
                            })?;
                    let mut acl = self.gateway.fetch_acl(ctx, kind, &target_id).await?;
                    let mut changed = Vec::new();
                    for permission in kinds {
                        if acl.ace_mut(*permission).add_group(group_id.clone()) {
                            changed.push(*permission);
                        }
                    }
                    for permission in changed {
                        self.gateway
                            .update_ace(ctx, kind, &target_id, permission, acl.ace(permission))
                            .await?;
                        outcome.aces_updated += 1;
                    }
                }
            }
            PolicyRule::ClearGroupsFromAce { group, kinds } => {
                let group_id = self.require_group(rule, registry, group)?;
                let mut acl = self
                    .gateway
                    .fetch_acl(ctx, ObjectKind::Group, &group_id)
                    .await?;
                for permission in kinds {
                    if acl.ace_mut(*permission).clear_groups() {
                        self.gateway
                            .update_ace(
                                ctx,
                                ObjectKind::Group,
                                &group_id,
                                *permission,
                                acl.ace(*permission),
                            )
                            .await?;
                        outcome.aces_updated += 1;
                    }
                }
            }
        }
        Ok(())
    }

    fn require_group(
        &self,
        rule: &PolicyRule,
        registry: &OrgRegistry,
        name: &str,
    ) -> DomainResult<AuthzId> {
        registry
            .group(name)
            .cloned()
            .ok_or_else(|| DomainError::PolicyViolation {
                rule: rule.name().to_string(),
                missing: format!("group '{name}'"),
            })
    }
}

/// Container names every organization starts with.
pub const DEFAULT_CONTAINERS: [&str; 9] = [
    "clients",
    "containers",
    "cookbooks",
    "data",
    "environments",
    "groups",
    "nodes",
    "roles",
    "sandboxes",
];

/// Group names every organization starts with.
pub const DEFAULT_GROUPS: [&str; 4] = ["admins", "billing-admins", "clients", "users"];

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn containers(names: &[&str]) -> Vec<GrantTarget> {
    names
        .iter()
        .map(|name| GrantTarget::Container(name.to_string()))
        .collect()
}

/// The fixed policy applied to a freshly created organization.
///
/// Admins hold every permission on the org scope; users hold the
/// non-grant kinds; clients hold just enough to read run data and
/// write back their own node state. The billing-admins group is locked
/// down so that only itself holds rights onto it.
pub fn default_org_policy() -> Vec<PolicyRule> {
    const CRUD: [Permission; 4] = [
        Permission::Create,
        Permission::Read,
        Permission::Update,
        Permission::Delete,
    ];

    let mut admin_targets = vec![GrantTarget::Organization];
    admin_targets.extend(containers(&DEFAULT_CONTAINERS));
    admin_targets.extend([
        GrantTarget::Group("admins".to_string()),
        GrantTarget::Group("clients".to_string()),
        GrantTarget::Group("users".to_string()),
    ]);

    let mut user_targets = vec![GrantTarget::Organization];
    user_targets.extend(containers(&DEFAULT_CONTAINERS));

    vec![
        PolicyRule::CreateContainers {
            names: strings(&DEFAULT_CONTAINERS),
        },
        PolicyRule::CreateGroups {
            names: strings(&DEFAULT_GROUPS),
        },
        PolicyRule::IncludeSuperuser {
            group: "admins".to_string(),
        },
        PolicyRule::GrantGroup {
            group: "admins".to_string(),
            kinds: Permission::ALL.to_vec(),
            targets: admin_targets,
        },
        PolicyRule::GrantGroup {
            group: "users".to_string(),
            kinds: CRUD.to_vec(),
            targets: user_targets,
        },
        PolicyRule::GrantGroup {
            group: "clients".to_string(),
            kinds: vec![Permission::Read],
            targets: containers(&["cookbooks", "data", "environments", "roles", "nodes"]),
        },
        PolicyRule::GrantGroup {
            group: "clients".to_string(),
            kinds: vec![Permission::Create, Permission::Update],
            targets: containers(&["data", "nodes"]),
        },
        PolicyRule::ClearGroupsFromAce {
            group: "billing-admins".to_string(),
            kinds: Permission::ALL.to_vec(),
        },
        PolicyRule::GrantGroup {
            group: "billing-admins".to_string(),
            kinds: vec![Permission::Read, Permission::Update],
            targets: vec![GrantTarget::Group("billing-admins".to_string())],
        },
    ]
}
