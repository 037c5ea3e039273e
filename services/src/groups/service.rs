//! Group service trait and the in-memory implementation.

use crate::users::UserId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt::Display;
use std::future::Future;
use std::num::ParseIntError;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

/// Identifier of a user group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(u64);

impl GroupId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GroupId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// A user group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub gid: GroupId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Group {
    pub fn new(gid: GroupId, name: impl Into<String>) -> Self {
        Self {
            gid,
            name: name.into(),
            description: String::new(),
        }
    }
}

/// Error type for group service operations.
#[derive(Debug, thiserror::Error)]
pub enum GroupServiceError {
    /// The backing service failed.
    #[error("Group service error: {0}")]
    ServiceError(String),
}

/// Trait for group lookups needed by user administration.
pub trait GroupService: Clone + Send + Sync + 'static {
    /// The error type for group operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Groups the acting user is allowed to add members to.
    fn list_editable_groups(
        &self,
        acting_user: UserId,
    ) -> impl Future<Output = Result<BTreeSet<GroupId>, Self::Error>> + Send;

    /// The group new accounts join when nothing else is requested.
    fn default_group_id(&self) -> impl Future<Output = Result<GroupId, Self::Error>> + Send;

    /// Lists all groups ordered by id.
    fn list_groups(&self) -> impl Future<Output = Result<Vec<Group>, Self::Error>> + Send;
}

/// Id of the "Users" group every installation starts with.
pub const DEFAULT_GROUP_ID: GroupId = GroupId::new(1);

struct GroupRegistry {
    groups: BTreeMap<GroupId, Group>,
    default_group: GroupId,
    editors: HashMap<UserId, BTreeSet<GroupId>>,
    administrators: HashSet<UserId>,
    unavailable: bool,
}

impl Default for GroupRegistry {
    fn default() -> Self {
        Self {
            groups: BTreeMap::new(),
            default_group: DEFAULT_GROUP_ID,
            editors: HashMap::new(),
            administrators: HashSet::new(),
            unavailable: false,
        }
    }
}

/// In-memory implementation of `GroupService`.
///
/// Editing rights are granted per user and group; administrators may edit
/// every registered group.
#[derive(Clone, Default)]
pub struct InMemoryGroupService {
    registry: Arc<RwLock<GroupRegistry>>,
}

impl InMemoryGroupService {
    /// Creates a service with no groups and group 1 as default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a group (builder pattern).
    pub fn with_group(self, group: Group) -> Self {
        self.registry
            .write()
            .expect("lock poisoned")
            .groups
            .insert(group.gid, group);
        self
    }

    /// Sets the default group (builder pattern).
    pub fn with_default_group(self, gid: GroupId) -> Self {
        self.registry.write().expect("lock poisoned").default_group = gid;
        self
    }

    /// Lets `user` add members to the given groups (builder pattern).
    pub fn with_editor(self, user: UserId, groups: impl IntoIterator<Item = GroupId>) -> Self {
        self.registry
            .write()
            .expect("lock poisoned")
            .editors
            .entry(user)
            .or_default()
            .extend(groups);
        self
    }

    /// Lets `user` add members to every group (builder pattern).
    pub fn with_administrator(self, user: UserId) -> Self {
        self.registry
            .write()
            .expect("lock poisoned")
            .administrators
            .insert(user);
        self
    }

    /// Makes every call fail, as if the backing service were down.
    pub fn unavailable(self) -> Self {
        self.registry.write().expect("lock poisoned").unavailable = true;
        self
    }

    fn ensure_available(registry: &GroupRegistry) -> Result<(), GroupServiceError> {
        if registry.unavailable {
            return Err(GroupServiceError::ServiceError(
                "group registry is unavailable".to_owned(),
            ));
        }
        Ok(())
    }
}

impl GroupService for InMemoryGroupService {
    type Error = GroupServiceError;

    async fn list_editable_groups(&self, acting_user: UserId) -> Result<BTreeSet<GroupId>, Self::Error> {
        let registry = self.registry.read().expect("lock poisoned");
        Self::ensure_available(&registry)?;

        if registry.administrators.contains(&acting_user) {
            return Ok(registry.groups.keys().copied().collect());
        }

        // Rights on groups that no longer exist grant nothing.
        Ok(registry
            .editors
            .get(&acting_user)
            .map(|granted| {
                granted
                    .iter()
                    .filter(|gid| registry.groups.contains_key(*gid))
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn default_group_id(&self) -> Result<GroupId, Self::Error> {
        let registry = self.registry.read().expect("lock poisoned");
        Self::ensure_available(&registry)?;
        Ok(registry.default_group)
    }

    async fn list_groups(&self) -> Result<Vec<Group>, Self::Error> {
        let registry = self.registry.read().expect("lock poisoned");
        Self::ensure_available(&registry)?;
        Ok(registry.groups.values().cloned().collect())
    }
}
