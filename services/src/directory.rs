//! JSON snapshot of a user directory.
//!
//! The command-line tool keeps accounts, groups and editing rights in one JSON
//! file and works on in-memory collaborators loaded from it.

use crate::groups::{Group, GroupId, InMemoryGroupService};
use crate::users::{InMemoryUserStore, StoredUser, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid directory snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDirectory {
    /// Falls back to group 1 when unset.
    pub default_group: Option<GroupId>,
    pub groups: Vec<Group>,
    pub users: Vec<StoredUser>,
    /// Groups each user may add members to.
    pub editors: BTreeMap<UserId, BTreeSet<GroupId>>,
    /// Users allowed to edit every group.
    pub administrators: BTreeSet<UserId>,
}

impl UserDirectory {
    /// Reads a snapshot; a missing file is an empty directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No directory snapshot yet, starting empty");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(DirectoryError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let directory: Self = serde_json::from_str(&contents)?;
        tracing::debug!(
            path = %path.display(),
            users = directory.users.len(),
            groups = directory.groups.len(),
            "Loaded directory snapshot"
        );
        Ok(directory)
    }

    /// Writes the snapshot as pretty JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DirectoryError> {
        let path = path.as_ref();
        let io_error = |source| DirectoryError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(io_error)?;
        tracing::debug!(path = %path.display(), users = self.users.len(), "Saved directory snapshot");
        Ok(())
    }

    pub fn user_store(&self) -> InMemoryUserStore {
        self.users
            .iter()
            .cloned()
            .fold(InMemoryUserStore::new(), InMemoryUserStore::with_user)
    }

    pub fn group_service(&self) -> InMemoryGroupService {
        let mut service = self
            .groups
            .iter()
            .cloned()
            .fold(InMemoryGroupService::new(), InMemoryGroupService::with_group);

        if let Some(gid) = self.default_group {
            service = service.with_default_group(gid);
        }
        for (user, groups) in &self.editors {
            service = service.with_editor(*user, groups.iter().copied());
        }
        for user in &self.administrators {
            service = service.with_administrator(*user);
        }
        service
    }

    /// Replaces the accounts with the current contents of `store`.
    pub fn with_users_from(mut self, store: &InMemoryUserStore) -> Self {
        self.users = store.snapshot();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups::GroupService;

    fn directory() -> UserDirectory {
        UserDirectory {
            default_group: Some(GroupId::new(2)),
            groups: vec![
                Group::new(GroupId::new(1), "Webmasters"),
                Group::new(GroupId::new(2), "Users"),
            ],
            users: vec![StoredUser::new(1, "admin", "admin@example.com").with_groups([GroupId::new(1)])],
            editors: BTreeMap::from([(5, BTreeSet::from([GroupId::new(2)]))]),
            administrators: BTreeSet::from([1]),
        }
    }

    #[test]
    fn test_missing_file_is_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = UserDirectory::load(dir.path().join("users.json")).unwrap();
        assert_eq!(loaded, UserDirectory::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("users.json");

        let directory = directory();
        directory.save(&path).unwrap();
        assert_eq!(UserDirectory::load(&path).unwrap(), directory);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(UserDirectory::load(&path), Err(DirectoryError::Json(_))));
    }

    #[tokio::test]
    async fn test_group_service_carries_rights() {
        let groups = directory().group_service();

        assert_eq!(groups.default_group_id().await.unwrap(), GroupId::new(2));
        assert_eq!(
            groups.list_editable_groups(5).await.unwrap(),
            BTreeSet::from([GroupId::new(2)])
        );
        assert_eq!(groups.list_editable_groups(1).await.unwrap().len(), 2);
    }

    #[test]
    fn test_user_store_round_trip() {
        let directory = directory();
        let store = directory.user_store();
        store.insert(StoredUser::new(2, "bob", "bob@example.com"));

        let updated = directory.with_users_from(&store);
        assert_eq!(updated.users.len(), 2);
        assert_eq!(updated.users[1].uname, "bob");
    }
}
