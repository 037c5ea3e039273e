//! Directory loading and import context resolution shared by the commands.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use tracing::instrument;
use useradmin_services::config::ImportSettings;
use useradmin_services::directory::UserDirectory;
use useradmin_services::groups::InMemoryGroupService;
use useradmin_services::import::ImportContext;
use useradmin_services::users::{InMemoryUserStore, UserId};

/// A loaded directory snapshot with its collaborators.
pub struct Workspace {
    pub path: PathBuf,
    pub directory: UserDirectory,
    pub store: InMemoryUserStore,
    pub groups: InMemoryGroupService,
}

impl Workspace {
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let directory = UserDirectory::load(path)
            .with_context(|| format!("Failed to load user directory {}", path.display()))?;
        let store = directory.user_store();
        let groups = directory.group_service();

        Ok(Self {
            path: path.to_path_buf(),
            directory,
            store,
            groups,
        })
    }

    /// Import rules for `acting_user` from the settings and the directory's
    /// group rights.
    pub async fn import_context(
        &self,
        settings: &ImportSettings,
        acting_user: UserId,
        is_admin: bool,
    ) -> Result<ImportContext> {
        ImportContext::resolve(settings, &self.groups, acting_user, is_admin)
            .await
            .context("Failed to resolve group permissions")
    }

    /// Writes the store's accounts back to the snapshot file.
    pub fn save(self) -> Result<()> {
        let Self {
            path,
            directory,
            store,
            ..
        } = self;

        directory
            .with_users_from(&store)
            .save(&path)
            .with_context(|| format!("Failed to save user directory {}", path.display()))
    }
}
