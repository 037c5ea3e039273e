//! Import users command.

use std::path::Path;

use anyhow::Result;
use tracing::{info, instrument};
use useradmin_services::config::ImportSettings;
use useradmin_services::import::{CsvUserImportValidator, ImportFile};
use useradmin_services::users::UserId;

use super::{report_rejection, run_check};
use crate::context::Workspace;
use crate::output::Output;

#[instrument(skip_all, name = "import", fields(file = %file.display(), delimiter = delimiter_code, acting_user, admin, dry_run))]
pub async fn run_import(
    settings: &ImportSettings,
    file: &Path,
    directory: &Path,
    delimiter_code: u8,
    acting_user: UserId,
    admin: bool,
    dry_run: bool,
) -> Result<bool> {
    if dry_run {
        return run_check(settings, file, directory, delimiter_code, acting_user, admin).await;
    }

    let out = Output::new();
    let workspace = Workspace::load(directory)?;
    let context = workspace.import_context(settings, acting_user, admin).await?;
    let validator = CsvUserImportValidator::new(workspace.store.clone());

    let report = validator
        .import(&ImportFile::from_path(file), delimiter_code, &context)
        .await;

    let Some(created) = report.created() else {
        if let Some(error) = report.error() {
            report_rejection(&out, error);
        }
        return Ok(false);
    };

    let path = workspace.path.clone();
    workspace.save()?;
    info!(created, path = %path.display(), "Directory snapshot updated");

    out.success(report.message());
    out.count("Created", created);
    out.dim(format!("Saved to {}", path.display()));
    Ok(true)
}
