//! Validate an import file without creating accounts.

use std::path::Path;

use anyhow::Result;
use tracing::instrument;
use useradmin_services::config::ImportSettings;
use useradmin_services::import::{CsvUserImportValidator, Delimiter, ImportError, ImportFile};
use useradmin_services::users::UserId;

use super::report_rejection;
use crate::context::Workspace;
use crate::output::Output;

#[instrument(skip_all, name = "check", fields(file = %file.display(), delimiter = delimiter_code, acting_user, admin))]
pub async fn run_check(
    settings: &ImportSettings,
    file: &Path,
    directory: &Path,
    delimiter_code: u8,
    acting_user: UserId,
    admin: bool,
) -> Result<bool> {
    let out = Output::new();

    let Some(delimiter) = Delimiter::from_import_code(delimiter_code) else {
        report_rejection(&out, &ImportError::InvalidDelimiter(delimiter_code));
        return Ok(false);
    };

    let workspace = Workspace::load(directory)?;
    let context = workspace.import_context(settings, acting_user, admin).await?;
    let validator = CsvUserImportValidator::new(workspace.store.clone());

    match validator
        .dry_run(&ImportFile::from_path(file), delimiter, &context)
        .await
    {
        Ok(rows) => {
            out.success("The import file is valid.");
            out.count("Would create", rows);
            Ok(true)
        }
        Err(error) => {
            report_rejection(&out, &error);
            Ok(false)
        }
    }
}
