//! Export users command.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use tracing::instrument;
use useradmin_services::export::{ExportOptions, UserExporter};
use useradmin_services::import::Delimiter;

use crate::context::Workspace;
use crate::output::Output;

/// Resolves the delimiter code and, for file output, the final file path.
fn prepare(
    mut options: ExportOptions,
    delimiter_code: u8,
    output: Option<&Path>,
) -> Result<(ExportOptions, Option<PathBuf>)> {
    options.delimiter = Delimiter::from_code(delimiter_code).with_context(|| {
        format!("Invalid delimiter code {delimiter_code}: use 1 (comma), 2 (semicolon), 3 (colon) or 4 (tab)")
    })?;

    let target = output.map(|path| {
        if let Some(name) = path.file_name() {
            options.file_name = name.to_string_lossy().into_owned();
        }
        path.with_file_name(options.normalized_file_name())
    });

    Ok((options, target))
}

#[instrument(skip_all, name = "export", fields(directory = %directory.display(), delimiter = delimiter_code))]
pub async fn run_export(
    directory: &Path,
    output: Option<&Path>,
    delimiter_code: u8,
    options: ExportOptions,
) -> Result<bool> {
    let (options, target) = prepare(options, delimiter_code, output)?;
    let workspace = Workspace::load(directory)?;
    let exporter = UserExporter::new(options);

    match target {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let written = exporter
                .export(&workspace.store, &workspace.groups, BufWriter::new(file))
                .await
                .context("Failed to export users")?;

            let out = Output::new();
            out.success(format!("Exported to {}", path.display()));
            out.count("Exported", written);
        }
        None => {
            let written = exporter
                .export(&workspace.store, &workspace.groups, std::io::stdout())
                .await
                .context("Failed to export users")?;
            Output::stderr().count("Exported", written);
        }
    }

    Ok(true)
}
