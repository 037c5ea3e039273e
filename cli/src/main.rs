mod cli;
mod commands;
mod context;
mod output;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser as _;
use tracing::info;
use useradmin_services::config::ImportSettings;
use useradmin_services::export::ExportOptions;
use useradmin_services::telemetry;

use crate::cli::{Cli, Commands};
use crate::commands::{run_check, run_export, run_import};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load settings, then tracing for their environment
    let settings = ImportSettings::init()?;
    telemetry::init_tracing(settings.environment(), cli.verbose)?;
    info!(
        environment = %settings.environment(),
        min_password_length = settings.min_password_length(),
        reserved_usernames = settings.illegal_usernames().is_configured(),
        unique_email = settings.unique_email(),
        "Settings loaded"
    );

    let ok = match cli.command {
        Commands::Import {
            file,
            directory,
            delimiter,
            acting_user,
            admin,
            dry_run,
        } => {
            run_import(
                &settings,
                &file,
                &directory,
                delimiter,
                acting_user,
                admin,
                dry_run,
            )
            .await?
        }
        Commands::Check {
            file,
            directory,
            delimiter,
            acting_user,
            admin,
        } => run_check(&settings, &file, &directory, delimiter, acting_user, admin).await?,
        Commands::Export {
            directory,
            output,
            delimiter,
            email,
            titles,
            last_login,
            reg_date,
            groups,
        } => {
            let options = ExportOptions {
                email,
                titles,
                last_login,
                reg_date,
                groups,
                ..ExportOptions::default()
            };
            run_export(&directory, output.as_deref(), delimiter, options).await?
        }
    };

    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
