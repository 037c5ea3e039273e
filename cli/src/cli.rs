use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "useradmin")]
#[command(about = "Import and export user accounts as CSV", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose debug output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the accounts listed in a CSV file
    Import {
        /// CSV file to import
        file: PathBuf,

        /// User directory snapshot (JSON)
        #[arg(long, short = 'd', env = "USERADMIN_DIRECTORY", default_value = "users.json")]
        directory: PathBuf,

        /// Field delimiter: 1 comma, 2 semicolon, 3 colon
        #[arg(long, default_value = "1")]
        delimiter: u8,

        /// User id the import runs as
        #[arg(long, default_value = "1")]
        acting_user: u64,

        /// Run as an administrator (reserved usernames allowed)
        #[arg(long)]
        admin: bool,

        /// Validate only, create nothing
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a CSV file without creating accounts
    Check {
        /// CSV file to validate
        file: PathBuf,

        /// User directory snapshot (JSON)
        #[arg(long, short = 'd', env = "USERADMIN_DIRECTORY", default_value = "users.json")]
        directory: PathBuf,

        /// Field delimiter: 1 comma, 2 semicolon, 3 colon
        #[arg(long, default_value = "1")]
        delimiter: u8,

        /// User id the check runs as
        #[arg(long, default_value = "1")]
        acting_user: u64,

        /// Run as an administrator (reserved usernames allowed)
        #[arg(long)]
        admin: bool,
    },
    /// Write the accounts of the directory as CSV
    Export {
        /// User directory snapshot (JSON)
        #[arg(long, short = 'd', env = "USERADMIN_DIRECTORY", default_value = "users.json")]
        directory: PathBuf,

        /// Output file; `.csv` is appended when missing. Prints to stdout when omitted
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Field delimiter: 1 comma, 2 semicolon, 3 colon, 4 tab
        #[arg(long, default_value = "1")]
        delimiter: u8,

        /// Include the email column
        #[arg(long)]
        email: bool,

        /// Start with a row of column titles
        #[arg(long)]
        titles: bool,

        /// Include the last login column
        #[arg(long)]
        last_login: bool,

        /// Include the registration date column
        #[arg(long)]
        reg_date: bool,

        /// Include the group names column
        #[arg(long)]
        groups: bool,
    },
}
