//! Command implementations for the useradmin CLI.
//!
//! Each subcommand is implemented in its own module. Commands return
//! `Ok(false)` when the request was rejected and the reason was already
//! printed.

pub mod check;
pub mod export;
pub mod import;

pub use check::run_check;
pub use export::run_export;
pub use import::run_import;

use crate::output::Output;
use useradmin_services::import::ImportError;

/// Prints an import rejection with its line when it has one.
fn report_rejection(out: &Output, error: &ImportError) {
    out.error(error);
    if let Some(line) = error.line() {
        out.labeled_indent("Line", line, 2);
    }
}
