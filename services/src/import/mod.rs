//! CSV user import.
//!
//! An upload is checked line by line against the account rules of the
//! acting user's [`ImportContext`], then against the existing accounts.
//! Either every line becomes an account or none does.
//!
//! ```rust,ignore
//! use useradmin_services::import::{CsvUserImportValidator, Delimiter, ImportContext, ImportFile};
//!
//! let validator = CsvUserImportValidator::new(store);
//! let created = validator
//!     .validate(&ImportFile::from_path("users.csv"), Delimiter::Comma, &context)
//!     .await?;
//! ```

mod context;
mod delimiter;
mod error;
mod file;
mod record;
mod validator;

pub use context::{DEFAULT_MIN_PASSWORD_LENGTH, IllegalUsernames, ImportContext};
pub use delimiter::Delimiter;
pub use error::{ErrorKind, ImportError, ValidationOutcome};
pub use file::ImportFile;
pub use record::{ImportField, ImportRecord, ValidatedImportBatch};
pub use validator::{CsvUserImportValidator, IMPORT_SUCCESS_MESSAGE, ImportReport, MAX_USERNAME_LENGTH};
