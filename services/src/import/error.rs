//! Import failures.
//!
//! Every variant renders as a sentence the admin page can flash back to the
//! user. The first failure aborts the whole import.

use thiserror::Error;

/// Category of an [`ImportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing, wrongly typed or unreadable upload.
    File,
    /// Bad header or malformed line.
    Structural,
    /// A field of one line failed its rule.
    Field,
    /// Duplicate within the file or against existing accounts.
    Uniqueness,
    /// The store refused the batch.
    Creation,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("Error! The delimiter code {0} is not valid. Use 1 (comma), 2 (semicolon) or 3 (colon).")]
    InvalidDelimiter(u8),

    #[error("Error! You have not chosen any file.")]
    EmptyFile,

    #[error("Error! The file extension is incorrect. The only allowed extension is csv.")]
    WrongExtension,

    #[error("Error! It has not been possible to read the import file.")]
    UnreadableFile,

    #[error(
        "Error! The import file does not have the expected field {0} in the first row. Please check your import file."
    )]
    UnexpectedField(String),

    #[error(
        "Error! The number of parameters in line {0} is not correct. Please check your import file."
    )]
    FieldCountMismatch(usize),

    #[error(
        "Sorry! The user name is not valid in line {0}. The user name is mandatory and the maximum length is 25 characters. Please check your import file."
    )]
    InvalidUsername(usize),

    #[error(
        "Sorry! The user name {uname} is reserved and cannot be registered in line {line}. Please check your import file."
    )]
    ReservedUsername { uname: String, line: usize },

    #[error(
        "Sorry! The user name {uname} cannot contain spaces or invalid characters in line {line}. Please check your import file."
    )]
    InvalidUsernameFormat { uname: String, line: usize },

    #[error(
        "Sorry! The user name {uname} is repeated in line {line}, and it cannot be used twice for creating accounts. Please check your import file."
    )]
    DuplicateUsernameInFile { uname: String, line: usize },

    #[error("Sorry! You did not provide a password in line {0}. Please check your import file.")]
    MissingPassword(usize),

    #[error(
        "Sorry! The password must be at least {min_length} characters long in line {line}. Please check your import file."
    )]
    PasswordTooShort { min_length: usize, line: usize },

    #[error("Sorry! You did not provide a email in line {0}. Please check your import file.")]
    MissingEmail(usize),

    #[error(
        "Sorry! The e-mail address you entered was incorrectly formatted or is unacceptable for other reasons in line {0}. Please check your import file."
    )]
    InvalidEmailFormat(usize),

    #[error(
        "Sorry! The {email} e-mail address is repeated in line {line}, and it cannot be used twice for creating accounts. Please check your import file."
    )]
    DuplicateEmailInFile { email: String, line: usize },

    #[error("Error! The CSV is not valid: the \"activated\" column must contain 0 or 1 only.")]
    InvalidActivatedFlag,

    #[error("Error! The CSV is not valid: the \"sendmail\" column must contain 0 or 1 only.")]
    InvalidSendmailFlag,

    #[error(
        "Sorry! The identity of the group {group} is not valid in line {line}. Perhaps it does not exist. Please check your import file."
    )]
    UnknownOrUnauthorizedGroup { group: String, line: usize },

    #[error("Error! The import file does not have values.")]
    EmptyImport,

    #[error("Error! Trying to read the existing user names in database.")]
    UsernameLookupFailed(String),

    #[error("Sorry! One or more user names really exist in database. The user names must be uniques.")]
    UsernamesAlreadyExist,

    #[error("Error! Trying to read the existing users' email addresses in database.")]
    EmailLookupFailed(String),

    #[error(
        "Sorry! One or more users' email addresses exist in the database. Each user's e-mail address must be unique."
    )]
    EmailsAlreadyExist,

    #[error("Error! The creation of users has failed.")]
    CreationFailed,
}

impl ImportError {
    /// The 1-based file line the error refers to, if it is tied to one.
    ///
    /// The `activated` and `sendmail` flag errors apply to the file as a
    /// whole and carry no line.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::FieldCountMismatch(line)
            | Self::InvalidUsername(line)
            | Self::MissingPassword(line)
            | Self::MissingEmail(line)
            | Self::InvalidEmailFormat(line)
            | Self::ReservedUsername { line, .. }
            | Self::InvalidUsernameFormat { line, .. }
            | Self::DuplicateUsernameInFile { line, .. }
            | Self::PasswordTooShort { line, .. }
            | Self::DuplicateEmailInFile { line, .. }
            | Self::UnknownOrUnauthorizedGroup { line, .. } => Some(*line),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDelimiter(_)
            | Self::EmptyFile
            | Self::WrongExtension
            | Self::UnreadableFile => ErrorKind::File,
            Self::UnexpectedField(_) | Self::FieldCountMismatch(_) | Self::EmptyImport => {
                ErrorKind::Structural
            }
            Self::InvalidUsername(_)
            | Self::ReservedUsername { .. }
            | Self::InvalidUsernameFormat { .. }
            | Self::MissingPassword(_)
            | Self::PasswordTooShort { .. }
            | Self::MissingEmail(_)
            | Self::InvalidEmailFormat(_)
            | Self::InvalidActivatedFlag
            | Self::InvalidSendmailFlag
            | Self::UnknownOrUnauthorizedGroup { .. } => ErrorKind::Field,
            Self::DuplicateUsernameInFile { .. }
            | Self::DuplicateEmailInFile { .. }
            | Self::UsernameLookupFailed(_)
            | Self::UsernamesAlreadyExist
            | Self::EmailLookupFailed(_)
            | Self::EmailsAlreadyExist => ErrorKind::Uniqueness,
            Self::CreationFailed => ErrorKind::Creation,
        }
    }
}

/// Number of accounts created, or the reason nothing was created.
pub type ValidationOutcome = Result<usize, ImportError>;
