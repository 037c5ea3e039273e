//! CSV user import validator.
//!
//! Validation runs in two phases. The structural and per-line phase stops at
//! the first bad line. The global phase then checks the collected usernames
//! and emails against the store. Nothing is created unless both phases pass,
//! and creation is a single call handing over the whole batch.

use super::context::ImportContext;
use super::delimiter::Delimiter;
use super::error::{ImportError, ValidationOutcome};
use super::file::ImportFile;
use super::record::{ImportField, ImportRecord, ValidatedImportBatch};
use crate::groups::GroupId;
use crate::users::{Activation, NewUser, UserStore};
use crate::validation::{FormatValidator, StandardFormatValidator};
use std::collections::HashSet;

/// Longest accepted username, in characters.
pub const MAX_USERNAME_LENGTH: usize = 25;

/// Status message shown after a successful import.
pub const IMPORT_SUCCESS_MESSAGE: &str = "Done! Users imported successfully.";

/// Separator between group ids in the `groups` column.
const GROUP_SEPARATOR: char = '|';

/// Validates CSV uploads and creates the accounts they describe.
///
/// Holds only its collaborators, so repeated calls with the same input and an
/// unchanged store yield the same outcome.
#[derive(Clone)]
pub struct CsvUserImportValidator<S, F = StandardFormatValidator> {
    store: S,
    formats: F,
}

impl<S: UserStore> CsvUserImportValidator<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            formats: StandardFormatValidator,
        }
    }
}

impl<S, F> CsvUserImportValidator<S, F>
where
    S: UserStore,
    F: FormatValidator,
{
    /// Replaces the username and email format checks.
    pub fn with_format_validator<G: FormatValidator>(self, formats: G) -> CsvUserImportValidator<S, G> {
        CsvUserImportValidator {
            store: self.store,
            formats,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validates `file` and, if every check passes, creates all its accounts.
    ///
    /// Returns the number of created accounts.
    pub async fn validate(
        &self,
        file: &ImportFile,
        delimiter: Delimiter,
        context: &ImportContext,
    ) -> ValidationOutcome {
        tracing::info!(
            file = file.original_name(),
            delimiter = %delimiter.as_char().escape_default(),
            "Validating user import"
        );

        let result = self.validate_and_create(file, delimiter, context).await;
        match &result {
            Ok(created) => tracing::info!(created, "Users imported"),
            Err(error) => tracing::warn!(
                error = %error,
                line = error.line(),
                "User import rejected"
            ),
        }
        result
    }

    /// Runs every check without creating anything.
    ///
    /// Returns the number of accounts a real import would create.
    pub async fn dry_run(
        &self,
        file: &ImportFile,
        delimiter: Delimiter,
        context: &ImportContext,
    ) -> ValidationOutcome {
        let batch = self.parse_batch(file, delimiter, context)?;
        self.check_store(&batch, context).await?;
        tracing::info!(rows = batch.len(), "Dry run passed");
        Ok(batch.len())
    }

    /// Entry point of the import form: resolves the delimiter code, then
    /// validates and creates.
    pub async fn import(&self, file: &ImportFile, delimiter_code: u8, context: &ImportContext) -> ImportReport {
        let outcome = match Delimiter::from_import_code(delimiter_code) {
            Some(delimiter) => self.validate(file, delimiter, context).await,
            None => {
                tracing::warn!(delimiter_code, "Invalid import delimiter");
                Err(ImportError::InvalidDelimiter(delimiter_code))
            }
        };
        ImportReport { outcome }
    }

    /// Structural and per-line phase.
    ///
    /// Reads the file once and returns the normalized batch, or the first
    /// error found. Does not touch the store.
    pub fn parse_batch(
        &self,
        file: &ImportFile,
        delimiter: Delimiter,
        context: &ImportContext,
    ) -> Result<ValidatedImportBatch, ImportError> {
        if !delimiter.is_importable() {
            return Err(ImportError::InvalidDelimiter(delimiter.code()));
        }

        if file.original_name().is_empty() {
            return Err(ImportError::EmptyFile);
        }

        if file.extension() != "csv" {
            return Err(ImportError::WrongExtension);
        }

        let lines = match file.lines() {
            Some(lines) if !lines.is_empty() => lines,
            _ => return Err(ImportError::UnreadableFile),
        };

        let separator = delimiter.as_char();
        let header = parse_header(lines[0], separator)?;
        tracing::debug!(columns = header.len(), "Parsed import header");

        let mut rows = RowValidator::new(context, &self.formats);
        let mut batch = ValidatedImportBatch::new();

        for (index, raw) in lines.iter().enumerate().skip(1) {
            let line = index + 1;
            let cleaned = clean_line(raw);
            if cleaned.is_empty() {
                continue;
            }

            let fields: Vec<&str> = cleaned.split(separator).collect();
            if fields.len() != header.len() {
                return Err(ImportError::FieldCountMismatch(line));
            }

            let record = ImportRecord::zip(&header, &fields);
            batch.push(rows.validate(&record, line)?);
        }

        if batch.is_empty() {
            return Err(ImportError::EmptyImport);
        }

        tracing::debug!(rows = batch.len(), "All import lines are valid");
        Ok(batch)
    }

    /// Global phase: usernames, and emails when they must be unique, may not
    /// belong to existing accounts.
    async fn check_store(&self, batch: &ValidatedImportBatch, context: &ImportContext) -> Result<(), ImportError> {
        let existing = self
            .store
            .existing_usernames(&batch.usernames())
            .await
            .map_err(|e| ImportError::UsernameLookupFailed(e.to_string()))?;
        if !existing.is_empty() {
            tracing::debug!(count = existing.len(), "Usernames already registered");
            return Err(ImportError::UsernamesAlreadyExist);
        }

        if context.email_must_be_unique() {
            let existing = self
                .store
                .existing_emails(&batch.emails())
                .await
                .map_err(|e| ImportError::EmailLookupFailed(e.to_string()))?;
            if !existing.is_empty() {
                tracing::debug!(count = existing.len(), "Emails already registered");
                return Err(ImportError::EmailsAlreadyExist);
            }
        }

        Ok(())
    }

    async fn validate_and_create(
        &self,
        file: &ImportFile,
        delimiter: Delimiter,
        context: &ImportContext,
    ) -> ValidationOutcome {
        let batch = self.parse_batch(file, delimiter, context)?;
        self.check_store(&batch, context).await?;

        let count = batch.len();
        match self.store.create_batch(batch).await {
            Ok(true) => Ok(count),
            Ok(false) => Err(ImportError::CreationFailed),
            Err(e) => {
                tracing::error!(error = %e, "User store failed to create the batch");
                Err(ImportError::CreationFailed)
            }
        }
    }
}

/// Outcome of one import request as the admin page reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    outcome: ValidationOutcome,
}

impl ImportReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn created(&self) -> Option<usize> {
        self.outcome.as_ref().ok().copied()
    }

    pub fn error(&self) -> Option<&ImportError> {
        self.outcome.as_ref().err()
    }

    pub fn outcome(&self) -> &ValidationOutcome {
        &self.outcome
    }

    /// The status message to flash back to the user.
    pub fn message(&self) -> String {
        match &self.outcome {
            Ok(_) => IMPORT_SUCCESS_MESSAGE.to_owned(),
            Err(error) => error.to_string(),
        }
    }
}

impl From<ValidationOutcome> for ImportReport {
    fn from(outcome: ValidationOutcome) -> Self {
        Self { outcome }
    }
}

fn clean_line(raw: &str) -> String {
    raw.replace('"', "").trim().to_owned()
}

fn parse_header(raw: &str, separator: char) -> Result<Vec<ImportField>, ImportError> {
    clean_line(raw)
        .split(separator)
        .map(|cell| ImportField::parse(cell).ok_or_else(|| ImportError::UnexpectedField(cell.trim().to_owned())))
        .collect()
}

/// Per-line rules, plus the usernames and emails seen so far in the file.
struct RowValidator<'a, F> {
    context: &'a ImportContext,
    formats: &'a F,
    seen_unames: HashSet<String>,
    seen_emails: HashSet<String>,
}

impl<'a, F: FormatValidator> RowValidator<'a, F> {
    fn new(context: &'a ImportContext, formats: &'a F) -> Self {
        Self {
            context,
            formats,
            seen_unames: HashSet::new(),
            seen_emails: HashSet::new(),
        }
    }

    fn validate(&mut self, record: &ImportRecord<'_>, line: usize) -> Result<NewUser, ImportError> {
        let value = |field| record.get(field).map(str::trim).unwrap_or_default();

        let uname = self.uname(value(ImportField::Uname), line)?;
        let pass = self.pass(value(ImportField::Pass), line)?;
        let email = self.email(value(ImportField::Email), line)?;
        let activated = activation(record.get(ImportField::Activated).map(str::trim))?;
        let sendmail = sendmail(value(ImportField::Sendmail))?;
        let groups = self.groups(value(ImportField::Groups), line)?;

        Ok(NewUser {
            uname,
            pass,
            email,
            activated,
            sendmail,
            groups,
        })
    }

    fn uname(&mut self, uname: &str, line: usize) -> Result<String, ImportError> {
        if uname.is_empty() || uname.chars().count() > MAX_USERNAME_LENGTH {
            return Err(ImportError::InvalidUsername(line));
        }

        if !self.context.is_admin() && self.context.illegal_usernames().is_reserved(uname) {
            return Err(ImportError::ReservedUsername {
                uname: uname.to_owned(),
                line,
            });
        }

        if uname.chars().any(char::is_whitespace) || !self.formats.is_valid_username(uname) {
            return Err(ImportError::InvalidUsernameFormat {
                uname: uname.to_owned(),
                line,
            });
        }

        if !self.seen_unames.insert(uname.to_owned()) {
            return Err(ImportError::DuplicateUsernameInFile {
                uname: uname.to_owned(),
                line,
            });
        }

        Ok(uname.to_owned())
    }

    fn pass(&self, pass: &str, line: usize) -> Result<String, ImportError> {
        if pass.is_empty() {
            return Err(ImportError::MissingPassword(line));
        }

        let min_length = self.context.min_password_length();
        if pass.chars().count() < min_length {
            return Err(ImportError::PasswordTooShort { min_length, line });
        }

        Ok(pass.to_owned())
    }

    fn email(&mut self, email: &str, line: usize) -> Result<String, ImportError> {
        if email.is_empty() {
            return Err(ImportError::MissingEmail(line));
        }

        if !self.formats.is_valid_email(email) {
            return Err(ImportError::InvalidEmailFormat(line));
        }

        if self.context.email_must_be_unique() && !self.seen_emails.insert(email.to_owned()) {
            return Err(ImportError::DuplicateEmailInFile {
                email: email.to_owned(),
                line,
            });
        }

        Ok(email.to_owned())
    }

    fn groups(&self, raw: &str, line: usize) -> Result<Vec<GroupId>, ImportError> {
        if raw.is_empty() {
            return Ok(vec![self.context.default_group_id()]);
        }

        let mut groups = Vec::new();
        for piece in raw.split(GROUP_SEPARATOR).map(str::trim) {
            let gid = piece
                .parse::<GroupId>()
                .ok()
                .filter(|gid| self.context.can_edit_group(*gid))
                .ok_or_else(|| ImportError::UnknownOrUnauthorizedGroup {
                    group: piece.to_owned(),
                    line,
                })?;

            if !groups.contains(&gid) {
                groups.push(gid);
            }
        }

        Ok(groups)
    }
}

/// An absent column means active; a present but empty cell means inactive.
fn activation(raw: Option<&str>) -> Result<Activation, ImportError> {
    let raw = match raw {
        None => return Ok(Activation::Active),
        Some("") => return Ok(Activation::Inactive),
        Some(raw) => raw,
    };

    raw.parse::<i64>()
        .ok()
        .and_then(Activation::from_code)
        .ok_or(ImportError::InvalidActivatedFlag)
}

fn sendmail(raw: &str) -> Result<bool, ImportError> {
    if raw.is_empty() {
        return Ok(false);
    }

    match raw.parse::<i64>() {
        Ok(0) => Ok(false),
        Ok(1) => Ok(true),
        _ => Err(ImportError::InvalidSendmailFlag),
    }
}
