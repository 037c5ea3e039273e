//! Import columns, raw records and the validated batch.

use crate::users::NewUser;
use std::collections::HashSet;
use std::fmt::Display;

/// A column the import file may declare in its first line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportField {
    Uname,
    Pass,
    Email,
    Activated,
    Sendmail,
    Groups,
}

impl ImportField {
    pub const ALL: [Self; 6] = [
        Self::Uname,
        Self::Pass,
        Self::Email,
        Self::Activated,
        Self::Sendmail,
        Self::Groups,
    ];

    /// Matches a header cell, ignoring surrounding whitespace and case.
    pub fn parse(raw: &str) -> Option<Self> {
        let name = raw.trim().to_lowercase();
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uname => "uname",
            Self::Pass => "pass",
            Self::Email => "email",
            Self::Activated => "activated",
            Self::Sendmail => "sendmail",
            Self::Groups => "groups",
        }
    }
}

impl Display for ImportField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One data line keyed by the header's columns.
///
/// Holds exactly the header's columns, in header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord<'a> {
    values: Vec<(ImportField, &'a str)>,
}

impl<'a> ImportRecord<'a> {
    /// Pairs header columns with the fields of one line, position by position.
    pub fn zip(header: &[ImportField], fields: &[&'a str]) -> Self {
        Self {
            values: header.iter().copied().zip(fields.iter().copied()).collect(),
        }
    }

    /// The raw value of a column; `None` when the header does not declare it.
    /// A column declared twice yields its first value.
    pub fn get(&self, field: ImportField) -> Option<&'a str> {
        self.values
            .iter()
            .find(|(column, _)| *column == field)
            .map(|(_, value)| *value)
    }

    pub fn fields(&self) -> impl Iterator<Item = ImportField> + '_ {
        self.values.iter().map(|(field, _)| *field)
    }
}

/// Accounts that passed every check, handed to the store in one piece.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedImportBatch {
    users: Vec<NewUser>,
}

impl ValidatedImportBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, user: NewUser) {
        self.users.push(user);
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NewUser> {
        self.users.iter()
    }

    pub fn usernames(&self) -> HashSet<String> {
        self.users.iter().map(|user| user.uname.clone()).collect()
    }

    pub fn emails(&self) -> HashSet<String> {
        self.users.iter().map(|user| user.email.clone()).collect()
    }

    pub fn into_users(self) -> Vec<NewUser> {
        self.users
    }
}

impl From<Vec<NewUser>> for ValidatedImportBatch {
    fn from(users: Vec<NewUser>) -> Self {
        Self { users }
    }
}

impl<'a> IntoIterator for &'a ValidatedImportBatch {
    type Item = &'a NewUser;
    type IntoIter = std::slice::Iter<'a, NewUser>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
