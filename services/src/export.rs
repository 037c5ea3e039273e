//! CSV user export.
//!
//! Writes one line per account with `id` and `uname` always present and
//! the remaining columns chosen on the export form.

use crate::groups::{Group, GroupId, GroupService};
use crate::import::Delimiter;
use crate::users::{StoredUser, UserStore};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashMap;
use std::io;

/// File name offered when the form leaves it blank.
pub const DEFAULT_EXPORT_FILE_NAME: &str = "users.csv";

/// Error type for export operations.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to list users: {0}")]
    Users(String),

    #[error("Failed to list groups: {0}")]
    Groups(String),
}

/// Choices of the export form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub file_name: String,
    pub delimiter: Delimiter,
    pub email: bool,
    pub titles: bool,
    pub last_login: bool,
    pub reg_date: bool,
    pub groups: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_EXPORT_FILE_NAME.to_owned(),
            delimiter: Delimiter::Comma,
            email: false,
            titles: false,
            last_login: false,
            reg_date: false,
            groups: false,
        }
    }
}

impl ExportOptions {
    /// The download name, always ending in `.csv`.
    pub fn normalized_file_name(&self) -> String {
        let name = self.file_name.trim();
        if name.is_empty() {
            DEFAULT_EXPORT_FILE_NAME.to_owned()
        } else if name.ends_with(".csv") {
            name.to_owned()
        } else {
            format!("{name}.csv")
        }
    }
}

pub struct UserExporter {
    options: ExportOptions,
}

impl UserExporter {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Column titles in output order.
    pub fn title_row(&self) -> Vec<&'static str> {
        let mut row = vec!["id", "uname"];
        if self.options.email {
            row.push("email");
        }
        if self.options.reg_date {
            row.push("user_regdate");
        }
        if self.options.last_login {
            row.push("lastlogin");
        }
        if self.options.groups {
            row.push("groups");
        }
        row
    }

    /// The fields of one account. Group ids without a known group are left out.
    pub fn data_row(&self, user: &StoredUser, group_names: &HashMap<GroupId, &str>) -> Vec<String> {
        let mut row = vec![user.uid.to_string(), user.uname.clone()];
        if self.options.email {
            row.push(user.email.clone());
        }
        if self.options.reg_date {
            row.push(format_date(&user.user_regdate));
        }
        if self.options.last_login {
            row.push(user.lastlogin.as_ref().map(format_date).unwrap_or_default());
        }
        if self.options.groups {
            let names: Vec<&str> = user
                .groups
                .iter()
                .filter_map(|gid| group_names.get(gid).copied())
                .collect();
            row.push(names.join("|"));
        }
        row
    }

    /// Writes `users` in the given order and returns how many were written.
    pub fn write<W: io::Write>(&self, writer: W, users: &[StoredUser], groups: &[Group]) -> Result<usize, ExportError> {
        let group_names: HashMap<GroupId, &str> = groups
            .iter()
            .map(|group| (group.gid, group.name.as_str()))
            .collect();

        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(self.options.delimiter.as_byte())
            .has_headers(false)
            .from_writer(writer);

        if self.options.titles {
            csv_writer.write_record(self.title_row())?;
        }

        for user in users {
            csv_writer.write_record(self.data_row(user, &group_names))?;
        }

        csv_writer.flush()?;
        Ok(users.len())
    }

    /// Exports every account of `store`, ordered by uid.
    pub async fn export<S, G, W>(&self, store: &S, groups: &G, writer: W) -> Result<usize, ExportError>
    where
        S: UserStore,
        G: GroupService,
        W: io::Write,
    {
        let mut users = store
            .list_users()
            .await
            .map_err(|e| ExportError::Users(e.to_string()))?;
        users.sort_by_key(|user| user.uid);

        let groups = if self.options.groups {
            groups
                .list_groups()
                .await
                .map_err(|e| ExportError::Groups(e.to_string()))?
        } else {
            Vec::new()
        };

        let written = self.write(writer, &users, &groups)?;
        tracing::info!(
            users = written,
            file = %self.options.normalized_file_name(),
            "Users exported"
        );
        Ok(written)
    }
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn user() -> StoredUser {
        let mut user = StoredUser::new(7, "alice", "alice@example.com")
            .with_groups([GroupId::new(1), GroupId::new(9), GroupId::new(2)]);
        user.user_regdate = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        user
    }

    fn groups() -> Vec<Group> {
        vec![
            Group::new(GroupId::new(1), "Users"),
            Group::new(GroupId::new(2), "Editors"),
        ]
    }

    #[test]
    fn test_file_name_gets_csv_extension() {
        let mut options = ExportOptions::default();
        assert_eq!(options.normalized_file_name(), "users.csv");

        options.file_name = "members".to_owned();
        assert_eq!(options.normalized_file_name(), "members.csv");

        options.file_name = "members.csv".to_owned();
        assert_eq!(options.normalized_file_name(), "members.csv");

        options.file_name = "  ".to_owned();
        assert_eq!(options.normalized_file_name(), "users.csv");
    }

    #[test]
    fn test_minimal_export() {
        let exporter = UserExporter::new(ExportOptions::default());
        let mut out = Vec::new();

        assert_eq!(exporter.write(&mut out, &[user()], &groups()).unwrap(), 1);
        assert_eq!(String::from_utf8(out).unwrap(), "7,alice\n");
    }

    #[test]
    fn test_full_export_with_titles() {
        let exporter = UserExporter::new(ExportOptions {
            delimiter: Delimiter::Semicolon,
            email: true,
            titles: true,
            last_login: true,
            reg_date: true,
            groups: true,
            ..ExportOptions::default()
        });
        let mut out = Vec::new();
        exporter.write(&mut out, &[user()], &groups()).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "id;uname;email;user_regdate;lastlogin;groups\n\
             7;alice;alice@example.com;2024-03-01T12:00:00Z;;Users|Editors\n"
        );
    }

    #[test]
    fn test_fields_containing_the_delimiter_are_quoted() {
        let exporter = UserExporter::new(ExportOptions {
            groups: true,
            ..ExportOptions::default()
        });
        let groups = vec![Group::new(GroupId::new(1), "Users, all")];
        let mut out = Vec::new();
        exporter.write(&mut out, &[user()], &groups).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "7,alice,\"Users, all\"\n");
    }
}
