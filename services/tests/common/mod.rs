//! Shared test utilities for integration tests.
//!
//! This module provides common fixtures:
//! - a group service with a default and an editable group
//! - an import context for a non-admin editor
//! - helpers building CSV uploads from lines

use useradmin_services::{
    groups::{Group, GroupId, InMemoryGroupService},
    import::{ImportContext, ImportFile},
    users::InMemoryUserStore,
};

/// The acting user of the fixtures.
pub const EDITOR_ID: u64 = 3;

/// Default group of the fixtures.
pub const DEFAULT_GROUP: GroupId = GroupId::new(5);

/// A second group the editor may assign.
pub const STAFF_GROUP: GroupId = GroupId::new(6);

/// A group the editor may not assign.
#[allow(dead_code)]
pub const ADMIN_GROUP: GroupId = GroupId::new(1);

/// Header with every column.
pub const FULL_HEADER: &str = "uname,pass,email,activated,sendmail,groups";

/// Groups 1, 5 and 6, default 5, editor 3 may assign 5 and 6.
pub fn group_service() -> InMemoryGroupService {
    InMemoryGroupService::new()
        .with_group(Group::new(ADMIN_GROUP, "Webmasters"))
        .with_group(Group::new(DEFAULT_GROUP, "Users"))
        .with_group(Group::new(STAFF_GROUP, "Staff"))
        .with_default_group(DEFAULT_GROUP)
        .with_editor(EDITOR_ID, [DEFAULT_GROUP, STAFF_GROUP])
}

/// Context of the fixture editor with default rules.
pub fn editor_context() -> ImportContext {
    ImportContext::new(DEFAULT_GROUP).with_editable_groups([DEFAULT_GROUP, STAFF_GROUP])
}

/// An upload named `users.csv` made of `lines` joined by `\n`.
pub fn csv_file(lines: &[&str]) -> ImportFile {
    ImportFile::new("users.csv", lines.join("\n"))
}

/// A valid data line for `uname`.
pub fn valid_line(uname: &str) -> String {
    format!("{uname},secret123,{uname}@example.com,1,0,")
}

/// A store holding `bob` and `carol`.
#[allow(dead_code)]
pub fn populated_store() -> InMemoryUserStore {
    InMemoryUserStore::with_accounts([
        ("bob", "bob@example.com"),
        ("carol", "carol@example.com"),
    ])
}
