//! Per-request import context.
//!
//! Settings and the acting user's group rights are resolved once per request
//! into an [`ImportContext`]; the validator only reads it.

use crate::config::ImportSettings;
use crate::groups::{GroupId, GroupService};
use crate::users::UserId;
use regex::{Regex, RegexBuilder};
use std::collections::BTreeSet;

/// Minimum password length when nothing else is configured.
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 5;

/// Reserved username patterns, compiled into one case-insensitive
/// alternation anchored at the start of the name.
#[derive(Debug, Clone, Default)]
pub struct IllegalUsernames {
    pattern: Option<Regex>,
}

impl IllegalUsernames {
    /// No reserved names.
    pub fn none() -> Self {
        Self::default()
    }

    /// Compiles a space-separated list such as `"root admin webmaster"`.
    ///
    /// Entries are patterns, so `adm.n` reserves both `admin` and `admon`.
    /// A blank list reserves nothing.
    pub fn compile(list: &str) -> Result<Self, regex::Error> {
        let alternatives: Vec<String> = list
            .split_whitespace()
            .map(|entry| format!("(?:{entry})"))
            .collect();

        if alternatives.is_empty() {
            return Ok(Self::none());
        }

        let pattern = RegexBuilder::new(&format!("^(?:{})", alternatives.join("|")))
            .case_insensitive(true)
            .build()?;

        Ok(Self {
            pattern: Some(pattern),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.pattern.is_some()
    }

    pub fn is_reserved(&self, uname: &str) -> bool {
        self.pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(uname))
    }
}

/// Everything the validator needs to know about the request.
#[derive(Debug, Clone)]
pub struct ImportContext {
    min_password_length: usize,
    default_group_id: GroupId,
    illegal_usernames: IllegalUsernames,
    email_must_be_unique: bool,
    editable_group_ids: BTreeSet<GroupId>,
    is_admin: bool,
}

impl ImportContext {
    /// A context with default rules: minimum password length of 5, unique
    /// emails, no reserved names, no editable groups, non-admin.
    pub fn new(default_group_id: GroupId) -> Self {
        Self {
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
            default_group_id,
            illegal_usernames: IllegalUsernames::none(),
            email_must_be_unique: true,
            editable_group_ids: BTreeSet::new(),
            is_admin: false,
        }
    }

    /// Resolves the context for `acting_user` from settings and the group
    /// service.
    pub async fn resolve<G: GroupService>(
        settings: &ImportSettings,
        groups: &G,
        acting_user: UserId,
        is_admin: bool,
    ) -> Result<Self, G::Error> {
        let default_group_id = groups.default_group_id().await?;
        let editable = groups.list_editable_groups(acting_user).await?;

        tracing::debug!(
            acting_user,
            is_admin,
            default_group = %default_group_id,
            editable_groups = editable.len(),
            "Resolved import context"
        );

        Ok(Self::new(default_group_id)
            .with_min_password_length(settings.min_password_length())
            .with_illegal_usernames(settings.illegal_usernames().clone())
            .with_unique_email(settings.unique_email())
            .with_editable_groups(editable)
            .as_admin(is_admin))
    }

    pub fn with_min_password_length(mut self, length: usize) -> Self {
        self.min_password_length = length;
        self
    }

    pub fn with_illegal_usernames(mut self, illegal: IllegalUsernames) -> Self {
        self.illegal_usernames = illegal;
        self
    }

    pub fn with_unique_email(mut self, unique: bool) -> Self {
        self.email_must_be_unique = unique;
        self
    }

    pub fn with_editable_groups(mut self, groups: impl IntoIterator<Item = GroupId>) -> Self {
        self.editable_group_ids = groups.into_iter().collect();
        self
    }

    pub fn as_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    pub fn min_password_length(&self) -> usize {
        self.min_password_length
    }

    pub fn default_group_id(&self) -> GroupId {
        self.default_group_id
    }

    pub fn illegal_usernames(&self) -> &IllegalUsernames {
        &self.illegal_usernames
    }

    pub fn email_must_be_unique(&self) -> bool {
        self.email_must_be_unique
    }

    pub fn can_edit_group(&self, gid: GroupId) -> bool {
        self.editable_group_ids.contains(&gid)
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups::{Group, InMemoryGroupService};

    #[test]
    fn test_illegal_usernames_match_prefix_case_insensitively() {
        let illegal = IllegalUsernames::compile("root admin webmaster").unwrap();
        assert!(illegal.is_configured());
        assert!(illegal.is_reserved("root"));
        assert!(illegal.is_reserved("ADMIN"));
        assert!(illegal.is_reserved("webmaster2"));
        assert!(!illegal.is_reserved("alice"));
        assert!(!illegal.is_reserved("myroot"));
    }

    #[test]
    fn test_blank_list_reserves_nothing() {
        let illegal = IllegalUsernames::compile("   ").unwrap();
        assert!(!illegal.is_configured());
        assert!(!illegal.is_reserved("root"));
    }

    #[test]
    fn test_extra_spaces_do_not_reserve_everything() {
        let illegal = IllegalUsernames::compile("root  admin ").unwrap();
        assert!(!illegal.is_reserved("alice"));
    }

    #[test]
    fn test_invalid_entry_is_an_error() {
        assert!(IllegalUsernames::compile("root (admin").is_err());
    }

    #[tokio::test]
    async fn test_resolve_from_group_service() {
        let groups = InMemoryGroupService::new()
            .with_group(Group::new(GroupId::new(1), "Users"))
            .with_group(Group::new(GroupId::new(5), "Editors"))
            .with_default_group(GroupId::new(1))
            .with_editor(3, [GroupId::new(5)]);
        let settings = ImportSettings::new_for_test();

        let context = ImportContext::resolve(&settings, &groups, 3, false)
            .await
            .unwrap();

        assert_eq!(context.default_group_id(), GroupId::new(1));
        assert!(context.can_edit_group(GroupId::new(5)));
        assert!(!context.can_edit_group(GroupId::new(1)));
        assert_eq!(context.min_password_length(), settings.min_password_length());
        assert!(!context.is_admin());
    }
}
