//! User store trait and the in-memory implementation.
//!
//! The import pipeline never touches persistence directly. It asks a
//! [`UserStore`] which of the candidate usernames and emails are already
//! taken, then hands the complete [`ValidatedImportBatch`] over in a single
//! call. The store must commit that batch atomically or reject all of it.
//!
//! ```rust,ignore
//! use useradmin_services::users::{InMemoryUserStore, UserStore};
//!
//! async fn count_users<S: UserStore>(store: &S) -> usize {
//!     store.list_users().await.map(|users| users.len()).unwrap_or(0)
//! }
//! ```

use crate::groups::GroupId;
use crate::import::ValidatedImportBatch;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::sync::{Arc, RwLock};

/// Identifier of a user account.
pub type UserId = u64;

/// Activation state of an account, stored as an integer flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum Activation {
    Inactive,
    #[default]
    Active,
}

impl Activation {
    /// The integer flag persisted for this state.
    pub const fn code(self) -> i64 {
        match self {
            Self::Inactive => 0,
            Self::Active => 1,
        }
    }

    /// Maps an integer flag back to a state; anything but 0 or 1 is `None`.
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Inactive),
            1 => Some(Self::Active),
            _ => None,
        }
    }
}

impl From<Activation> for i64 {
    fn from(value: Activation) -> Self {
        value.code()
    }
}

impl TryFrom<i64> for Activation {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_code(value).ok_or_else(|| format!("invalid activation flag: {value}"))
    }
}

/// A fully normalized account ready to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub uname: String,
    pub pass: String,
    pub email: String,
    pub activated: Activation,
    /// Whether the new user should receive a welcome email.
    pub sendmail: bool,
    /// Groups the user joins; never empty.
    pub groups: Vec<GroupId>,
}

/// A persisted account as the store reports it back.
///
/// Passwords are not part of this record; hashing and keeping credentials is
/// the concern of the persistent store behind the trait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    pub uid: UserId,
    pub uname: String,
    pub email: String,
    #[serde(default)]
    pub activated: Activation,
    pub user_regdate: DateTime<Utc>,
    #[serde(default)]
    pub lastlogin: Option<DateTime<Utc>>,
    #[serde(default)]
    pub groups: Vec<GroupId>,
}

impl StoredUser {
    /// Creates an active account with the given identity and no groups.
    pub fn new(uid: UserId, uname: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid,
            uname: uname.into(),
            email: email.into(),
            activated: Activation::Active,
            user_regdate: Utc::now(),
            lastlogin: None,
            groups: Vec::new(),
        }
    }

    /// Builds the stored form of a freshly created account.
    pub fn from_new_user(uid: UserId, user: &NewUser, registered_at: DateTime<Utc>) -> Self {
        Self {
            uid,
            uname: user.uname.clone(),
            email: user.email.clone(),
            activated: user.activated,
            user_regdate: registered_at,
            lastlogin: None,
            groups: user.groups.clone(),
        }
    }

    /// Replaces the group memberships (builder pattern).
    pub fn with_groups(mut self, groups: impl IntoIterator<Item = GroupId>) -> Self {
        self.groups = groups.into_iter().collect();
        self
    }
}

/// Error type for user store operations.
#[derive(Debug, thiserror::Error)]
pub enum UserStoreError {
    /// A database or storage error occurred.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Trait for the account persistence the importer and exporter rely on.
pub trait UserStore: Clone + Send + Sync + 'static {
    /// The error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the subset of `usernames` that already belong to an account.
    fn existing_usernames(
        &self,
        usernames: &HashSet<String>,
    ) -> impl Future<Output = Result<HashSet<String>, Self::Error>> + Send;

    /// Returns the subset of `emails` already used by an account.
    fn existing_emails(
        &self,
        emails: &HashSet<String>,
    ) -> impl Future<Output = Result<HashSet<String>, Self::Error>> + Send;

    /// Creates every account in the batch, or none of them.
    ///
    /// # Returns
    ///
    /// `Ok(true)` when the whole batch was committed, `Ok(false)` when the
    /// store rejected it without creating anything.
    fn create_batch(
        &self,
        batch: ValidatedImportBatch,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Lists all accounts ordered by uid.
    fn list_users(&self) -> impl Future<Output = Result<Vec<StoredUser>, Self::Error>> + Send;
}

#[derive(Default)]
struct UserTable {
    users: BTreeMap<UserId, StoredUser>,
    fail_username_lookups: bool,
    fail_email_lookups: bool,
    reject_batches: bool,
    batch_calls: usize,
    last_batch: Option<Vec<NewUser>>,
}

impl UserTable {
    fn next_uid(&self) -> UserId {
        self.users.keys().next_back().map_or(1, |uid| uid + 1)
    }
}

/// In-memory implementation of `UserStore`.
///
/// Accounts live in a thread-safe map keyed by uid. Used by tests and by the
/// JSON directory snapshot the command-line tool works against.
///
/// # Example
///
/// ```
/// use useradmin_services::users::{InMemoryUserStore, StoredUser};
///
/// let store = InMemoryUserStore::new().with_user(StoredUser::new(2, "admin", "admin@example.com"));
/// assert_eq!(store.len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    table: Arc<RwLock<UserTable>>,
}

impl InMemoryUserStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `(uname, email)` accounts.
    pub fn with_accounts<I, S1, S2>(accounts: I) -> Self
    where
        I: IntoIterator<Item = (S1, S2)>,
        S1: Into<String>,
        S2: Into<String>,
    {
        let store = Self::new();
        for (uname, email) in accounts {
            let uid = store.table.read().expect("lock poisoned").next_uid();
            store.insert(StoredUser::new(uid, uname, email));
        }
        store
    }

    /// Inserts a user (builder pattern).
    pub fn with_user(self, user: StoredUser) -> Self {
        self.insert(user);
        self
    }

    /// Makes every existence lookup fail (builder pattern).
    pub fn failing_lookups(self) -> Self {
        {
            let mut table = self.table.write().expect("lock poisoned");
            table.fail_username_lookups = true;
            table.fail_email_lookups = true;
        }
        self
    }

    /// Makes only the email lookup fail (builder pattern).
    pub fn failing_email_lookups(self) -> Self {
        self.table.write().expect("lock poisoned").fail_email_lookups = true;
        self
    }

    /// Makes every batch creation report a rejection (builder pattern).
    pub fn rejecting_batches(self) -> Self {
        self.table.write().expect("lock poisoned").reject_batches = true;
        self
    }

    /// Inserts or replaces a user, keyed by uid.
    pub fn insert(&self, user: StoredUser) {
        self.table
            .write()
            .expect("lock poisoned")
            .users
            .insert(user.uid, user);
    }

    /// Returns the number of stored users.
    pub fn len(&self) -> usize {
        self.table.read().expect("lock poisoned").users.len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many times `create_batch` has been called.
    pub fn batch_calls(&self) -> usize {
        self.table.read().expect("lock poisoned").batch_calls
    }

    /// The accounts handed to the latest `create_batch` call, in file order.
    pub fn last_batch(&self) -> Option<Vec<NewUser>> {
        self.table.read().expect("lock poisoned").last_batch.clone()
    }

    /// Looks a user up by username.
    pub fn find_by_uname(&self, uname: &str) -> Option<StoredUser> {
        self.table
            .read()
            .expect("lock poisoned")
            .users
            .values()
            .find(|user| user.uname == uname)
            .cloned()
    }

    /// All users ordered by uid.
    pub fn snapshot(&self) -> Vec<StoredUser> {
        self.table
            .read()
            .expect("lock poisoned")
            .users
            .values()
            .cloned()
            .collect()
    }

    fn lookup<P, F>(&self, candidates: &HashSet<String>, fails: P, key: F) -> Result<HashSet<String>, UserStoreError>
    where
        P: Fn(&UserTable) -> bool,
        F: Fn(&StoredUser) -> &str,
    {
        let table = self.table.read().expect("lock poisoned");
        if fails(&*table) {
            return Err(UserStoreError::StorageError(
                "user table is unavailable".to_owned(),
            ));
        }

        Ok(table
            .users
            .values()
            .map(|user| key(user))
            .filter(|value| candidates.contains(*value))
            .map(str::to_owned)
            .collect())
    }
}

impl UserStore for InMemoryUserStore {
    type Error = UserStoreError;

    async fn existing_usernames(
        &self,
        usernames: &HashSet<String>,
    ) -> Result<HashSet<String>, Self::Error> {
        self.lookup(usernames, |table| table.fail_username_lookups, |user| user.uname.as_str())
    }

    async fn existing_emails(
        &self,
        emails: &HashSet<String>,
    ) -> Result<HashSet<String>, Self::Error> {
        self.lookup(emails, |table| table.fail_email_lookups, |user| user.email.as_str())
    }

    async fn create_batch(&self, batch: ValidatedImportBatch) -> Result<bool, Self::Error> {
        let users = batch.into_users();
        let mut table = self.table.write().expect("lock poisoned");
        table.batch_calls += 1;
        table.last_batch = Some(users.clone());

        if table.reject_batches {
            return Ok(false);
        }

        let taken = table
            .users
            .values()
            .any(|stored| users.iter().any(|user| user.uname == stored.uname));
        if taken {
            return Ok(false);
        }

        if users.iter().any(|user| user.uname.is_empty()) {
            return Err(UserStoreError::InvalidInput(
                "Username cannot be empty".to_owned(),
            ));
        }

        let now = Utc::now();
        let mut uid = table.next_uid();
        for user in &users {
            table
                .users
                .insert(uid, StoredUser::from_new_user(uid, user, now));
            uid += 1;
        }

        Ok(true)
    }

    async fn list_users(&self) -> Result<Vec<StoredUser>, Self::Error> {
        Ok(self.snapshot())
    }
}
