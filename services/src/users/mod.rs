//! User accounts.
//!
//! This module provides the account model shared by import and export, and
//! the storage abstraction both of them go through.

pub mod storage;

pub use storage::{
    Activation, InMemoryUserStore, NewUser, StoredUser, UserId, UserStore, UserStoreError,
};
