//! User groups.
//!
//! Group memberships and the permission question "which groups may this
//! user put other users into" are answered by a [`GroupService`].

pub mod service;

pub use service::{
    DEFAULT_GROUP_ID, Group, GroupId, GroupService, GroupServiceError, InMemoryGroupService,
};
