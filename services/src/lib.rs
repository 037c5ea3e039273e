//! User administration services: CSV user import validation and export.

pub mod config;
pub mod directory;
pub mod export;
pub mod groups;
pub mod import;
pub mod telemetry;
pub mod users;
pub mod validation;
