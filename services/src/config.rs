use crate::import::{DEFAULT_MIN_PASSWORD_LENGTH, IllegalUsernames};
use anyhow::Context;
use serde::Deserialize;
use std::env::vars;
use std::fmt::Display;
use tracing::info;

/// Reserved usernames of a fresh installation.
pub const DEFAULT_ILLEGAL_USERNAMES: &str = "root webmaster admin administrator nobody anonymous username";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Env {
    #[default]
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "prod")]
    Prod,
    #[serde(rename = "test")]
    Test,
}

impl Display for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Env::Local => write!(f, "local"),
            Env::Prod => write!(f, "prod"),
            Env::Test => write!(f, "test"),
        }
    }
}

// The final, validated settings of the user administration.
// `illegal_usernames` is already compiled.
#[derive(Debug, Clone)]
pub struct ImportSettings {
    env: Env,
    min_password_length: usize,
    illegal_usernames: IllegalUsernames,
    unique_email: bool,
}

// An intermediate struct for deserializing environment variables
// where every setting is optional.
#[derive(Deserialize)]
struct RawSettings {
    env: Option<Env>,
    min_password_length: Option<usize>,
    illegal_usernames: Option<String>,
    // Accepts 1/0, true/false and yes/no
    unique_email: Option<String>,
}

impl ImportSettings {
    /// Create test settings with default values.
    ///
    /// The reserved username list is left empty so fixtures can use any name.
    pub fn new_for_test() -> Self {
        Self {
            env: Env::Test,
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
            illegal_usernames: IllegalUsernames::none(),
            unique_email: true,
        }
    }

    pub fn environment(&self) -> &Env {
        &self.env
    }

    pub fn is_prod(&self) -> bool {
        matches!(self.env, Env::Prod)
    }

    pub fn min_password_length(&self) -> usize {
        self.min_password_length
    }

    pub fn illegal_usernames(&self) -> &IllegalUsernames {
        &self.illegal_usernames
    }

    pub fn unique_email(&self) -> bool {
        self.unique_email
    }

    /// Initializes settings by reading from environment variables
    /// and applying the installation defaults.
    pub fn init() -> anyhow::Result<Self> {
        info!("Loading user administration settings from environment variables");

        let raw_settings: RawSettings = serde_env::from_iter(vars())?;
        Self::from_raw(raw_settings)
    }

    fn from_raw(raw_settings: RawSettings) -> anyhow::Result<Self> {
        let RawSettings {
            env,
            min_password_length,
            illegal_usernames,
            unique_email,
        } = raw_settings;

        let env = env.unwrap_or_default();

        let min_password_length = min_password_length.unwrap_or(DEFAULT_MIN_PASSWORD_LENGTH);
        if min_password_length == 0 {
            anyhow::bail!("MIN_PASSWORD_LENGTH must be at least 1 for {} environment", env);
        }

        let illegal_usernames = illegal_usernames.as_deref().unwrap_or(DEFAULT_ILLEGAL_USERNAMES);
        let illegal_usernames = IllegalUsernames::compile(illegal_usernames)
            .context("ILLEGAL_USERNAMES must be a space separated list of valid patterns")?;

        let unique_email = match unique_email.as_deref().map(str::trim) {
            None => true,
            Some(value) => parse_switch(value)
                .with_context(|| format!("UNIQUE_EMAIL must be a boolean switch, got {value:?}"))?,
        };

        Ok(Self {
            env,
            min_password_length,
            illegal_usernames,
            unique_email,
        })
    }
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_env::from_iter;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let raw: RawSettings =
            from_iter(Vec::<(&str, &str)>::new()).expect("RawSettings should deserialize");

        let settings = ImportSettings::from_raw(raw).expect("default settings should build");
        assert_eq!(settings.environment(), &Env::Local);
        assert_eq!(settings.min_password_length(), 5);
        assert!(settings.unique_email());
        assert!(settings.illegal_usernames().is_reserved("webmaster"));
        assert!(!settings.illegal_usernames().is_reserved("alice"));
    }

    #[test]
    fn settings_are_read_from_variables() {
        let raw: RawSettings = from_iter(vec![
            ("ENV", "prod"),
            ("MIN_PASSWORD_LENGTH", "8"),
            ("ILLEGAL_USERNAMES", "guest"),
            ("UNIQUE_EMAIL", "no"),
        ])
        .expect("RawSettings should deserialize");

        let settings = ImportSettings::from_raw(raw).expect("prod settings should build");
        assert!(settings.is_prod());
        assert_eq!(settings.min_password_length(), 8);
        assert!(!settings.unique_email());
        assert!(settings.illegal_usernames().is_reserved("Guest1"));
        assert!(!settings.illegal_usernames().is_reserved("root"));
    }

    #[test]
    fn zero_min_password_length_is_rejected() {
        let raw: RawSettings =
            from_iter(vec![("MIN_PASSWORD_LENGTH", "0")]).expect("RawSettings should deserialize");

        let result = ImportSettings::from_raw(raw);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("MIN_PASSWORD_LENGTH"));
    }

    #[test]
    fn invalid_illegal_username_pattern_is_rejected() {
        let raw: RawSettings =
            from_iter(vec![("ILLEGAL_USERNAMES", "root [admin")]).expect("RawSettings should deserialize");

        let result = ImportSettings::from_raw(raw);
        assert!(result.unwrap_err().to_string().contains("ILLEGAL_USERNAMES"));
    }

    #[test]
    fn unknown_unique_email_switch_is_rejected() {
        let raw: RawSettings =
            from_iter(vec![("UNIQUE_EMAIL", "maybe")]).expect("RawSettings should deserialize");

        assert!(ImportSettings::from_raw(raw).is_err());
    }

    #[test]
    fn blank_illegal_usernames_disable_reservation() {
        let raw: RawSettings =
            from_iter(vec![("ILLEGAL_USERNAMES", " ")]).expect("RawSettings should deserialize");

        let settings = ImportSettings::from_raw(raw).expect("settings should build");
        assert!(!settings.illegal_usernames().is_configured());
    }
}
