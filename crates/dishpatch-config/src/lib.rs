//! Configuration for the dishpatch console.
//!
//! TOML config with environment overrides, validation, and wiring of
//! the configured backend into [`AppServices`]. Shells load one
//! [`ConsoleConfig`] at startup and build everything else from it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dishpatch_core::session::routes;
use dishpatch_core::{AccessGate, AppServices, ClaimRetryConfig, Console};
use dishpatch_services::{MemoryDocumentStore, MemoryIdentityProvider};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration for a console shell.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Which backend to wire and how to provision its operations account.
#[derive(Debug, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Backend mode. Only "embedded" is built in.
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Operations account registered at startup; falls back to the
    /// embedded default account when unset.
    pub admin_email: Option<String>,

    /// Plaintext password for the operations account (the embedded
    /// backend is for development, so no credential store is used).
    pub admin_password: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            admin_email: None,
            admin_password: None,
        }
    }
}

fn default_mode() -> String {
    "embedded".into()
}

/// Session gate tuning.
#[derive(Debug, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Route signed-in sessions land on.
    #[serde(default = "default_landing")]
    pub landing_route: String,

    /// Seconds before the first claim re-check.
    #[serde(default = "default_retry_initial")]
    pub claim_retry_initial_secs: u64,

    /// Ceiling for the claim re-check schedule, in seconds.
    #[serde(default = "default_retry_max")]
    pub claim_retry_max_secs: u64,

    /// Total claim re-checks before giving up; 0 polls forever.
    #[serde(default = "default_retry_attempts")]
    pub claim_retry_attempts: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            landing_route: default_landing(),
            claim_retry_initial_secs: default_retry_initial(),
            claim_retry_max_secs: default_retry_max(),
            claim_retry_attempts: default_retry_attempts(),
        }
    }
}

impl SessionConfig {
    /// Translate to the gate's retry schedule.
    pub fn claim_retry(&self) -> ClaimRetryConfig {
        ClaimRetryConfig {
            initial_delay: Duration::from_secs(self.claim_retry_initial_secs),
            max_delay: Duration::from_secs(self.claim_retry_max_secs),
            max_attempts: match self.claim_retry_attempts {
                0 => None,
                n => Some(n),
            },
        }
    }
}

fn default_landing() -> String {
    routes::LANDING.into()
}
fn default_retry_initial() -> u64 {
    3
}
fn default_retry_max() -> u64 {
    30
}
fn default_retry_attempts() -> u32 {
    20
}

/// Logging surface consumed by the shells.
#[derive(Debug, Deserialize, Serialize)]
pub struct LogConfig {
    /// Minimum level: "error", "warn", "info", "debug", or "trace".
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "dishpatch", "dishpatch").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("dishpatch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load configuration from `path` plus `DISHPATCH_`-prefixed
/// environment variables, over built-in defaults.
pub fn load_config_from(path: &Path) -> Result<ConsoleConfig, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(ConsoleConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("DISHPATCH_").split("_"));

    let config: ConsoleConfig = figment.extract()?;
    validate(&config)?;
    Ok(config)
}

/// Load configuration from the canonical path.
pub fn load_config() -> Result<ConsoleConfig, ConfigError> {
    load_config_from(&config_path())
}

/// Load config, falling back to defaults if loading fails.
pub fn load_config_or_default() -> ConsoleConfig {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(path: &Path, config: &ConsoleConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(config)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Serialize config to TOML and write it to the canonical path.
pub fn save_config(config: &ConsoleConfig) -> Result<(), ConfigError> {
    save_config_to(&config_path(), config)
}

// ── Validation ──────────────────────────────────────────────────────

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Reject configs that cannot be wired.
pub fn validate(config: &ConsoleConfig) -> Result<(), ConfigError> {
    if config.backend.mode != "embedded" {
        return Err(ConfigError::Validation {
            field: "backend.mode".into(),
            reason: format!("expected 'embedded', got '{}'", config.backend.mode),
        });
    }
    if let Some(email) = &config.backend.admin_email {
        if !email.contains('@') {
            return Err(ConfigError::Validation {
                field: "backend.admin_email".into(),
                reason: format!("'{email}' is not an email address"),
            });
        }
    }
    if config.session.claim_retry_initial_secs == 0 {
        return Err(ConfigError::Validation {
            field: "session.claim_retry_initial_secs".into(),
            reason: "must be at least 1".into(),
        });
    }
    if config.session.claim_retry_max_secs < config.session.claim_retry_initial_secs {
        return Err(ConfigError::Validation {
            field: "session.claim_retry_max_secs".into(),
            reason: "must be at least the initial delay".into(),
        });
    }
    if !config.session.landing_route.starts_with('/') {
        return Err(ConfigError::Validation {
            field: "session.landing_route".into(),
            reason: format!("'{}' is not a route", config.session.landing_route),
        });
    }
    if !LOG_LEVELS.contains(&config.log.level.as_str()) {
        return Err(ConfigError::Validation {
            field: "log.level".into(),
            reason: format!("expected one of {LOG_LEVELS:?}, got '{}'", config.log.level),
        });
    }
    Ok(())
}

// ── Service wiring ──────────────────────────────────────────────────

/// Wire the configured backend.
///
/// Returns the service seams plus the concrete embedded handles so
/// callers can seed collections and provision accounts.
pub fn build_services(
    config: &ConsoleConfig,
) -> Result<(AppServices, MemoryDocumentStore, MemoryIdentityProvider), ConfigError> {
    validate(config)?;

    let (services, store, identity) = AppServices::embedded();
    if let (Some(email), Some(password)) =
        (&config.backend.admin_email, &config.backend.admin_password)
    {
        identity.register(email, password);
        if identity.set_admin_claim(email).is_err() {
            return Err(ConfigError::Validation {
                field: "backend.admin_email".into(),
                reason: "account registration failed".into(),
            });
        }
    }
    Ok((services, store, identity))
}

/// Wire the configured backend and spawn the console facades.
///
/// Must run inside a tokio runtime; the gate driver is spawned on it.
pub fn build_console(config: &ConsoleConfig) -> Result<(Console, AccessGate), ConfigError> {
    let (services, _, _) = build_services(config)?;
    let gate = AccessGate::with_route(
        Arc::clone(services.identity()),
        config.session.claim_retry(),
        &config.session.landing_route,
    );
    Ok((services.console(), gate))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_cover_every_section() {
        let config = ConsoleConfig::default();
        assert_eq!(config.backend.mode, "embedded");
        assert_eq!(config.session.landing_route, routes::LANDING);
        assert_eq!(config.session.claim_retry_attempts, 20);
        assert_eq!(config.log.level, "info");
        validate(&config).unwrap();
    }

    #[test]
    fn file_and_env_layers_override_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                    [session]
                    claim_retry_initial_secs = 5
                    claim_retry_attempts = 0

                    [log]
                    level = "debug"
                "#,
            )?;
            jail.set_env("DISHPATCH_LOG_LEVEL", "trace");

            let config = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(config.session.claim_retry_initial_secs, 5);
            // Environment wins over the file.
            assert_eq!(config.log.level, "trace");

            let retry = config.session.claim_retry();
            assert_eq!(retry.initial_delay, Duration::from_secs(5));
            assert_eq!(retry.max_attempts, None);
            Ok(())
        });
    }

    #[test]
    fn saved_configs_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = ConsoleConfig::default();
        config.backend.admin_email = Some("ops@dishpatch.io".into());
        config.session.claim_retry_max_secs = 60;

        save_config_to(&path, &config).unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.backend.admin_email.as_deref(), Some("ops@dishpatch.io"));
        assert_eq!(loaded.session.claim_retry_max_secs, 60);
    }

    #[test]
    fn validation_rejects_unwirable_configs() {
        let mut config = ConsoleConfig::default();
        config.backend.mode = "firestore".into();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation { field, .. }) if field == "backend.mode"
        ));

        let mut config = ConsoleConfig::default();
        config.backend.admin_email = Some("not-an-email".into());
        assert!(validate(&config).is_err());

        let mut config = ConsoleConfig::default();
        config.session.claim_retry_max_secs = 1;
        assert!(validate(&config).is_err());

        let mut config = ConsoleConfig::default();
        config.log.level = "loud".into();
        assert!(validate(&config).is_err());
    }

    #[tokio::test]
    async fn build_console_wires_the_configured_account() {
        let mut config = ConsoleConfig::default();
        config.backend.admin_email = Some("chef@dishpatch.io".into());
        config.backend.admin_password = Some("brigade".into());

        let (services, _store, identity) = build_services(&config).unwrap();
        identity.sign_in("chef@dishpatch.io", "brigade").unwrap();
        assert!(services.identity().auth_state().borrow().is_some());

        let (console, gate) = build_console(&config).unwrap();
        let mut users = console.users();
        assert!(users.changed().await.unwrap().data().unwrap().is_empty());
        gate.shutdown().await;
    }
}
