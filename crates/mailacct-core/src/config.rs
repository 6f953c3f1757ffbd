//! Per-protocol credential settings.
//!
//! Settings are stored as JSON in `<config dir>/mailacct/credentials.json`:
//!
//! ```json
//! {
//!   "interactive": true,
//!   "imap": { "user": "alice", "login": "alice@example.com", "pass": "..." },
//!   "smtp": { "oauth_refresh_command": "oauth2-helper --refresh smtp" }
//! }
//! ```
//!
//! Every key is optional. Only the `imap` section honours `login`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::account::Protocol;
use crate::{Error, Result};

/// Directory under the platform config dir holding our files.
const APP_DIR: &str = "mailacct";

/// File name of the credential settings.
const CONFIG_FILE: &str = "credentials.json";

/// Settings for one protocol.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProtocolConfig {
    /// Default username.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Login identity, when it differs from the username.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    /// Password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass: Option<String>,
    /// Shell command printing an OAuth token on its first line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth_refresh_command: Option<String>,
}

impl std::fmt::Debug for ProtocolConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolConfig")
            .field("user", &self.user)
            .field("login", &self.login)
            .field("pass", &self.pass.as_ref().map(|_| "<redacted>"))
            .field("oauth_refresh_command", &self.oauth_refresh_command)
            .finish()
    }
}

/// Credential settings for all protocols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialConfig {
    /// Whether prompting is allowed. When false, anything that would prompt
    /// fails immediately instead.
    pub interactive: bool,
    /// Local login name used as the fallback username.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_user: Option<String>,
    /// IMAP settings.
    pub imap: ProtocolConfig,
    /// POP settings.
    pub pop: ProtocolConfig,
    /// SMTP settings.
    pub smtp: ProtocolConfig,
    /// NNTP settings.
    pub nntp: ProtocolConfig,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            interactive: true,
            system_user: system_login_name(),
            imap: ProtocolConfig::default(),
            pop: ProtocolConfig::default(),
            smtp: ProtocolConfig::default(),
            nntp: ProtocolConfig::default(),
        }
    }
}

impl CredentialConfig {
    /// Create settings with nothing configured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether prompting is allowed.
    #[must_use]
    pub const fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Sets the fallback username.
    #[must_use]
    pub fn with_system_user(mut self, user: impl Into<String>) -> Self {
        self.system_user = Some(user.into());
        self
    }

    /// Settings for `protocol`.
    #[must_use]
    pub const fn protocol(&self, protocol: Protocol) -> &ProtocolConfig {
        match protocol {
            Protocol::Imap => &self.imap,
            Protocol::Pop => &self.pop,
            Protocol::Smtp => &self.smtp,
            Protocol::Nntp => &self.nntp,
        }
    }

    /// Mutable settings for `protocol`.
    pub const fn protocol_mut(&mut self, protocol: Protocol) -> &mut ProtocolConfig {
        match protocol {
            Protocol::Imap => &mut self.imap,
            Protocol::Pop => &mut self.pop,
            Protocol::Smtp => &mut self.smtp,
            Protocol::Nntp => &mut self.nntp,
        }
    }

    /// Configured default username for `protocol`.
    #[must_use]
    pub fn user(&self, protocol: Protocol) -> Option<&str> {
        self.protocol(protocol).user.as_deref()
    }

    /// Configured login for `protocol`. Only IMAP has one.
    #[must_use]
    pub fn login(&self, protocol: Protocol) -> Option<&str> {
        match protocol {
            Protocol::Imap => self.imap.login.as_deref(),
            Protocol::Pop | Protocol::Smtp | Protocol::Nntp => None,
        }
    }

    /// Configured password for `protocol`.
    #[must_use]
    pub fn pass(&self, protocol: Protocol) -> Option<&str> {
        self.protocol(protocol).pass.as_deref()
    }

    /// Configured OAuth refresh command for `protocol`.
    #[must_use]
    pub fn refresh_command(&self, protocol: Protocol) -> Option<&str> {
        self.protocol(protocol).oauth_refresh_command.as_deref()
    }

    /// Local login name, or `""` if unknown.
    #[must_use]
    pub fn system_user(&self) -> &str {
        self.system_user.as_deref().unwrap_or_default()
    }

    /// Username an account without an explicit user is assumed to have.
    #[must_use]
    pub fn effective_user(&self, protocol: Protocol) -> &str {
        self.user(protocol).unwrap_or_else(|| self.system_user())
    }

    /// Default settings file location.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join(CONFIG_FILE)
    }

    /// Load settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;

        for protocol in [Protocol::Pop, Protocol::Smtp, Protocol::Nntp] {
            if config.protocol(protocol).login.is_some() {
                warn!("Ignoring `login` for {protocol}; only IMAP supports it");
            }
        }
        debug!("Loaded credential settings from {}", path.display());
        Ok(config)
    }

    /// Load settings from [`CredentialConfig::default_path`], or defaults if
    /// the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file exists but is unreadable or
    /// malformed.
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path();
        if !path.exists() {
            debug!("No credential settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(&path)
    }
}

/// Login name of the current user from the environment.
fn system_login_name() -> Option<String> {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_interactive() {
        let config = CredentialConfig::default();
        assert!(config.interactive);
        for protocol in Protocol::ALL {
            assert_eq!(config.protocol(protocol), &ProtocolConfig::default());
        }
    }

    #[test]
    fn test_parse_partial_json() {
        let json = r#"{
            "interactive": false,
            "system_user": "alice",
            "imap": { "user": "al", "login": "alice@example.com" },
            "smtp": { "pass": "pw", "oauth_refresh_command": "echo tok" }
        }"#;
        let config: CredentialConfig = serde_json::from_str(json).unwrap();

        assert!(!config.interactive);
        assert_eq!(config.system_user(), "alice");
        assert_eq!(config.user(Protocol::Imap), Some("al"));
        assert_eq!(config.login(Protocol::Imap), Some("alice@example.com"));
        assert_eq!(config.pass(Protocol::Smtp), Some("pw"));
        assert_eq!(config.refresh_command(Protocol::Smtp), Some("echo tok"));
        assert_eq!(config.refresh_command(Protocol::Imap), None);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let json = r#"{ "imap": { "username": "x" } }"#;
        assert!(serde_json::from_str::<CredentialConfig>(json).is_err());
    }

    #[test]
    fn test_login_only_for_imap() {
        let mut config = CredentialConfig::new();
        config.protocol_mut(Protocol::Pop).login = Some("ignored".to_string());
        config.protocol_mut(Protocol::Imap).login = Some("used".to_string());
        assert_eq!(config.login(Protocol::Pop), None);
        assert_eq!(config.login(Protocol::Imap), Some("used"));
    }

    #[test]
    fn test_effective_user_prefers_protocol_user() {
        let mut config = CredentialConfig::new().with_system_user("local");
        assert_eq!(config.effective_user(Protocol::Nntp), "local");
        config.nntp.user = Some("newsreader".to_string());
        assert_eq!(config.effective_user(Protocol::Nntp), "newsreader");
        assert_eq!(config.effective_user(Protocol::Imap), "local");
    }

    #[test]
    fn test_debug_redacts_password() {
        let mut config = CredentialConfig::new();
        config.imap.pass = Some("hunter2".to_string());
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = CredentialConfig::load(Path::new("/nonexistent/mailacct.json")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_round_trip_file() {
        let path = std::env::temp_dir().join(format!(
            "mailacct-config-test-{}.json",
            std::process::id()
        ));
        let config = CredentialConfig::new()
            .with_interactive(false)
            .with_system_user("bob");
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = CredentialConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
