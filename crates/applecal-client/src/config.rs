//! Client configuration.
//!
//! Settings live in `~/.config/applecal/config.toml` by default:
//!
//! ```toml
//! [account]
//! server_url = "https://caldav.icloud.com/"
//! username = "me@icloud.com"
//! password = "pass::apple/caldav"
//!
//! [output]
//! format = "basic"
//! pretty = true
//! ```
//!
//! Command-line flags and `APPLECAL_*` environment variables take
//! precedence over the file.

use std::path::{Path, PathBuf};

use applecal_core::OutputFormat;
use applecal_providers::CalDavConfig;
use applecal_providers::caldav::ICLOUD_PRINCIPAL_PATTERN;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Configuration for the applecal client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// CalDAV account settings.
    pub account: AccountSettings,

    /// Output settings.
    pub output: OutputSettings,
}

/// CalDAV account settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountSettings {
    /// Base URL of the CalDAV server.
    pub server_url: String,

    /// Apple ID e-mail.
    pub username: Option<String>,

    /// App-specific password (supports `pass::` and `env::` prefixes).
    pub password: Option<String>,

    /// Regular expression matching the principal id segment.
    pub principal_pattern: String,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            server_url: CalDavConfig::ICLOUD_URL.to_string(),
            username: None,
            password: None,
            principal_pattern: ICLOUD_PRINCIPAL_PATTERN.to_string(),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Event projection.
    pub format: OutputFormat,

    /// Pretty-print JSON.
    pub pretty: bool,
}

impl ClientConfig {
    /// Loads configuration from the default path, or defaults if the file
    /// does not exist.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            ClientError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("applecal")
    }

    /// Builds the provider configuration, resolving the password reference.
    pub fn to_provider_config(&self) -> ClientResult<CalDavConfig> {
        let account = &self.account;
        let mut config = CalDavConfig::new(&account.server_url)?
            .with_principal_pattern(&account.principal_pattern)?;

        match (&account.username, &account.password) {
            (Some(username), Some(password)) => {
                let password = crate::secret::resolve(password)
                    .map_err(|e| ClientError::Config(format!("failed to resolve password: {}", e)))?;
                config = config.with_credentials(username, password);
            }
            (None, None) => {}
            _ => {
                return Err(ClientError::Config(
                    "username and password must be set together".to_string(),
                ));
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_target_icloud() {
        let config = ClientConfig::default();
        assert_eq!(config.account.server_url, "https://caldav.icloud.com/");
        assert_eq!(config.account.principal_pattern, "^[0-9]{10}$");
        assert_eq!(config.output.format, OutputFormat::Basic);
        assert!(!config.output.pretty);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[account]
username = "me@icloud.com"
password = "abcd-efgh-ijkl-mnop"

[output]
format = "raw"
pretty = true
"#
        )
        .unwrap();

        let config = ClientConfig::load_from(file.path()).unwrap();
        assert_eq!(config.account.username.as_deref(), Some("me@icloud.com"));
        assert_eq!(config.account.server_url, "https://caldav.icloud.com/");
        assert_eq!(config.output.format, OutputFormat::Full);
        assert!(config.output.pretty);

        let provider = config.to_provider_config().unwrap();
        assert!(provider.has_credentials());
    }

    #[test]
    fn invalid_file_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\nformat = \"verbose\"").unwrap();
        let err = ClientConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientConfig::load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn username_without_password_is_rejected() {
        let mut config = ClientConfig::default();
        config.account.username = Some("me@icloud.com".to_string());
        assert!(matches!(
            config.to_provider_config(),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn password_reference_is_resolved() {
        unsafe {
            std::env::set_var("_APPLECAL_TEST_PASSWORD", "from-env");
        }
        let mut config = ClientConfig::default();
        config.account.username = Some("me@icloud.com".to_string());
        config.account.password = Some("env::_APPLECAL_TEST_PASSWORD".to_string());

        let provider = config.to_provider_config().unwrap();
        let credentials = provider.credentials.unwrap();
        assert_eq!(credentials.password(), "from-env");

        unsafe {
            std::env::remove_var("_APPLECAL_TEST_PASSWORD");
        }
    }

    #[test]
    fn config_roundtrips_through_toml() {
        let config = ClientConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("[account]"));
        let back: ClientConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
