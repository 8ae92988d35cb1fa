//! Configuration file handling for the ledger.
//!
//! The configuration file is stored at `$LEDGER_HOME/config.json` and holds the display currency,
//! the size of the recent-activity window, the login entry point, and the locations of the store
//! and the identity file.

use crate::store::SqliteStore;
use crate::summary::DEFAULT_RECENT_LIMIT;
use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_NAME: &str = "ledger";
const CONFIG_VERSION: u8 = 1;
const CURRENCY: &str = "KES";
const LOGIN_URL: &str = "/login";
const SECRETS: &str = ".secrets";
const CONFIG_JSON: &str = "config.json";
const IDENTITY_JSON: &str = "identity.json";
const LEDGER_SQLITE: &str = "ledger.sqlite";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$LEDGER_HOME` and from there it loads `$LEDGER_HOME/config.json`. It provides
/// paths to other items that are either configurable or are expected in a certain location within
/// the ledger home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the data directory, its `.secrets` subdirectory, an initial `config.json` with
    /// default settings, and an empty store.
    ///
    /// # Errors
    /// - Returns an error if `config.json` already exists or if any file operation fails.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the ledger home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A ledger already exists at '{}', remove it or choose another directory",
                root.display()
            );
        }

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;

        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;

        let config = Self {
            root,
            secrets,
            config_path,
            config_file,
        };

        SqliteStore::init(config.store_path())
            .await
            .context("Unable to create the store")?;
        debug!("Created ledger home at {}", config.root.display());
        Ok(config)
    }

    /// This will
    /// - validate that `ledger_home` exists and that the config file exists
    /// - load and validate the config file
    /// - validate that the secrets directory exists
    pub async fn load(ledger_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = ledger_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The ledger home is missing, run 'ledger init' first")?;
        let _ = utils::read_dir(&root)
            .await
            .context("The ledger home is not a readable directory")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let secrets = root.join(SECRETS);
        if !secrets.is_dir() {
            bail!("The secrets directory is missing '{}'", secrets.display())
        }

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    /// The currency code shown in front of amounts, e.g. `KES`.
    pub fn currency(&self) -> &str {
        &self.config_file.currency
    }

    /// How many records the home screen shows.
    pub fn recent_limit(&self) -> usize {
        self.config_file.recent_limit
    }

    /// Where signed-out users are sent.
    pub fn login_url(&self) -> &str {
        &self.config_file.login_url
    }

    /// The SQLite store, `$LEDGER_HOME/ledger.sqlite` unless configured otherwise.
    pub fn store_path(&self) -> PathBuf {
        self.resolve(self.config_file.store_path.as_deref(), Path::new(LEDGER_SQLITE))
    }

    /// The signed-in identity, `$LEDGER_HOME/.secrets/identity.json` unless configured otherwise.
    pub fn identity_path(&self) -> PathBuf {
        let default = PathBuf::from(SECRETS).join(IDENTITY_JSON);
        self.resolve(self.config_file.identity_path.as_deref(), &default)
    }

    /// Returns `configured` (or `default`) if it is absolute, otherwise resolves it against the
    /// home directory.
    fn resolve(&self, configured: Option<&Path>, default: &Path) -> PathBuf {
        let p = configured.unwrap_or(default);
        if p.is_absolute() {
            return p.to_path_buf();
        }
        self.root.join(p)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "ledger",
///   "config_version": 1,
///   "currency": "KES",
///   "recent_limit": 5,
///   "login_url": "/login",
///   "store_path": "ledger.sqlite"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "ledger"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Currency code shown with amounts
    #[serde(default = "default_currency")]
    currency: String,

    /// Number of records in the home screen's recent activity
    #[serde(default = "default_recent_limit")]
    recent_limit: usize,

    /// Login entry point shown to signed-out users
    #[serde(default = "default_login_url")]
    login_url: String,

    /// Path to the SQLite store (optional, relative to the home directory or absolute)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    store_path: Option<PathBuf>,

    /// Path to the identity file (optional, relative to the home directory or absolute)
    /// Defaults to $LEDGER_HOME/.secrets/identity.json if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    identity_path: Option<PathBuf>,
}

fn default_currency() -> String {
    CURRENCY.to_string()
}

fn default_recent_limit() -> usize {
    DEFAULT_RECENT_LIMIT
}

fn default_login_url() -> String {
    LOGIN_URL.to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            currency: default_currency(),
            recent_limit: default_recent_limit(),
            login_url: default_login_url(),
            store_path: Some(PathBuf::from(LEDGER_SQLITE)),
            identity_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        ensure!(
            config.recent_limit > 0,
            "Invalid recent_limit in config file: it must be at least 1"
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("ledger_home");

        let config = Config::create(&home_dir).await.unwrap();

        assert!(config.secrets().is_dir());
        assert!(config.config_path().is_file());
        assert!(config.store_path().is_file());
        assert_eq!(config.currency(), "KES");
        assert_eq!(config.recent_limit(), 5);
        assert_eq!(config.login_url(), "/login");
        assert_eq!(
            config.identity_path(),
            config.root().join(".secrets").join("identity.json")
        );

        let loaded = Config::load(&home_dir).await.unwrap();
        assert_eq!(loaded.root(), config.root());
        assert_eq!(loaded.store_path(), config.store_path());
    }

    #[tokio::test]
    async fn test_config_create_twice_fails() {
        let dir = TempDir::new().unwrap();
        Config::create(dir.path()).await.unwrap();
        assert!(Config::create(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load(dir.path().join("nope")).await.is_err());
        // a directory without a config file is not a ledger home
        assert!(Config::load(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_config_file_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let mut original = ConfigFile::default();
        original.currency = "UGX".into();
        original.identity_path = Some(PathBuf::from("/var/lib/ledger/identity.json"));
        original.save(&config_path).await.unwrap();

        let loaded = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(original, loaded);
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "ledger",
            "config_version": 1
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(config.currency, "KES");
        assert_eq!(config.recent_limit, 5);
        assert_eq!(config.login_url, "/login");
        assert_eq!(config.store_path, None);
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{"app_name": "budget", "config_version": 1}"#;
        utils::write(&config_path, json).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_load_zero_recent_limit() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{"app_name": "ledger", "config_version": 1, "recent_limit": 0}"#;
        utils::write(&config_path, json).await.unwrap();
        assert!(ConfigFile::load(&config_path).await.is_err());
    }

    #[test]
    fn test_config_file_serialization_omits_none_fields() {
        let config = ConfigFile::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("store_path"));
        assert!(!json.contains("identity_path"));
    }

    #[test]
    fn test_absolute_paths_are_kept() {
        let mut config_file = ConfigFile::default();
        config_file.store_path = Some(PathBuf::from("/data/ledger.sqlite"));
        let config = Config {
            root: PathBuf::from("/home/farmer/ledger"),
            secrets: PathBuf::from("/home/farmer/ledger/.secrets"),
            config_path: PathBuf::from("/home/farmer/ledger/config.json"),
            config_file,
        };
        assert_eq!(config.store_path(), PathBuf::from("/data/ledger.sqlite"));
        assert_eq!(
            config.identity_path(),
            PathBuf::from("/home/farmer/ledger/.secrets/identity.json")
        );
    }
}
