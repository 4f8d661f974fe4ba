//! Application-level configuration loading: credentials, storage backend and metadata provider.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "MOVIE_NIGHT_CONFIG_PATH";
/// Whitespace separated `name:password` pairs replacing the configured users.
const USERS_ENV: &str = "MOVIE_NIGHT_USERS";
/// Switches the store to a JSON file at the given path.
const DATA_PATH_ENV: &str = "MOVIE_NIGHT_DATA_PATH";
/// Enables the OMDb metadata provider.
const OMDB_API_KEY_ENV: &str = "OMDB_API_KEY";

const DEFAULT_DATA_PATH: &str = "data/movie-night.json";
const DEFAULT_OMDB_URL: &str = "https://www.omdbapi.com";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TOKEN_TTL_SECS: u64 = 12 * 60 * 60;
const DEFAULT_METADATA_TIMEOUT_SECS: u64 = 5;

/// Login allowed to obtain a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCredential {
    pub username: String,
    pub password: String,
}

/// Where the game rows live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// Process memory; everything is lost on restart.
    Memory,
    /// A JSON snapshot rewritten after every committed mutation.
    JsonFile { path: PathBuf },
}

/// Which collaborator resolves movie titles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataConfig {
    /// Echo titles without enrichment.
    Fixed,
    /// Query the OMDb HTTP API.
    Omdb { base_url: String, api_key: String },
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    users: Vec<UserCredential>,
    token_ttl: Duration,
    metadata_timeout: Duration,
    storage: StorageConfig,
    metadata: MetadataConfig,
    port: u16,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults, then apply
    /// environment overrides.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let base = match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        users = config.users.len(),
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        let config = base.with_overrides(|key| env::var(key).ok());
        if config.users.is_empty() {
            warn!("no users configured; nobody will be able to log in");
        }
        config
    }

    /// Parse the JSON configuration file format.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Apply environment-style overrides looked up through `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(users) = get(USERS_ENV) {
            self.users = parse_users(&users);
        }
        if let Some(path) = get(DATA_PATH_ENV) {
            self.storage = StorageConfig::JsonFile {
                path: PathBuf::from(path),
            };
        }
        if let Some(api_key) = get(OMDB_API_KEY_ENV) {
            let base_url = match self.metadata {
                MetadataConfig::Omdb { base_url, .. } => base_url,
                MetadataConfig::Fixed => DEFAULT_OMDB_URL.to_owned(),
            };
            self.metadata = MetadataConfig::Omdb { base_url, api_key };
        }
        if let Some(port) = get("PORT")
            .or_else(|| get("SERVER_PORT"))
            .and_then(|value| value.parse::<u16>().ok())
        {
            self.port = port;
        }
        self
    }

    /// Replace the credential list.
    pub fn with_users(mut self, users: Vec<UserCredential>) -> Self {
        self.users = users;
        self
    }

    /// Replace the storage backend.
    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }

    /// Replace the metadata lookup bound.
    pub fn with_metadata_timeout(mut self, metadata_timeout: Duration) -> Self {
        self.metadata_timeout = metadata_timeout;
        self
    }

    pub fn users(&self) -> &[UserCredential] {
        &self.users
    }

    /// How long an issued bearer token stays valid.
    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// Upper bound on a single metadata lookup.
    pub fn metadata_timeout(&self) -> Duration {
        self.metadata_timeout
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    pub fn metadata(&self) -> &MetadataConfig {
        &self.metadata
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECS),
            metadata_timeout: Duration::from_secs(DEFAULT_METADATA_TIMEOUT_SECS),
            storage: default_storage(),
            metadata: MetadataConfig::Fixed,
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    users: Vec<RawUser>,
    token_ttl_secs: Option<u64>,
    metadata_timeout_secs: Option<u64>,
    data_path: Option<PathBuf>,
    omdb: Option<RawOmdb>,
    port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct RawOmdb {
    #[serde(default = "default_omdb_url")]
    base_url: String,
    api_key: String,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            users: value
                .users
                .into_iter()
                .map(|user| UserCredential {
                    username: user.username,
                    password: user.password,
                })
                .collect(),
            token_ttl: value
                .token_ttl_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.token_ttl),
            metadata_timeout: value
                .metadata_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.metadata_timeout),
            storage: value
                .data_path
                .map(|path| StorageConfig::JsonFile { path })
                .unwrap_or(defaults.storage),
            metadata: value
                .omdb
                .map(|omdb| MetadataConfig::Omdb {
                    base_url: omdb.base_url,
                    api_key: omdb.api_key,
                })
                .unwrap_or(defaults.metadata),
            port: value.port.unwrap_or(defaults.port),
        }
    }
}

/// Parse `"alice:pw bob:pw"` into credentials, skipping malformed entries.
pub fn parse_users(raw: &str) -> Vec<UserCredential> {
    raw.split_whitespace()
        .filter_map(|entry| match entry.split_once(':') {
            Some((username, password)) if !username.is_empty() => Some(UserCredential {
                username: username.to_owned(),
                password: password.to_owned(),
            }),
            _ => {
                warn!(entry, "ignoring malformed user entry");
                None
            }
        })
        .collect()
}

fn default_omdb_url() -> String {
    DEFAULT_OMDB_URL.to_owned()
}

#[cfg(feature = "json-store")]
fn default_storage() -> StorageConfig {
    StorageConfig::JsonFile {
        path: PathBuf::from(DEFAULT_DATA_PATH),
    }
}

#[cfg(not(feature = "json-store"))]
fn default_storage() -> StorageConfig {
    let _ = DEFAULT_DATA_PATH;
    StorageConfig::Memory
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
