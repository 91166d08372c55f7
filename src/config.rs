use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{self, Read, Write},
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No home directory found")]
    NoHomeDir,

    #[error("Failed to create config directory: {0}")]
    CreateConfigDir(String),

    #[error("Invalid evaluator URL: {0}")]
    InvalidUrl(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

pub const CONFIG_FILE_NAME: &str = "config.json";

/// Client settings.
/// Supported sources (in order of precedence):
/// - CLI arguments (by clap)
/// - Environment variables (by clap and dotenv)
/// - Config file
/// - Defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Evaluator server URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Path prefix prepended to every endpoint
    #[serde(default)]
    pub base_path: String,

    /// Transport timeout; `None` waits forever
    #[serde(default, with = "duration_ms_opt")]
    pub request_timeout: Option<Duration>,

    #[serde(default = "default_true")]
    pub color: bool,

    #[serde(default = "default_true")]
    pub banner: bool,

    #[serde(skip)]
    config_dir: Option<PathBuf>,
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub base_path: Option<String>,
    pub request_timeout: Option<Duration>,
    pub no_color: bool,
    pub no_banner: bool,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            base_path: String::new(),
            request_timeout: None,
            color: true,
            banner: true,
            config_dir: None,
        }
    }
}

impl ClientConfig {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: Some(config_dir.into()),
            ..Default::default()
        }
    }

    /// Builds the effective configuration: file values first, then overrides.
    pub fn initialize(config_dir: Option<PathBuf>, overrides: ConfigOverrides) -> Self {
        let mut config = match config_dir {
            Some(dir) => ClientConfig::new(dir),
            None => ClientConfig::default(),
        };
        if let Err(e) = config.load() {
            tracing::warn!("ignoring unreadable config file, using defaults: {}", e);
        }

        if let Some(url) = overrides.api_url {
            if !url.is_empty() {
                config.api_url = url;
            }
        }
        if let Some(base_path) = overrides.base_path {
            config.base_path = base_path;
        }
        if overrides.request_timeout.is_some() {
            config.request_timeout = overrides.request_timeout;
        }
        if overrides.no_color {
            config.color = false;
        }
        if overrides.no_banner {
            config.banner = false;
        }
        config
    }

    /// Get the config file path, creating its directory when needed
    pub fn config_file_path(&self) -> ConfigResult<PathBuf> {
        let dir = match &self.config_dir {
            Some(dir) => dir.clone(),
            None => ProjectDirs::from("dev", "poly", "poly-repl")
                .ok_or(ConfigError::NoHomeDir)?
                .config_dir()
                .to_path_buf(),
        };
        ensure_dir(&dir)?;
        Ok(dir.join(CONFIG_FILE_NAME))
    }

    pub fn load(&mut self) -> ConfigResult<()> {
        let file_path = self.config_file_path()?;
        if file_path.exists() {
            let mut file = File::open(&file_path)?;
            let mut contents = String::new();
            file.read_to_string(&mut contents)?;
            let loaded: ClientConfig = serde_json::from_str(&contents)?;
            *self = ClientConfig {
                config_dir: self.config_dir.take(),
                ..loaded
            };
        }
        Ok(())
    }

    pub fn save(&self) -> ConfigResult<PathBuf> {
        let file_path = self.config_file_path()?;
        let json = serde_json::to_string_pretty(self)?;

        let mut file = File::create(&file_path)?;
        file.write_all(json.as_bytes())?;

        Ok(file_path)
    }
}

fn ensure_dir(dir: &Path) -> ConfigResult<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| ConfigError::CreateConfigDir(e.to_string()))?;
    }
    Ok(())
}

pub mod duration_ms_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(duration) => serializer.serialize_some(&(duration.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}
