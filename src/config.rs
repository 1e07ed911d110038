use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use log::warn;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

const DEFAULT_BASE_URL: &str = "https://www.trae.ai";
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;
const MIN_REFRESH_INTERVAL_SECS: u64 = 1;
const MAX_REFRESH_INTERVAL_SECS: u64 = 3600;

/// The env config env vars needed for reaching the account pages.
#[derive(Debug, Deserialize)]
pub struct ScrapingEnv {
    trae_base_url: Option<String>,
    trae_cookie: Option<String>,
}

pub struct ScrapingConfig {
    base_url: String,
    cookie: Option<String>,
}

impl ScrapingConfig {
    pub fn new() -> anyhow::Result<Self> {
        let scraping_env = ScrapingEnv::load_from_env()?;
        Ok(Self {
            base_url: scraping_env
                .trae_base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            cookie: scraping_env.trae_cookie,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }
}

/// The persisted app config the presentation layer reads and writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub refresh_interval_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            refresh_interval_seconds: DEFAULT_REFRESH_INTERVAL_SECS,
        }
    }
}

/// JSON-file persistence for [`AppConfig`]. Unreadable or unparsable files
/// fall back to the default, which is also written out on first load so the
/// file always exists afterwards.
pub struct AppConfigStore {
    path: PathBuf,
}

impl AppConfigStore {
    pub fn new() -> anyhow::Result<Self> {
        let dir = dirs::config_dir()
            .context("no config directory on this platform")?
            .join("traemon");
        Ok(Self {
            path: dir.join("app-config.json"),
        })
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> AppConfig {
        match fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    warn!("app config unparsable, using defaults: {e}");
                    AppConfig::default()
                }
            },
            Err(_) => {
                let config = AppConfig::default();
                self.save(&config);
                config
            }
        }
    }

    // Persistence is best-effort: a read-only disk should not take the
    // widget down.
    pub fn save(&self, config: &AppConfig) {
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        match serde_json::to_string(config) {
            Ok(contents) => {
                if let Err(e) = fs::write(&self.path, contents) {
                    warn!("failed to save app config: {e}");
                }
            }
            Err(e) => warn!("failed to serialize app config: {e}"),
        }
    }

    pub fn update_refresh_interval(&self, seconds: u64) -> AppConfig {
        let mut config = self.load();
        config.refresh_interval_seconds =
            seconds.clamp(MIN_REFRESH_INTERVAL_SECS, MAX_REFRESH_INTERVAL_SECS);
        self.save(&config);
        config
    }
}

// Extension trait.
pub trait LoadFromEnv: DeserializeOwned {
    fn load_from_env() -> anyhow::Result<Self> {
        // Don't throw an error if .env file doesn't exist.
        let _ = dotenv::dotenv();
        let config =
            envy::from_env::<Self>().context("failed to load env variables into config struct")?;
        Ok(config)
    }
}

impl<T: DeserializeOwned> LoadFromEnv for T {}
