// src/config/mod.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR_NAME: &str = ".gifpanel";
const CONFIG_FILE_NAME: &str = "config.toml";
const LOG_FILE_NAME: &str = "gifpanel.log";

pub const GIPHY_API_KEY_ENV: &str = "GIPHY_API_KEY";
pub const TENOR_API_KEY_ENV: &str = "TENOR_API_KEY";

const DEFAULT_GIPHY_SEARCH_URL: &str = "https://api.giphy.com/v1/gifs/search";
const DEFAULT_GIPHY_MEDIA_PREFIX: &str = "mxc://giphy.mau.dev/";
const DEFAULT_TENOR_SEARCH_URL: &str = "https://g.tenor.com/v1/search";
const DEFAULT_TENOR_MEDIA_PREFIX: &str = "mxc://tenor.mau.dev/";
pub const DEFAULT_TENOR_LIMIT: u32 = 8;
const DEFAULT_DEBOUNCE_MS: u64 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub search: SearchConfig,
    #[serde(deserialize_with = "giphy_section")]
    pub giphy: ProviderConfig,
    #[serde(deserialize_with = "tenor_section")]
    pub tenor: ProviderConfig,
    pub message: MessageConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: LogLevel,
    /// Close the panel once a sticker has been sent.
    pub exit_on_send: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet interval after the last keystroke before a search fires.
    pub debounce_ms: u64,
    pub request_timeout_secs: u64,
}

/// Endpoint and credential of one GIF provider. An empty `api_key`
/// disables the provider.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProviderConfig {
    pub api_key: String,
    pub media_prefix: String,
    pub search_url: String,
    pub limit: Option<u32>,
}

/// A provider table as written by the user. Missing keys keep the
/// provider's own defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProviderSection {
    api_key: Option<String>,
    media_prefix: Option<String>,
    search_url: Option<String>,
    limit: Option<u32>,
}

impl ProviderSection {
    fn over(self, defaults: ProviderConfig) -> ProviderConfig {
        ProviderConfig {
            api_key: self.api_key.unwrap_or(defaults.api_key),
            media_prefix: self.media_prefix.unwrap_or(defaults.media_prefix),
            search_url: self.search_url.unwrap_or(defaults.search_url),
            limit: self.limit.or(defaults.limit),
        }
    }
}

fn giphy_section<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ProviderConfig, D::Error> {
    ProviderSection::deserialize(deserializer).map(|section| section.over(ProviderConfig::giphy()))
}

fn tenor_section<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ProviderConfig, D::Error> {
    ProviderSection::deserialize(deserializer).map(|section| section.over(ProviderConfig::tenor()))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageConfig {
    pub url_policy: UrlPolicy,
    pub mimetype: Mimetype,
    pub msgtype: MsgType,
}

/// `msgtype` of outgoing stickers. Matrix clients expect `m.image`; hosts
/// that strip the namespace take plain `image`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MsgType {
    #[default]
    #[serde(rename = "m.image")]
    MImage,
    #[serde(rename = "image")]
    Image,
}

impl MsgType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MsgType::MImage => "m.image",
            MsgType::Image => "image",
        }
    }
}

/// How the URL of an outgoing sticker is formed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlPolicy {
    /// `media_prefix` followed by the provider's GIF id.
    #[default]
    MediaPrefix,
    /// The provider-hosted URL of the selected variant.
    Direct,
}

/// Mimetype advertised in outgoing stickers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mimetype {
    #[default]
    Webp,
    Gif,
}

impl Mimetype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mimetype::Webp => "image/webp",
            Mimetype::Gif => "image/gif",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Mimetype::Webp => "webp",
            Mimetype::Gif => "gif",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub config_dir: PathBuf,
    pub log_file: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            exit_on_send: true,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            request_timeout_secs: 10,
        }
    }
}

impl ProviderConfig {
    pub fn giphy() -> Self {
        Self {
            api_key: String::new(),
            media_prefix: DEFAULT_GIPHY_MEDIA_PREFIX.to_string(),
            search_url: DEFAULT_GIPHY_SEARCH_URL.to_string(),
            limit: None,
        }
    }

    pub fn tenor() -> Self {
        Self {
            api_key: String::new(),
            media_prefix: DEFAULT_TENOR_MEDIA_PREFIX.to_string(),
            search_url: DEFAULT_TENOR_SEARCH_URL.to_string(),
            limit: Some(DEFAULT_TENOR_LIMIT),
        }
    }

    pub fn credential(&self) -> Credential {
        Credential {
            api_key: self.api_key.clone(),
            media_prefix: self.media_prefix.clone(),
        }
    }
}

/// The replaceable part of a provider's configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credential {
    pub api_key: String,
    pub media_prefix: String,
}

impl Credential {
    pub fn is_enabled(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Replace the key, and the prefix only when a new one is given.
    pub fn replace(&mut self, api_key: String, media_prefix: Option<String>) {
        self.api_key = api_key;
        if let Some(prefix) = media_prefix.filter(|p| !p.is_empty()) {
            self.media_prefix = prefix;
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let config_dir = get_config_dir();
        Self {
            log_file: config_dir.join(LOG_FILE_NAME),
            config_dir,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            search: SearchConfig::default(),
            giphy: ProviderConfig::giphy(),
            tenor: ProviderConfig::tenor(),
            message: MessageConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Config {
    /// Load the config from `path`, or from `~/.gifpanel/config.toml`.
    /// A missing default file is created with default values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).into_owned()),
            None => get_config_file_path(),
        };

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).context("Failed to read config file")?;
            Self::from_toml(&content)?
        } else if path.is_some() {
            anyhow::bail!("Config file not found: {}", config_path.display());
        } else {
            let config = Self::default();
            config.save(&config_path)?;
            config
        };

        config.apply_key_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content).context("Failed to parse config file")?;
        config.paths.config_dir = expand_path(&config.paths.config_dir);
        config.paths.log_file = expand_path(&config.paths.log_file);
        Ok(config)
    }

    pub fn save(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(config_path, toml_content).context("Failed to write config file")?;

        Ok(())
    }

    /// Fill empty API keys from the environment.
    pub fn apply_key_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for (provider, env_name) in [
            (&mut self.giphy, GIPHY_API_KEY_ENV),
            (&mut self.tenor, TENOR_API_KEY_ENV),
        ] {
            if provider.api_key.is_empty() {
                if let Some(key) = lookup(env_name).filter(|k| !k.is_empty()) {
                    provider.api_key = key;
                }
            }
        }
    }
}

fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

fn get_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

pub fn get_config_file_path() -> PathBuf {
    get_config_dir().join(CONFIG_FILE_NAME)
}
