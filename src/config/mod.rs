//! Configuration layer: typed settings with layered precedence (file → env).

use std::{num::NonZeroUsize, path::Path, path::PathBuf, str::FromStr, time::Duration};

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::views::PageSizes;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "gamecast";
const ENV_PREFIX: &str = "GAMECAST";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_EPISODES_PAGE_SIZE: usize = 10;
const DEFAULT_GAMES_PAGE_SIZE: usize = 27;
const DEFAULT_SEARCH_PAGE_SIZE: usize = 10;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub store: StoreSettings,
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
    pub pages: PageSettings,
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct PageSettings {
    pub episodes: NonZeroUsize,
    pub games: NonZeroUsize,
    pub search: NonZeroUsize,
}

impl From<&PageSettings> for PageSizes {
    fn from(pages: &PageSettings) -> Self {
        Self {
            episodes: pages.episodes.get(),
            games: pages.games.get(),
            search: pages.search.get(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (files → environment).
pub fn load(config_file: Option<&Path>) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = config_file {
        builder = builder.add_source(File::from(path).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let raw: RawSettings = builder.build()?.try_deserialize()?;
    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    store: RawStoreSettings,
    logging: RawLoggingSettings,
    cache: RawCacheSettings,
    pages: RawPageSettings,
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            store,
            logging,
            cache,
            pages,
        } = raw;

        let store = build_store_settings(store)?;
        let logging = build_logging_settings(logging)?;
        let cache = build_cache_settings(cache)?;
        let pages = build_page_settings(pages)?;

        Ok(Self {
            store,
            logging,
            cache,
            pages,
        })
    }
}

fn build_store_settings(store: RawStoreSettings) -> Result<StoreSettings, LoadError> {
    let data_dir = store
        .data_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    if data_dir.as_os_str().is_empty() {
        return Err(LoadError::invalid("store.data_dir", "path must not be empty"));
    }

    Ok(StoreSettings { data_dir })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let ttl_seconds = cache.ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS);
    if ttl_seconds == 0 {
        return Err(LoadError::invalid(
            "cache.ttl_seconds",
            "must be greater than zero",
        ));
    }

    Ok(CacheSettings {
        ttl: Duration::from_secs(ttl_seconds),
    })
}

fn build_page_settings(pages: RawPageSettings) -> Result<PageSettings, LoadError> {
    let episodes = non_zero_usize(
        pages.episodes.unwrap_or(DEFAULT_EPISODES_PAGE_SIZE),
        "pages.episodes",
    )?;
    let games = non_zero_usize(pages.games.unwrap_or(DEFAULT_GAMES_PAGE_SIZE), "pages.games")?;
    let search = non_zero_usize(
        pages.search.unwrap_or(DEFAULT_SEARCH_PAGE_SIZE),
        "pages.search",
    )?;

    Ok(PageSettings {
        episodes,
        games,
        search,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStoreSettings {
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPageSettings {
    episodes: Option<usize>,
    games: Option<usize>,
    search: Option<usize>,
}

fn non_zero_usize(value: usize, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    NonZeroUsize::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}
