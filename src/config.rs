mod config_validator;
pub mod raw_config;

use std::{
    io,
    path::{Path, PathBuf},
};

pub use config_validator::find_config_problems;
pub use raw_config::RawConfig;
use sequence_transform_core::SearchLimits;
use serde::{Deserialize, Deserializer, Serialize};

const APP_DIR: &str = "sequence-transform";
const CONFIG_FILE: &str = "config.toml";

/// Overrides the directory the configuration file lives in.
pub const CONFIG_DIR_ENV: &str = "SEQUENCE_TRANSFORM_CONFIG_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    /// Keys kept in the history, boundary sentinel included.
    pub buffer_capacity: usize,
    /// History is dropped after this long without keys; 0 disables.
    pub idle_timeout_ms: u64,
    /// Also match rules against the text on screen, not only the raw keys.
    pub match_output: bool,
    pub enhanced_backspace: bool,
    /// Search for a missed rule whenever a word ends without one firing.
    pub report_missed_rules: bool,
    pub rule_search_max_window: usize,
    pub rule_search_max_skip: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dictionary_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let limits = SearchLimits::default();
        Self {
            buffer_capacity: 64,
            idle_timeout_ms: 5_000,
            match_output: true,
            enhanced_backspace: true,
            report_missed_rules: true,
            rule_search_max_window: limits.max_window,
            rule_search_max_skip: limits.max_skip_levels,
            dictionary_path: None,
        }
    }
}

pub fn config_path() -> io::Result<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir).join(CONFIG_FILE));
    }

    let base = std::env::var_os("XDG_CONFIG_HOME")
        .or_else(|| std::env::var_os("APPDATA"))
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "neither XDG_CONFIG_HOME nor APPDATA is set",
            )
        })?;

    Ok(PathBuf::from(base).join(APP_DIR).join(CONFIG_FILE))
}

fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    let Some(dir) = path.parent() else {
        return Ok(());
    };
    std::fs::create_dir_all(dir)
}

fn confy_err(e: confy::ConfyError) -> io::Error {
    io::Error::other(e)
}

pub fn load() -> io::Result<Config> {
    let path = config_path()?;
    ensure_parent_dir(&path)?;

    confy::load_path(&path).map_err(confy_err)
}

pub fn save(cfg: &Config) -> io::Result<()> {
    cfg.validate()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let path = config_path()?;
    ensure_parent_dir(&path)?;
    confy::store_path(path, cfg).map_err(confy_err)
}

impl TryFrom<RawConfig> for Config {
    type Error = String;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        let cfg = Self {
            buffer_capacity: raw.buffer_capacity,
            idle_timeout_ms: raw.idle_timeout_ms,
            match_output: raw.match_output,
            enhanced_backspace: raw.enhanced_backspace,
            report_missed_rules: raw.report_missed_rules,
            rule_search_max_window: raw.rule_search_max_window,
            rule_search_max_skip: raw.rule_search_max_skip,
            dictionary_path: raw.dictionary_path,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

impl<'de> Deserialize<'de> for Config {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawConfig::deserialize(deserializer)?;
        Self::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl Config {
    pub fn search_limits(&self) -> SearchLimits {
        SearchLimits {
            max_window: self.rule_search_max_window,
            max_skip_levels: self.rule_search_max_skip,
        }
    }
}
