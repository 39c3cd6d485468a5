use serde::Deserialize;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Optional TOML file with the full configuration.
pub const CONFIG_ENV: &str = "LLAMUTA_CONFIG";
/// Path of the dictionary source; overrides the config file.
pub const DICTIONARY_ENV: &str = "LLAMUTA_DICT";
/// Strategy name; overrides the config file.
pub const STRATEGY_ENV: &str = "LLAMUTA_STRATEGY";
/// Append-only log file; overrides the config file.
pub const LOG_FILE_ENV: &str = "LLAMUTA_LOG";

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    #[default]
    Dictionary,
    Placeholder,
    Xml,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Dictionary => "dictionary",
            StrategyKind::Placeholder => "placeholder",
            StrategyKind::Xml => "xml",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown mutation strategy `{0}` (expected dictionary, placeholder or xml)")]
pub struct UnknownStrategy(pub String);

impl FromStr for StrategyKind {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dictionary" | "dict" => Ok(StrategyKind::Dictionary),
            "placeholder" | "passthrough" => Ok(StrategyKind::Placeholder),
            "xml" => Ok(StrategyKind::Xml),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct LogSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct LlamutaConfig {
    #[serde(default)]
    pub strategy: StrategyKind,
    #[serde(default)]
    pub dictionary: Option<PathBuf>,
    #[serde(default)]
    pub log: LogSettings,
}

impl LlamutaConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file at {:?}: {}", path, e))?;

        let config: LlamutaConfig = toml::from_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse TOML from config file {:?}: {}", path, e)
        })?;

        Ok(config)
    }

    /// Builds the configuration from the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_env_with(|key| std::env::var_os(key))
    }

    /// Builds the configuration from `lookup`, which stands in for the environment.
    ///
    /// `LLAMUTA_CONFIG` is loaded first when present; `LLAMUTA_DICT`, `LLAMUTA_STRATEGY`
    /// and `LLAMUTA_LOG` then override the matching fields. Empty values are ignored.
    pub fn from_env_with<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let mut config = match non_empty(CONFIG_ENV) {
            Some(path) => Self::load_from_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(path) = non_empty(DICTIONARY_ENV) {
            config.dictionary = Some(PathBuf::from(path));
        }
        if let Some(name) = non_empty(STRATEGY_ENV) {
            config.strategy = name.to_string_lossy().parse()?;
        }
        if let Some(path) = non_empty(LOG_FILE_ENV) {
            config.log.file = Some(PathBuf::from(path));
        }

        Ok(config)
    }
}
