// Configuration loading and parsing (fastbreak.toml).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::engine::DraftSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

/// Assembled runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub draft: DraftSettings,
    pub ws_port: u16,
    pub db_path: String,
}

// ---------------------------------------------------------------------------
// fastbreak.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    draft: DraftSection,
    #[serde(default)]
    server: ServerSection,
}

#[derive(Debug, Clone, Deserialize)]
struct DraftSection {
    #[serde(default = "default_total_rounds")]
    total_rounds: u32,
    #[serde(default = "default_seconds_per_pick")]
    seconds_per_pick: u32,
    #[serde(default = "default_max_teams")]
    default_max_teams: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct ServerSection {
    #[serde(default = "default_ws_port")]
    ws_port: u16,
    /// Overrides the platform data-dir default.
    #[serde(default)]
    db_path: Option<String>,
}

fn default_total_rounds() -> u32 {
    13
}
fn default_seconds_per_pick() -> u32 {
    90
}
fn default_max_teams() -> u32 {
    10
}
fn default_ws_port() -> u16 {
    9001
}

impl Default for DraftSection {
    fn default() -> Self {
        DraftSection {
            total_rounds: default_total_rounds(),
            seconds_per_pick: default_seconds_per_pick(),
            default_max_teams: default_max_teams(),
        }
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        ServerSection {
            ws_port: default_ws_port(),
            db_path: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load configuration.
///
/// Reads the path in `FASTBREAK_CONFIG` when set (the file must exist), else
/// `fastbreak.toml` in the platform config dir, falling back to built-in
/// defaults when no file is present.
pub fn load_config() -> Result<Config, ConfigError> {
    if let Ok(path) = std::env::var("FASTBREAK_CONFIG") {
        return load_from_path(Path::new(&path));
    }

    let default_path = config_dir().join("fastbreak.toml");
    if default_path.exists() {
        load_from_path(&default_path)
    } else {
        assemble(ConfigFile::default())
    }
}

/// Load configuration from an explicit file path.
pub fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ConfigFile = toml::from_str(&raw).map_err(|source| ConfigError::ParseError {
        path: path.to_path_buf(),
        source,
    })?;
    assemble(file)
}

/// Parse configuration from TOML text (tests, embedded defaults).
pub fn from_toml_str(raw: &str) -> Result<Config, ConfigError> {
    let file: ConfigFile = toml::from_str(raw).map_err(|source| ConfigError::ParseError {
        path: PathBuf::from("<inline>"),
        source,
    })?;
    assemble(file)
}

fn assemble(file: ConfigFile) -> Result<Config, ConfigError> {
    let config = Config {
        draft: DraftSettings {
            total_rounds: file.draft.total_rounds,
            seconds_per_pick: file.draft.seconds_per_pick,
            default_max_teams: file.draft.default_max_teams,
        },
        ws_port: file.server.ws_port,
        db_path: file
            .server
            .db_path
            .unwrap_or_else(|| data_dir().join("fastbreak.db").to_string_lossy().into_owned()),
    };
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.draft.total_rounds == 0 {
        return Err(ConfigError::ValidationError {
            field: "draft.total_rounds".into(),
            message: "must be at least 1".into(),
        });
    }
    if config.draft.seconds_per_pick == 0 {
        return Err(ConfigError::ValidationError {
            field: "draft.seconds_per_pick".into(),
            message: "must be at least 1".into(),
        });
    }
    if config.draft.default_max_teams < 2 {
        return Err(ConfigError::ValidationError {
            field: "draft.default_max_teams".into(),
            message: "a draft needs at least 2 teams".into(),
        });
    }
    Ok(())
}

fn config_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "fastbreak")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "fastbreak")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
