//! Server configuration loaded from TOML.
//!
//! # Invariants
//! - A `Config` returned by [`load`] or [`parse`] has passed [`validate`].

use notekeep_core::logging::is_supported_level;
use notekeep_core::LogSettings;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

const DEFAULT_SESSION_TTL_SECS: u64 = 14 * 24 * 60 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: Service,
    pub storage: Storage,
    #[serde(default)]
    pub sessions: Sessions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
    pub http_bind: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Absolute directory for rotating log files; stderr when absent.
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
    pub db_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sessions {
    #[serde(default = "default_session_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default)]
    pub cookie_secure: bool,
}

impl Default for Sessions {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_SESSION_TTL_SECS,
            cookie_secure: false,
        }
    }
}

impl Config {
    /// Parsed `service.http_bind`.
    pub fn http_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.service
            .http_bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Validation {
                message: format!(
                    "service.http_bind `{}` is not a socket address",
                    self.service.http_bind
                ),
            })
    }

    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            level: self.service.log_level.clone(),
            log_dir: self.service.log_dir.clone(),
        }
    }
}

fn default_log_level() -> String {
    notekeep_core::default_log_level().to_string()
}

fn default_session_ttl_secs() -> u64 {
    DEFAULT_SESSION_TTL_SECS
}

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Validation {
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, .. } => {
                write!(f, "failed to read config file at `{}`", path.display())
            }
            Self::Parse { path, .. } => {
                write!(f, "failed to parse config file at `{}`", path.display())
            }
            Self::Validation { message } => f.write_str(message),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Validation { .. } => None,
        }
    }
}

/// Reads, parses and validates a config file.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&raw).map_err(|err| match err {
        ConfigError::Parse { source, .. } => ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

/// Parses and validates TOML text.
pub fn parse(raw: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(raw).map_err(|source| ConfigError::Parse {
        path: PathBuf::new(),
        source,
    })?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<(), ConfigError> {
    config.http_addr()?;

    if config.storage.db_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation {
            message: "storage.db_path must be non-empty".to_string(),
        });
    }
    if config.sessions.ttl_secs == 0 {
        return Err(ConfigError::Validation {
            message: "sessions.ttl_secs must be greater than zero".to_string(),
        });
    }
    if !is_supported_level(&config.service.log_level) {
        return Err(ConfigError::Validation {
            message: format!(
                "service.log_level `{}` must be one of trace, debug, info, warn or error",
                config.service.log_level
            ),
        });
    }
    if let Some(dir) = &config.service.log_dir {
        if !dir.is_absolute() {
            return Err(ConfigError::Validation {
                message: format!("service.log_dir `{}` must be absolute", dir.display()),
            });
        }
    }

    Ok(())
}
