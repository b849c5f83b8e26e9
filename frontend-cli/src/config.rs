//! Configuration loaded from `~/.config/reaper/config.toml`.
//!
//! Every field is optional; a missing file yields the built-in defaults.
//!
//! ```toml
//! [dev]
//! markers = ["jest", "vitest"]
//! default_ports = [8082, 8081]
//! grace_period_ms = 1000
//! listener_backends = ["procfs", "lsof", "ss"]
//!
//! [emulator]
//! pattern = "emulator"
//! exclude = ["grep"]
//! ```

use anyhow::{Context, Result};
use backend::{EmulatorFilter, ListenerBackend, DEFAULT_GRACE, DEFAULT_MARKERS, DEFAULT_PORTS};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const CONFIG_DIR: &str = "reaper";
const CONFIG_FILENAME: &str = "config.toml";
const MAX_GRACE_MS: u64 = 60_000;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("listener_backends must name at least one backend")]
    NoBackends,
    #[error("unknown listener backend '{0}'")]
    UnknownBackend(String),
    #[error("grace_period_ms must be at most {max}, got {0}", max = MAX_GRACE_MS)]
    GraceTooLong(u64),
    #[error("emulator pattern must not be empty")]
    EmptyPattern,
    #[error("dev markers must not contain an empty entry")]
    EmptyMarker,
    #[error("emulator exclude must not contain an empty entry")]
    EmptyExclude,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dev: DevConfig,
    pub emulator: EmulatorConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DevConfig {
    pub markers: Vec<String>,
    pub default_ports: Vec<u16>,
    pub grace_period_ms: u64,
    pub listener_backends: Vec<String>,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            markers: DEFAULT_MARKERS.iter().map(|m| m.to_string()).collect(),
            default_ports: DEFAULT_PORTS.to_vec(),
            grace_period_ms: DEFAULT_GRACE.as_millis() as u64,
            listener_backends: ListenerBackend::ALL.iter().map(|b| b.to_string()).collect(),
        }
    }
}

impl DevConfig {
    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn backends(&self) -> Result<Vec<ListenerBackend>, ConfigError> {
        if self.listener_backends.is_empty() {
            return Err(ConfigError::NoBackends);
        }
        self.listener_backends
            .iter()
            .map(|name| {
                name.parse::<ListenerBackend>()
                    .map_err(|_| ConfigError::UnknownBackend(name.clone()))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    pub pattern: String,
    pub exclude: Vec<String>,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        let filter = EmulatorFilter::default();
        Self {
            pattern: filter.pattern,
            exclude: filter.exclude,
        }
    }
}

impl EmulatorConfig {
    pub fn filter(&self) -> EmulatorFilter {
        EmulatorFilter {
            pattern: self.pattern.clone(),
            exclude: self.exclude.clone(),
        }
    }
}

/// Check values serde cannot.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    config.dev.backends()?;
    if config.dev.grace_period_ms > MAX_GRACE_MS {
        return Err(ConfigError::GraceTooLong(config.dev.grace_period_ms));
    }
    // an empty needle is contained in every command line
    if config.dev.markers.iter().any(|m| is_blank(m)) {
        return Err(ConfigError::EmptyMarker);
    }
    if is_blank(&config.emulator.pattern) {
        return Err(ConfigError::EmptyPattern);
    }
    if config.emulator.exclude.iter().any(|x| is_blank(x)) {
        return Err(ConfigError::EmptyExclude);
    }
    Ok(())
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Returns the path to `~/.config/reaper/config.toml`.
pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join(CONFIG_DIR).join(CONFIG_FILENAME))
}

/// Load the configuration.
///
/// An explicit `path` must exist. The default location may be absent, in
/// which case the defaults are returned.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => load_config_from(p, true),
        None => load_config_from(&default_config_path()?, false),
    }
}

/// Load `path`, falling back to defaults when it is absent and not `required`.
pub fn load_config_from(path: &Path, required: bool) -> Result<Config> {
    if !required && !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = parse_config(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_library_constants() {
        let config = Config::default();
        assert_eq!(config.dev.default_ports, vec![8082, 8081]);
        assert_eq!(config.dev.markers.len(), 4);
        assert_eq!(config.dev.grace(), Duration::from_secs(1));
        assert_eq!(config.dev.backends().unwrap(), ListenerBackend::ALL.to_vec());
        assert_eq!(config.emulator.filter(), EmulatorFilter::default());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = parse_config("[dev]\ndefault_ports = [3000]\n").unwrap();
        assert_eq!(config.dev.default_ports, vec![3000]);
        assert_eq!(config.dev.grace_period_ms, 1000);
        assert_eq!(config.emulator, EmulatorConfig::default());
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(parse_config("").unwrap(), Config::default());
    }

    #[test]
    fn rejects_bad_values() {
        let err = validate_config(&Config {
            dev: DevConfig {
                listener_backends: vec!["netstat".into()],
                ..Default::default()
            },
            ..Default::default()
        });
        assert_eq!(err, Err(ConfigError::UnknownBackend("netstat".into())));

        let err = validate_config(&Config {
            dev: DevConfig {
                listener_backends: vec![],
                ..Default::default()
            },
            ..Default::default()
        });
        assert_eq!(err, Err(ConfigError::NoBackends));

        assert!(parse_config("[dev]\ngrace_period_ms = 120000\n").is_err());
        assert!(parse_config("[emulator]\npattern = \"\"\n").is_err());
        assert!(parse_config("[dev]\ndefault_ports = [\"x\"]\n").is_err());
    }

    #[test]
    fn load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[dev]\nlistener_backends = [\"ss\"]\n[emulator]\nexclude = [\"grep\", \"adb\"]\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.dev.backends().unwrap(), vec![ListenerBackend::Ss]);
        assert_eq!(config.emulator.exclude, vec!["grep", "adb"]);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn absent_default_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_DIR).join(CONFIG_FILENAME);
        assert_eq!(load_config_from(&path, false).unwrap(), Config::default());
        assert!(load_config_from(&path, true).is_err());
    }

    #[test]
    fn present_default_file_is_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "[dev]
default_ports = [4000]
").unwrap();
        let config = load_config_from(&path, false).unwrap();
        assert_eq!(config.dev.default_ports, vec![4000]);
    }

    #[test]
    fn blank_markers_are_rejected() {
        let with_markers = |markers: &[&str]| Config {
            dev: DevConfig {
                markers: markers.iter().map(|m| m.to_string()).collect(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            validate_config(&with_markers(&["jest", ""])),
            Err(ConfigError::EmptyMarker)
        );
        assert_eq!(
            validate_config(&with_markers(&["  "])),
            Err(ConfigError::EmptyMarker)
        );
        assert!(validate_config(&with_markers(&[])).is_ok());
        assert!(parse_config("[dev]\nmarkers = [\"jest\", \"\"]\n").is_err());
    }

    #[test]
    fn blank_emulator_pattern_and_excludes_are_rejected() {
        let err = validate_config(&Config {
            emulator: EmulatorConfig {
                pattern: " \t".into(),
                ..Default::default()
            },
            ..Default::default()
        });
        assert_eq!(err, Err(ConfigError::EmptyPattern));

        let err = validate_config(&Config {
            emulator: EmulatorConfig {
                exclude: vec!["grep".into(), " ".into()],
                ..Default::default()
            },
            ..Default::default()
        });
        assert_eq!(err, Err(ConfigError::EmptyExclude));
    }
}
