//! Application configuration: storage root, catalog host and timeouts.
//!
//! Values come from three layers, highest priority first: command-line flags
//! (applied by the binary), the config file, and the defaults below. The file
//! is a flat list of `key = value` lines with `#` comments:
//!
//! ```text
//! storage_root = "~/Books/Alexandria"
//! catalog_host = "http://libgen.is"
//! connect_timeout_secs = 15
//! read_timeout_secs = 60
//! transfer_timeout_secs = 300
//! mirror_slot = "secondary"  # or "primary"
//! ```

use std::env;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::http::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS, HttpTimeouts};
use crate::library::LocalLibrary;
use crate::mirror::MirrorSlot;
use crate::search::DEFAULT_CATALOG_HOST;

/// Default read timeout for book and cover bodies (seconds).
pub const DEFAULT_TRANSFER_TIMEOUT_SECS: u64 = 300;

/// Accepted range for every timeout value (seconds).
pub const TIMEOUT_RANGE_SECS: std::ops::RangeInclusive<u64> = 1..=3600;

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config syntax on line {line}: expected key = value")]
    Syntax { line: usize },

    #[error("unknown configuration key '{key}' on line {line}")]
    UnknownKey { key: String, line: usize },

    #[error("invalid `{key}` value on line {line}: {reason}")]
    InvalidValue {
        key: String,
        line: usize,
        reason: String,
    },

    #[error("invalid config value for `{key}`: {value}. Expected range: {min}..={max}")]
    OutOfRange {
        key: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    #[error("invalid catalog host '{0}': expected an http(s) URL")]
    InvalidHost(String),
}

impl ConfigError {
    fn invalid_value(key: &str, line: usize, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            line,
            reason: reason.into(),
        }
    }
}

/// Effective configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory holding one subdirectory per book.
    pub storage_root: PathBuf,
    /// Base URL of the catalog mirror, e.g. `http://libgen.is`.
    pub catalog_host: String,
    pub connect_timeout_secs: u64,
    /// Read timeout for search and mirror pages.
    pub read_timeout_secs: u64,
    /// Longest gap between received chunks of a book or cover body.
    pub transfer_timeout_secs: u64,
    /// Which scraped mirror column downloads use.
    pub mirror_slot: MirrorSlot,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_root: LocalLibrary::default_root(),
            catalog_host: DEFAULT_CATALOG_HOST.to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
            transfer_timeout_secs: DEFAULT_TRANSFER_TIMEOUT_SECS,
            mirror_slot: MirrorSlot::default(),
        }
    }
}

impl AppConfig {
    /// Defaults overlaid with the config file at the default path, if any.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read, parsed or
    /// validated.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(file) = load_default_file_config()? {
            config.apply_file(file);
        }
        config.validate()?;
        Ok(config)
    }

    /// Overlays every value set in `file`.
    pub fn apply_file(&mut self, file: FileConfig) {
        if let Some(storage_root) = file.storage_root {
            self.storage_root = storage_root;
        }
        if let Some(catalog_host) = file.catalog_host {
            self.catalog_host = catalog_host;
        }
        if let Some(secs) = file.connect_timeout_secs {
            self.connect_timeout_secs = secs;
        }
        if let Some(secs) = file.read_timeout_secs {
            self.read_timeout_secs = secs;
        }
        if let Some(secs) = file.transfer_timeout_secs {
            self.transfer_timeout_secs = secs;
        }
        if let Some(slot) = file.mirror_slot {
            self.mirror_slot = slot;
        }
    }

    /// Checks timeout ranges and the catalog host.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        validate_timeout_secs("transfer_timeout_secs", self.transfer_timeout_secs)?;
        validate_host(&self.catalog_host)
    }

    /// Timeouts for search and mirror page fetches.
    #[must_use]
    pub fn page_timeouts(&self) -> HttpTimeouts {
        HttpTimeouts {
            connect_secs: self.connect_timeout_secs,
            read_secs: self.read_timeout_secs,
        }
    }

    /// Timeouts for book and cover transfers.
    #[must_use]
    pub fn transfer_timeouts(&self) -> HttpTimeouts {
        HttpTimeouts {
            connect_secs: self.connect_timeout_secs,
            read_secs: self.transfer_timeout_secs,
        }
    }
}

fn validate_timeout_secs(key: &'static str, value: u64) -> Result<(), ConfigError> {
    if TIMEOUT_RANGE_SECS.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            key,
            value,
            min: *TIMEOUT_RANGE_SECS.start(),
            max: *TIMEOUT_RANGE_SECS.end(),
        })
    }
}

fn validate_host(host: &str) -> Result<(), ConfigError> {
    match Url::parse(host) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => Ok(()),
        _ => Err(ConfigError::InvalidHost(host.to_string())),
    }
}

/// Values present in a config file; unset keys are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    pub storage_root: Option<PathBuf>,
    pub catalog_host: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
    pub transfer_timeout_secs: Option<u64>,
    pub mirror_slot: Option<MirrorSlot>,
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/alexandria/config.toml`
/// 2. `$HOME/.config/alexandria/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("alexandria")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("alexandria")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file at the default path; `None` when there is none.
///
/// # Errors
///
/// Returns an error when the file exists but is unreadable or invalid.
pub fn load_default_file_config() -> Result<Option<FileConfig>, ConfigError> {
    let Some(path) = resolve_default_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        debug!(path = %path.display(), "no config file");
        return Ok(None);
    }
    load_file_config(&path).map(Some)
}

/// Reads and parses the config file at `path`.
///
/// # Errors
///
/// Returns an error when the file is unreadable or invalid.
pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config_str(&raw)?;
    debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Parses config file contents.
///
/// # Errors
///
/// Returns an error for malformed lines, unknown keys and out-of-range values.
pub fn parse_config_str(raw: &str) -> Result<FileConfig, ConfigError> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            return Err(ConfigError::Syntax { line: line_no });
        };
        let key = raw_key.trim();
        let value = raw_value.trim();

        match key {
            "storage_root" => {
                let parsed = parse_string_literal(key, line_no, value)?;
                cfg.storage_root = Some(expand_home(&parsed));
            }
            "catalog_host" => {
                let parsed = parse_string_literal(key, line_no, value)?;
                validate_host(&parsed)?;
                cfg.catalog_host = Some(parsed);
            }
            "connect_timeout_secs" => {
                let parsed = parse_integer_u64(key, line_no, value)?;
                validate_timeout_secs("connect_timeout_secs", parsed)?;
                cfg.connect_timeout_secs = Some(parsed);
            }
            "read_timeout_secs" => {
                let parsed = parse_integer_u64(key, line_no, value)?;
                validate_timeout_secs("read_timeout_secs", parsed)?;
                cfg.read_timeout_secs = Some(parsed);
            }
            "transfer_timeout_secs" => {
                let parsed = parse_integer_u64(key, line_no, value)?;
                validate_timeout_secs("transfer_timeout_secs", parsed)?;
                cfg.transfer_timeout_secs = Some(parsed);
            }
            "mirror_slot" => {
                let parsed = parse_string_literal(key, line_no, value)?;
                let slot = parsed.parse::<MirrorSlot>().map_err(|_| {
                    ConfigError::invalid_value(key, line_no, "expected \"primary\" or \"secondary\"")
                })?;
                cfg.mirror_slot = Some(slot);
            }
            unknown => {
                return Err(ConfigError::UnknownKey {
                    key: unknown.to_string(),
                    line: line_no,
                });
            }
        }
    }
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(key: &str, line: usize, raw_value: &str) -> Result<String, ConfigError> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        return Err(ConfigError::invalid_value(key, line, "expected double-quoted string"));
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(key: &str, line: usize, raw_value: &str) -> Result<u64, ConfigError> {
    let token = raw_value.trim();
    if token.is_empty() {
        return Err(ConfigError::invalid_value(key, line, "expected integer value"));
    }
    token
        .parse::<u64>()
        .map_err(|e| ConfigError::invalid_value(key, line, e.to_string()))
}

/// Expands a leading `~/` to the home directory.
fn expand_home(raw: &str) -> PathBuf {
    match (raw.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}
