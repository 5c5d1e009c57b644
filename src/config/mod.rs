//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

mod cli;

pub use cli::{CliArgs, Command, GlobalOverrides, SetArgs, ShowArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "vitrine";
const DEFAULT_HISTORY_CAPACITY: u64 = 20;
const DEFAULT_COMMIT_DEBOUNCE_MS: u64 = 100;
const DEFAULT_AUTOSAVE_DEBOUNCE_MS: u64 = 600;
const DEFAULT_HIGHLIGHT_MS: u64 = 2500;
const DEFAULT_STORAGE_DIRECTORY: &str = "content";
const DEFAULT_CACHE_TTL_MS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub editor: EditorSettings,
    pub storage: StorageSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSettings {
    pub history_capacity: usize,
    pub commit_debounce: Duration,
    pub autosave_debounce: Duration,
    pub highlight: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    pub directory: PathBuf,
    /// Zero disables the content cache.
    pub cache_ttl: Duration,
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

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("VITRINE").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    editor: RawEditorSettings,
    storage: RawStorageSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(directory) = overrides.storage_directory.as_ref() {
            self.storage.directory = Some(directory.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        Ok(Self {
            logging: build_logging_settings(raw.logging)?,
            editor: build_editor_settings(raw.editor)?,
            storage: build_storage_settings(raw.storage)?,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            logging: LoggingSettings {
                level: LevelFilter::INFO,
                format: LogFormat::Compact,
            },
            editor: EditorSettings {
                history_capacity: DEFAULT_HISTORY_CAPACITY as usize,
                commit_debounce: Duration::from_millis(DEFAULT_COMMIT_DEBOUNCE_MS),
                autosave_debounce: Duration::from_millis(DEFAULT_AUTOSAVE_DEBOUNCE_MS),
                highlight: Duration::from_millis(DEFAULT_HIGHLIGHT_MS),
            },
            storage: StorageSettings {
                directory: PathBuf::from(DEFAULT_STORAGE_DIRECTORY),
                cache_ttl: Duration::from_millis(DEFAULT_CACHE_TTL_MS),
            },
        }
    }
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

fn build_editor_settings(editor: RawEditorSettings) -> Result<EditorSettings, LoadError> {
    let history_capacity = non_zero(
        editor.history_capacity.unwrap_or(DEFAULT_HISTORY_CAPACITY),
        "editor.history_capacity",
    )?;
    let history_capacity = usize::try_from(history_capacity).map_err(|_| {
        LoadError::invalid(
            "editor.history_capacity",
            "value exceeds supported range for usize",
        )
    })?;

    let commit_ms = non_zero(
        editor
            .commit_debounce_ms
            .unwrap_or(DEFAULT_COMMIT_DEBOUNCE_MS),
        "editor.commit_debounce_ms",
    )?;
    let autosave_ms = non_zero(
        editor
            .autosave_debounce_ms
            .unwrap_or(DEFAULT_AUTOSAVE_DEBOUNCE_MS),
        "editor.autosave_debounce_ms",
    )?;
    if autosave_ms < commit_ms {
        return Err(LoadError::invalid(
            "editor.autosave_debounce_ms",
            format!("must not be shorter than editor.commit_debounce_ms ({commit_ms})"),
        ));
    }
    let highlight_ms = non_zero(
        editor.highlight_ms.unwrap_or(DEFAULT_HIGHLIGHT_MS),
        "editor.highlight_ms",
    )?;

    Ok(EditorSettings {
        history_capacity,
        commit_debounce: Duration::from_millis(commit_ms),
        autosave_debounce: Duration::from_millis(autosave_ms),
        highlight: Duration::from_millis(highlight_ms),
    })
}

fn build_storage_settings(storage: RawStorageSettings) -> Result<StorageSettings, LoadError> {
    let directory = storage
        .directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIRECTORY));
    if directory.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "storage.directory",
            "directory path must not be empty",
        ));
    }

    let cache_ttl = Duration::from_millis(storage.cache_ttl_ms.unwrap_or(DEFAULT_CACHE_TTL_MS));

    Ok(StorageSettings {
        directory,
        cache_ttl,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawEditorSettings {
    history_capacity: Option<u64>,
    commit_debounce_ms: Option<u64>,
    autosave_debounce_ms: Option<u64>,
    highlight_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStorageSettings {
    directory: Option<PathBuf>,
    cache_ttl_ms: Option<u64>,
}

fn non_zero(value: u64, key: &'static str) -> Result<u64, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(value)
}
