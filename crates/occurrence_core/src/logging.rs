//! Rotating file log for the occurrence core.
//!
//! # Responsibility
//! - Start one size-rotated `occurrences.log` family per process.
//! - Keep core log lines metadata-only (`key=value`, no person names).
//! - Route panics into the log with person names masked.
//!
//! # Invariants
//! - Starting again with equal `LogSettings` is a no-op.
//! - Starting again with different `LogSettings` fails with `AlreadyStarted`.
//! - Starting never panics.

use flexi_logger::{
    Cleanup, Criterion, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "occurrences";
const ROTATE_AT_BYTES: u64 = 5 * 1024 * 1024;
const KEEP_LOG_FILES: usize = 5;
const PANIC_PAYLOAD_MAX_CHARS: usize = 160;
const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Store, import and service messages quote person names in backticks.
static QUOTED_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`[^`]*`").expect("valid quoted name regex"));

static ACTIVE: OnceCell<Active> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

struct Active {
    settings: LogSettings,
    _handle: LoggerHandle,
}

/// Validated logger configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// One of `trace|debug|info|warn|error`.
    pub level: &'static str,
    /// Absolute directory holding the rotated files.
    pub log_dir: PathBuf,
}

impl LogSettings {
    /// Validates raw flag/env values. `warning` is accepted for `warn`.
    pub fn parse(level: &str, log_dir: &str) -> Result<Self, LoggingError> {
        let wanted = level.trim().to_ascii_lowercase();
        let wanted = if wanted == "warning" { "warn".to_string() } else { wanted };
        let level = LEVELS
            .into_iter()
            .find(|known| *known == wanted)
            .ok_or_else(|| LoggingError::UnknownLevel(level.trim().to_string()))?;

        let log_dir = log_dir.trim();
        if log_dir.is_empty() {
            return Err(LoggingError::MissingDirectory);
        }
        let log_dir = PathBuf::from(log_dir);
        if !log_dir.is_absolute() {
            return Err(LoggingError::RelativeDirectory(log_dir));
        }
        Ok(Self { level, log_dir })
    }
}

/// Why the file log could not be started.
#[derive(Debug)]
pub enum LoggingError {
    UnknownLevel(String),
    MissingDirectory,
    RelativeDirectory(PathBuf),
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    Backend(FlexiLoggerError),
    AlreadyStarted {
        active: LogSettings,
        requested: LogSettings,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLevel(level) => write!(
                f,
                "unknown log level `{level}`; use {}",
                LEVELS.join("|")
            ),
            Self::MissingDirectory => write!(f, "log directory is empty"),
            Self::RelativeDirectory(path) => {
                write!(f, "log directory must be absolute: {}", path.display())
            }
            Self::CreateDirectory { path, source } => {
                write!(f, "cannot create log directory {}: {source}", path.display())
            }
            Self::Backend(err) => write!(f, "file logger failed to start: {err}"),
            Self::AlreadyStarted { active, requested } => write!(
                f,
                "file log already running at {} in {}; cannot restart at {} in {}",
                active.level,
                active.log_dir.display(),
                requested.level,
                requested.log_dir.display()
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDirectory { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FlexiLoggerError> for LoggingError {
    fn from(value: FlexiLoggerError) -> Self {
        Self::Backend(value)
    }
}

/// Starts the file log from raw level and directory values.
///
/// # Errors
/// Invalid settings, an uncreatable directory, a backend failure, or a
/// logger already running with other settings.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), LoggingError> {
    start(LogSettings::parse(level, log_dir)?)
}

/// Starts the file log with already validated settings.
pub fn start(settings: LogSettings) -> Result<(), LoggingError> {
    let active = match ACTIVE.get() {
        Some(active) => active,
        None => ACTIVE.get_or_try_init(|| open(settings.clone()))?,
    };
    // A concurrent first call may have won with other settings.
    if active.settings != settings {
        return Err(LoggingError::AlreadyStarted {
            active: active.settings.clone(),
            requested: settings,
        });
    }
    Ok(())
}

/// Settings of the running logger, or `None` before `start`.
pub fn logging_status() -> Option<LogSettings> {
    ACTIVE.get().map(|active| active.settings.clone())
}

/// `debug` in debug builds, `info` in release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn open(settings: LogSettings) -> Result<Active, LoggingError> {
    create_dir(&settings.log_dir)?;
    let handle = Logger::try_with_str(settings.level)?
        .log_to_file(
            FileSpec::default()
                .directory(&settings.log_dir)
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()?;
    install_panic_hook();

    info!(
        "event=logging_start module=logging status=ok version={} os={} debug_build={} level={} log_dir={}",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        cfg!(debug_assertions),
        settings.level,
        settings.log_dir.display()
    );
    Ok(Active {
        settings,
        _handle: handle,
    })
}

fn create_dir(path: &Path) -> Result<(), LoggingError> {
    std::fs::create_dir_all(path).map_err(|source| LoggingError::CreateDirectory {
        path: path.to_path_buf(),
        source,
    })
}

fn install_panic_hook() {
    if PANIC_HOOK.set(()).is_err() {
        return;
    }
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map_or_else(|| "unknown".to_string(), |loc| format!("{}:{}", loc.file(), loc.line()));
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "<non-string payload>".to_string());
        error!(
            "event=panic module=logging status=error location={} payload={}",
            location,
            masked_payload(&payload)
        );
        previous(info);
    }));
}

/// One line, person names masked, at most `PANIC_PAYLOAD_MAX_CHARS` chars.
fn masked_payload(payload: &str) -> String {
    let masked = QUOTED_NAME_RE.replace_all(payload, "`*`");
    let flat = masked.replace(['\r', '\n'], " ");
    if flat.chars().count() <= PANIC_PAYLOAD_MAX_CHARS {
        return flat;
    }
    let mut cut: String = flat.chars().take(PANIC_PAYLOAD_MAX_CHARS).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_normalize_level_and_require_absolute_dir() {
        let dir = std::env::temp_dir();
        let dir_text = dir.to_str().unwrap();

        assert_eq!(LogSettings::parse(" DEBUG ", dir_text).unwrap().level, "debug");
        assert_eq!(LogSettings::parse("warning", dir_text).unwrap().level, "warn");
        assert!(matches!(
            LogSettings::parse("verbose", dir_text),
            Err(LoggingError::UnknownLevel(level)) if level == "verbose"
        ));
        assert!(matches!(
            LogSettings::parse("info", "  "),
            Err(LoggingError::MissingDirectory)
        ));
        assert!(matches!(
            LogSettings::parse("info", "logs/dev"),
            Err(LoggingError::RelativeDirectory(_))
        ));
    }

    #[test]
    fn panic_payload_hides_names_and_stays_on_one_line() {
        let payload = "line 4: `José Silva` is listed as P0009\nbut was imported as P0001";
        let masked = masked_payload(payload);
        assert!(!masked.contains("José"));
        assert!(!masked.contains('\n'));
        assert!(masked.starts_with("line 4: `*` is listed"));

        let long = "x".repeat(PANIC_PAYLOAD_MAX_CHARS + 10);
        assert_eq!(
            masked_payload(&long).chars().count(),
            PANIC_PAYLOAD_MAX_CHARS + 3
        );
    }

    #[test]
    fn restart_with_same_settings_is_a_no_op_and_other_settings_fail() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let first_dir = first.path().to_str().unwrap();
        let second_dir = second.path().to_str().unwrap();

        init_logging("info", first_dir).unwrap();
        init_logging("INFO", first_dir).unwrap();

        assert!(matches!(
            init_logging("debug", first_dir),
            Err(LoggingError::AlreadyStarted { .. })
        ));
        let err = init_logging("info", second_dir).unwrap_err();
        assert!(err.to_string().contains("already running"));

        let active = logging_status().unwrap();
        assert_eq!(active.level, "info");
        assert_eq!(active.log_dir, first.path());
    }
}
