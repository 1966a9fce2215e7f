//! Process-wide logging setup for the radar.
//!
//! # Responsibility
//! - Route `log` records to rolling files or, for one-shot CLI runs, to
//!   stderr so stdout stays free for command output.
//! - Capture panics as structured events.
//!
//! # Invariants
//! - The backend starts at most once per process; a repeated call with the
//!   same `LogConfig` is a no-op, a different one is rejected.
//! - Log lines carry ids and counts only, never item titles or URLs.

use flexi_logger::{
    detailed_format, Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "radar";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_ROTATED_FILES: usize = 5;
const PANIC_SUMMARY_CHARS: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

/// Accepted verbosity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    /// Case-insensitive; `warning` is accepted as `warn`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "off" => Some(Self::Off),
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }
}

/// Where log records go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    /// Rolling `radar*.log` files inside an absolute directory.
    Directory(PathBuf),
    Stderr,
}

impl Display for LogSink {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Directory(dir) => write!(f, "{}", dir.display()),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

/// Complete logging configuration of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: LogLevel,
    pub sink: LogSink,
}

#[derive(Debug)]
pub enum LoggingError {
    UnknownLevel(String),
    InvalidDirectory(String),
    Io { path: PathBuf, source: std::io::Error },
    Backend(flexi_logger::FlexiLoggerError),
    /// Logging already runs with another configuration.
    Conflict { active: LogConfig, requested: LogConfig },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error|off"
            ),
            Self::InvalidDirectory(reason) => write!(f, "invalid log directory: {reason}"),
            Self::Io { path, source } => {
                write!(f, "cannot create log directory `{}`: {source}", path.display())
            }
            Self::Backend(err) => write!(f, "logger backend failed: {err}"),
            Self::Conflict { active, requested } => write!(
                f,
                "logging already runs at {} ({}); refusing {} ({})",
                active.level.as_str(),
                active.sink,
                requested.level.as_str(),
                requested.sink
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

struct ActiveLogger {
    config: LogConfig,
    _handle: LoggerHandle,
}

/// Starts rolling file logging in `log_dir`.
///
/// # Errors
/// - `UnknownLevel` for an unsupported `level`.
/// - `InvalidDirectory` when `log_dir` is empty or relative; `Io` when it
///   cannot be created.
/// - `Conflict` when logging already runs with another configuration.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), LoggingError> {
    let level = parse_level(level)?;
    let dir = absolute_dir(log_dir)?;
    init(LogConfig {
        level,
        sink: LogSink::Directory(dir),
    })
}

/// Starts logging to stderr.
pub fn init_stderr_logging(level: &str) -> Result<(), LoggingError> {
    init(LogConfig {
        level: parse_level(level)?,
        sink: LogSink::Stderr,
    })
}

/// Starts the backend for `config`, or verifies that it already runs with it.
pub fn init(config: LogConfig) -> Result<(), LoggingError> {
    let active = ACTIVE.get_or_try_init(|| {
        let handle = start_backend(&config)?;
        install_panic_hook();
        info!(
            "event=logging_init module=logging status=ok level={} sink={} version={}",
            config.level.as_str(),
            config.sink,
            env!("CARGO_PKG_VERSION")
        );
        Ok::<_, LoggingError>(ActiveLogger {
            config: config.clone(),
            _handle: handle,
        })
    })?;

    if active.config == config {
        Ok(())
    } else {
        Err(LoggingError::Conflict {
            active: active.config.clone(),
            requested: config,
        })
    }
}

/// Configuration of the running backend, if any.
pub fn active_config() -> Option<LogConfig> {
    ACTIVE.get().map(|active| active.config.clone())
}

fn parse_level(level: &str) -> Result<LogLevel, LoggingError> {
    LogLevel::parse(level).ok_or_else(|| LoggingError::UnknownLevel(level.trim().to_string()))
}

fn absolute_dir(raw: &str) -> Result<PathBuf, LoggingError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LoggingError::InvalidDirectory("empty path".to_string()));
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(LoggingError::InvalidDirectory(format!(
            "`{trimmed}` is not absolute"
        )));
    }
    Ok(path.to_path_buf())
}

fn start_backend(config: &LogConfig) -> Result<LoggerHandle, LoggingError> {
    let logger = Logger::try_with_str(config.level.as_str()).map_err(LoggingError::Backend)?;
    let logger = match &config.sink {
        LogSink::Stderr => logger.log_to_stderr().format_for_stderr(detailed_format),
        LogSink::Directory(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| LoggingError::Io {
                path: dir.clone(),
                source,
            })?;
            logger
                .log_to_file(FileSpec::default().directory(dir).basename(LOG_FILE_BASENAME))
                .rotate(
                    Criterion::Size(ROTATE_AT_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(KEEP_ROTATED_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(detailed_format)
        }
    };
    logger.start().map_err(LoggingError::Backend)
}

fn install_panic_hook() {
    if PANIC_HOOK.set(()).is_err() {
        return;
    }

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        error!(
            "event=panic module=logging status=error location={location} payload={}",
            panic_summary(info)
        );
        previous(info);
    }));
}

// Payloads may echo feed text: one line, capped.
fn panic_summary(info: &PanicHookInfo<'_>) -> String {
    let payload = info
        .payload()
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| info.payload().downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string payload".to_string());
    single_line(&payload, PANIC_SUMMARY_CHARS)
}

fn single_line(value: &str, max_chars: usize) -> String {
    let flat = value.replace(['\n', '\r'], " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut capped: String = flat.chars().take(max_chars).collect();
    capped.push_str("...");
    capped
}

#[cfg(test)]
mod tests {
    use super::{
        absolute_dir, active_config, init_logging, init_stderr_logging, single_line, LogLevel,
        LogSink, LoggingError,
    };

    #[test]
    fn levels_parse_case_insensitively() {
        assert_eq!(LogLevel::parse(" WARNING "), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("Off"), Some(LogLevel::Off));
        assert_eq!(LogLevel::parse("verbose"), None);
    }

    #[test]
    fn relative_log_dirs_are_rejected() {
        assert!(matches!(
            absolute_dir("logs/dev"),
            Err(LoggingError::InvalidDirectory(_))
        ));
        assert!(matches!(
            absolute_dir("  "),
            Err(LoggingError::InvalidDirectory(_))
        ));
    }

    #[test]
    fn single_line_flattens_and_caps() {
        assert_eq!(single_line("a\nb", 10), "a b");
        assert_eq!(single_line("line1\nline2", 5), "line1...");
    }

    #[test]
    fn unknown_level_is_reported_before_any_init() {
        let err = init_stderr_logging("loud").unwrap_err();
        assert!(err.to_string().contains("unsupported log level `loud`"));
    }

    // The only test that starts the backend: it is process-global.
    #[test]
    fn repeated_init_is_idempotent_and_conflicts_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap().to_string();
        let other = tempfile::tempdir().unwrap();
        let other_str = other.path().to_str().unwrap().to_string();

        init_logging("info", &dir_str).unwrap();
        init_logging("INFO", &dir_str).unwrap();

        assert!(matches!(
            init_logging("debug", &dir_str),
            Err(LoggingError::Conflict { .. })
        ));
        assert!(matches!(
            init_logging("info", &other_str),
            Err(LoggingError::Conflict { .. })
        ));
        assert!(matches!(
            init_stderr_logging("info"),
            Err(LoggingError::Conflict { .. })
        ));

        let active = active_config().unwrap();
        assert_eq!(active.level, LogLevel::Info);
        assert_eq!(active.sink, LogSink::Directory(dir.path().to_path_buf()));
    }
}
