//! Test-evidence log written to a file and a coloured console at once

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crossterm::style::{Color, Stylize};

use crate::error::{HarnessError, Result};
use crate::time_util::{self, TimeFormat};

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Error,
    Warn,
    Fail,
    Success,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Fail => "FAIL",
            LogLevel::Success => "SUCCESS",
        }
    }

    pub fn color(self) -> Color {
        match self {
            LogLevel::Debug => Color::Yellow,
            LogLevel::Info => Color::Green,
            LogLevel::Error => Color::Red,
            LogLevel::Warn => Color::Magenta,
            LogLevel::Fail => Color::Grey,
            LogLevel::Success => Color::Cyan,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Sinks {
    file: File,
    console: Box<dyn Write + Send>,
    color: bool,
}

/// Appends `<timestamp> [<LEVEL>] <message>` lines to a log file and a console.
///
/// Both writes of one entry happen under the same lock, so the file and the
/// console always show entries in the same order. When `debug` is set every
/// entry is recorded at [`LogLevel::Debug`].
pub struct Logger {
    path: PathBuf,
    debug: bool,
    sinks: Mutex<Sinks>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("path", &self.path)
            .field("debug", &self.debug)
            .finish()
    }
}

impl Logger {
    /// Open `path` in append mode with coloured output on stdout
    pub fn open(path: impl AsRef<Path>, debug: bool) -> Result<Self> {
        Self::with_console(path, debug, Box::new(io::stdout()), true)
    }

    /// Open `path` in append mode, echoing entries to `console`
    pub fn with_console(
        path: impl AsRef<Path>,
        debug: bool,
        console: Box<dyn Write + Send>,
        color: bool,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| HarnessError::LogFile {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            path,
            debug,
            sinks: Mutex::new(Sinks {
                file,
                console,
                color,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Level an entry is actually recorded at
    pub fn effective_level(&self, level: LogLevel) -> LogLevel {
        if self.debug {
            LogLevel::Debug
        } else {
            level
        }
    }

    pub fn log(&self, message: &str, level: LogLevel) {
        let level = self.effective_level(level);
        let line = format!(
            "{} [{}] {}",
            time_util::timestamp(TimeFormat::Unix),
            level,
            message
        );

        match level {
            LogLevel::Debug => tracing::debug!("{}", message),
            LogLevel::Info | LogLevel::Success => tracing::info!("{}", message),
            LogLevel::Warn | LogLevel::Fail => tracing::warn!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
        }

        let mut sinks = self.sinks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut console_line = line.clone();
        if let Err(e) = writeln!(sinks.file, "{}", line) {
            tracing::warn!("Failed to append to {}: {}", self.path.display(), e);
            console_line.push_str(&format!(
                "\n{} [{}] Failed to append to {}: {}",
                time_util::timestamp(TimeFormat::Unix),
                LogLevel::Error,
                self.path.display(),
                e
            ));
        }

        let written = if sinks.color {
            writeln!(sinks.console, "{}", console_line.as_str().with(level.color()))
        } else {
            writeln!(sinks.console, "{}", console_line)
        };
        if let Err(e) = written.and_then(|_| sinks.console.flush()) {
            tracing::warn!("Failed to write log entry to console: {}", e);
        }
    }

    pub fn debug(&self, message: &str) {
        self.log(message, LogLevel::Debug);
    }

    pub fn info(&self, message: &str) {
        self.log(message, LogLevel::Info);
    }

    pub fn warn(&self, message: &str) {
        self.log(message, LogLevel::Warn);
    }

    pub fn error(&self, message: &str) {
        self.log(message, LogLevel::Error);
    }

    pub fn fail(&self, message: &str) {
        self.log(message, LogLevel::Fail);
    }

    pub fn success(&self, message: &str) {
        self.log(message, LogLevel::Success);
    }
}
