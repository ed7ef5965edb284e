//! Run log for the `photoframe` binary.
//!
//! The library only ever calls [`write`] (through `log_info!` / `log_warn!` /
//! `log_err!`). Nothing is written until the binary hands a file to [`init`],
//! so library users and tests get no side effects.
//!
//! Line format: `HH:MM:SS LEVEL message`, with the level padded to five
//! characters so the messages line up.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

static LOG_FILE: OnceLock<Mutex<File>> = OnceLock::new();
static MAX_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);

/// Severity of a log line. Ordered so `Error < Warn < Info`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
#[repr(u8)]
pub enum Level {
    Error = 1,
    Warn = 2,
    Info = 3,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
        }
    }
}

/// Drop every line less severe than `level`.
pub fn set_max_level(level: Level) {
    MAX_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn enabled(level: Level) -> bool {
    level as u8 <= MAX_LEVEL.load(Ordering::Relaxed)
}

/// Append one line. A no-op before [`init`] or below the level filter.
pub fn write(level: Level, msg: &str) {
    if !enabled(level) {
        return;
    }
    if let Some(mutex) = LOG_FILE.get()
        && let Ok(mut file) = mutex.lock()
    {
        let _ = writeln!(file, "{}", format_line(&timestamp(), level, msg));
    }
}

fn format_line(time: &str, level: Level, msg: &str) -> String {
    format!("{} {:<5} {}", time, level.as_str(), msg)
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Info, &format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Warn, &format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_err {
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Error, &format!($($arg)*));
    };
}

/// Open (truncating) `path` as the run log and mirror panics into it.
/// Only the first successful call takes effect.
pub fn init(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).write(true).truncate(true).open(path)?;
    if LOG_FILE.set(Mutex::new(file)).is_err() {
        return Ok(());
    }

    write(Level::Info, &format!("photoframe {} writing to {}", env!("CARGO_PKG_VERSION"), path.display()));

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        write(Level::Error, &format!("panic: {}", info));
        prev(info);
    }));
    Ok(())
}

/// `<data dir>/PhotoFrame/photoframe.log`, used when `--log` is not given.
///
///   Windows:  `%APPDATA%\PhotoFrame\photoframe.log`
///   Linux:    `$XDG_DATA_HOME` or `~/.local/share`, then `PhotoFrame/photoframe.log`
///   macOS:    `~/Library/Application Support/PhotoFrame/photoframe.log`
pub fn default_log_path() -> PathBuf {
    data_dir().join("PhotoFrame").join("photoframe.log")
}

fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata);
        }
    }
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join("Library").join("Application Support");
        }
    }
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from(".")
}

/// `HH:MM:SS` (UTC).
fn timestamp() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => {
            let secs = d.as_secs();
            format!("{:02}:{:02}:{:02}", (secs % 86400) / 3600, (secs % 3600) / 60, secs % 60)
        }
        Err(_) => "??:??:??".to_string(),
    }
}
