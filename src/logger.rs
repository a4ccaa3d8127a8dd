//! Structured logging with visual box-drawing formatting.
//!
//! ddcbright logs as one continuous vertical pipe: `log_version!` opens the
//! run, `log_block_start!` begins each conceptual block (probe results,
//! mode changes, transitions), `log_decorated!`/`log_indented!` continue a
//! block, and `log_end!` closes the run. The semantic macros
//! (`log_info!`, `log_warning!`, `log_error!`, `log_debug!`) carry a
//! `[LEVEL]` prefix inside the same pipe structure; precede them with
//! `log_pipe!` when they start a new block.
//!
//! Logging can be disabled globally (quiet operation for tests) and routed
//! to a file with `--log`, in which case ANSI color codes are stripped.

use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

/// Channel for routing output to a file when `--log` is active.
static LOG_CHANNEL: OnceLock<Option<Sender<LogMessage>>> = OnceLock::new();

enum LogMessage {
    Formatted(String),
    Shutdown,
}

/// Global logging switch and file-routing control.
pub struct Log;

impl Log {
    /// Enable or disable all log output.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Check whether logging is currently enabled.
    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Route all subsequent log output to the given file.
    ///
    /// Spawns a writer thread fed by a channel; the returned guard flushes
    /// and joins the thread on drop.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let (tx, rx) = channel();

        LOG_CHANNEL
            .set(Some(tx.clone()))
            .map_err(|_| anyhow::anyhow!("logger channel already initialized"))?;

        let handle = std::thread::spawn(move || -> std::io::Result<()> {
            let mut file = std::fs::File::create(&file_path)?;
            loop {
                match rx.recv() {
                    Ok(LogMessage::Formatted(text)) => {
                        file.write_all(text.as_bytes())?;
                        file.flush()?;
                    }
                    Ok(LogMessage::Shutdown) | Err(_) => break,
                }
            }
            Ok(())
        });

        Ok(LoggerGuard {
            sender: tx,
            handle: Some(handle),
        })
    }
}

/// Keeps the file-logging thread alive; shuts it down on drop.
pub struct LoggerGuard {
    sender: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<std::io::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.sender.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Strip ANSI color sequences for clean file output.
fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Route a formatted line to stdout or the log file (used by the macros).
pub fn write_output(text: &str) {
    if let Some(Some(tx)) = LOG_CHANNEL.get() {
        let clean = strip_ansi_codes(text);
        let _ = tx.send(LogMessage::Formatted(clean));
    } else {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}

/// Log the application startup header.
#[macro_export]
macro_rules! log_version {
    () => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let version = env!("CARGO_PKG_VERSION");
            $crate::logger::write_output(&format!("┏ ddcbright v{version} ━━╸\n"));
        }
    }};
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            $crate::logger::write_output("╹\n");
        }
    }};
}

/// Log a message opening a new conceptual block of output.
#[macro_export]
macro_rules! log_block_start {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("┃\n┣ {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let expr = $expr;
            $crate::logger::write_output(&format!("┃\n┣ {expr}\n"));
        }
    }};
}

/// Log a message continuing an existing block.
#[macro_export]
macro_rules! log_decorated {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("┣ {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let expr = $expr;
            $crate::logger::write_output(&format!("┣ {expr}\n"));
        }
    }};
}

/// Log an indented sub-item within a block.
#[macro_export]
macro_rules! log_indented {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("┃   {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let expr = $expr;
            $crate::logger::write_output(&format!("┃   {expr}\n"));
        }
    }};
}

/// Log an empty pipe line for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            $crate::logger::write_output("┃\n");
        }
    }};
}

/// Log an informational message with a green `[INFO]` prefix.
#[macro_export]
macro_rules! log_info {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("┣[\x1b[32mINFO\x1b[0m] {message}\n"));
        }
    }};
}

/// Log a warning message with a yellow `[WARNING]` prefix.
#[macro_export]
macro_rules! log_warning {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("┣[\x1b[33mWARNING\x1b[0m] {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let expr = $expr;
            $crate::logger::write_output(&format!("┣[\x1b[33mWARNING\x1b[0m] {expr}\n"));
        }
    }};
}

/// Log an error message with a red `[ERROR]` prefix.
#[macro_export]
macro_rules! log_error {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("┣[\x1b[31mERROR\x1b[0m] {message}\n"));
        }
    }};
    ($expr:expr) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let expr = $expr;
            $crate::logger::write_output(&format!("┣[\x1b[31mERROR\x1b[0m] {expr}\n"));
        }
    }};
}

/// Log a debug/operational message with a green `[DEBUG]` prefix.
#[macro_export]
macro_rules! log_debug {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("┣[\x1b[32mDEBUG\x1b[0m] {message}\n"));
        }
    }};
}

/// Log a fatal error closing the pipe with a terminal corner.
#[macro_export]
macro_rules! log_error_exit {
    ($fmt:literal $($arg:tt)*) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::logger::write_output(&format!("┃\n┗[\x1b[31mERROR\x1b[0m] {message}\n"));
        }
    }};
}
