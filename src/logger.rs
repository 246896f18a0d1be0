//! The logging sink handed to a discovery pass.
//!
//! Nothing in the library logs through a global logger. Callers pass a
//! [`Logger`]; when they don't care, [`NoopLogger`] swallows everything.

use log::Level;

/// Prefix carried by every line this provider emits.
pub const LOG_TARGET: &str = "discover-hcloud";

pub trait Logger: Send + Sync {
    fn log(&self, level: Level, message: &str);

    fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }
}

/// Discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log(&self, _level: Level, _message: &str) {}
}

/// Forwards messages to the `log` facade under the `discover-hcloud` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFacade;

impl Logger for LogFacade {
    fn log(&self, level: Level, message: &str) {
        log::log!(target: LOG_TARGET, level, "{}", message);
    }
}

/// Hands each message to a closure as a formatted text line, e.g.
/// `[INFO] discover-hcloud: filtering by location fsn1`.
pub struct LineSink<F>(pub F);

impl<F> Logger for LineSink<F>
where
    F: Fn(&str) + Send + Sync,
{
    fn log(&self, level: Level, message: &str) {
        (self.0)(&format_line(level, message));
    }
}

pub fn format_line(level: Level, message: &str) -> String {
    format!("[{}] {}: {}", level, LOG_TARGET, message)
}
