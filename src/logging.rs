use anyhow::{anyhow, Context, Result};
use chrono::Local;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

/// Default number of log entries to keep in memory
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

/// A log entry with timestamp and message
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: Level, target: &str, message: String) -> Self {
        Self {
            timestamp: Local::now().format("%H:%M:%S.%3f").to_string(),
            level: level.to_string().to_uppercase(),
            target: target.to_string(),
            message,
        }
    }

    /// Format for display in the key tester
    pub fn format_for_display(&self) -> String {
        format!(
            "[{}] {} [{}] {}",
            self.timestamp, self.level, self.target, self.message
        )
    }
}

/// Thread-safe ring buffer for log entries
#[derive(Debug, Clone)]
pub struct LogRingBuffer {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    capacity: usize,
}

impl LogRingBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    // a panic while logging must not take the buffer down with it
    fn lock(&self) -> MutexGuard<'_, VecDeque<LogEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, entry: LogEntry) {
        let mut entries = self.lock();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub fn get_recent(&self, count: usize) -> Vec<LogEntry> {
        let entries = self.lock();
        entries.iter().rev().take(count).rev().cloned().collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for LogRingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Writer that parses formatted lines back into [`LogEntry`] values
#[derive(Clone)]
pub struct RingBufferWriter {
    buffer: LogRingBuffer,
}

impl RingBufferWriter {
    pub fn new(buffer: LogRingBuffer) -> Self {
        Self { buffer }
    }

    fn parse_line(message: &str) -> LogEntry {
        // The compact format is: "LEVEL target: message"
        let levels = [
            ("TRACE ", Level::TRACE),
            ("DEBUG ", Level::DEBUG),
            ("INFO ", Level::INFO),
            ("WARN ", Level::WARN),
            ("ERROR ", Level::ERROR),
        ];
        let Some((level, rest)) = levels.iter().find_map(|(prefix, level)| {
            message
                .strip_prefix(prefix)
                .map(|rest| (*level, rest.trim_start()))
        }) else {
            return LogEntry::new(Level::INFO, "general", message.to_string());
        };

        match rest.split_once(':') {
            Some((target, msg)) if !target.contains(' ') => {
                LogEntry::new(level, target, msg.trim().to_string())
            }
            _ => LogEntry::new(level, "general", rest.to_string()),
        }
    }
}

impl std::io::Write for RingBufferWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(message) = std::str::from_utf8(buf) {
            let message = message.trim();
            if !message.is_empty() {
                self.buffer.push(Self::parse_line(message));
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for RingBufferWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Global log buffer accessible throughout the application
static LOG_BUFFER: OnceLock<LogRingBuffer> = OnceLock::new();

/// Get the global log buffer, if tracing was initialized
pub fn get_log_buffer() -> Option<LogRingBuffer> {
    LOG_BUFFER.get().cloned()
}

/// Initialize tracing into a ring buffer of the default capacity
pub fn init_tracing(filter: &str) -> Result<LogRingBuffer> {
    init_tracing_with_capacity(filter, DEFAULT_LOG_CAPACITY)
}

/// Initialize tracing with our ring buffer writer.
///
/// `filter` holds `EnvFilter` directives and is used unless `RUST_LOG` is
/// set; it must parse either way. Fails if a global subscriber is already
/// installed. A failed call leaves nothing behind, so it can be retried.
pub fn init_tracing_with_capacity(filter: &str, capacity: usize) -> Result<LogRingBuffer> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let configured = EnvFilter::try_new(filter)
        .with_context(|| format!("Invalid log filter `{}`", filter))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or(configured);

    let buffer = LogRingBuffer::with_capacity(capacity);
    let fmt_layer = fmt::layer()
        .with_writer(RingBufferWriter::new(buffer.clone()))
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .without_time()
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|_| anyhow!("Tracing is already initialized"))?;

    // the subscriber is installed at most once, so the buffer is unset here
    if LOG_BUFFER.set(buffer.clone()).is_err() {
        return Err(anyhow!("Tracing is already initialized"));
    }

    tracing::info!(target: "system", "Tracing initialized");
    Ok(buffer)
}

/// Trace one key event as it reaches a dispatcher
#[macro_export]
macro_rules! trace_key {
    ($event:expr) => {
        tracing::trace!(
            target: "keys",
            "Key: {} {}",
            $event.kind,
            $crate::keycode::describe($event.code)
        );
    };
}

/// Trace a binding change
#[macro_export]
macro_rules! trace_binding {
    ($action:expr, $binding:expr) => {
        tracing::debug!(target: "bind", "{} {}", $action, $binding.describe());
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let buffer = LogRingBuffer::with_capacity(2);
        for i in 0..3 {
            buffer.push(LogEntry::new(Level::INFO, "test", format!("entry {}", i)));
        }

        let recent = buffer.get_recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message, "entry 1");
        assert_eq!(recent[1].message, "entry 2");
        assert_eq!(buffer.get_recent(1)[0].message, "entry 2");

        buffer.clear();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_writer_parses_compact_lines() {
        let buffer = LogRingBuffer::new();
        let mut writer = RingBufferWriter::new(buffer.clone());

        writer.write_all(b"DEBUG keys: Matched ctrl + a (keydown)\n").unwrap();
        writer.write_all(b" INFO config: Loaded\n").unwrap();
        writer.write_all(b"something else\n").unwrap();

        let entries = buffer.get_recent(3);
        assert_eq!(entries[0].level, "DEBUG");
        assert_eq!(entries[0].target, "keys");
        assert_eq!(entries[0].message, "Matched ctrl + a (keydown)");
        assert_eq!(entries[1].level, "INFO");
        assert_eq!(entries[1].target, "config");
        assert_eq!(entries[2].target, "general");
        assert!(entries[0]
            .format_for_display()
            .ends_with("DEBUG [keys] Matched ctrl + a (keydown)"));
    }
}
