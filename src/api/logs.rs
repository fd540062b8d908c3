//! Real-time log streaming via Server-Sent Events (SSE).
//!
//! Load and aggregation progress is published on a broadcast channel so
//! the frontend can show what a selection is doing; entries are mirrored
//! to stdout for the terminal.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Log level for frontend display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Log level.
    pub level: LogLevel,
    /// Log message.
    pub message: String,
    /// When the entry was emitted.
    pub ts: DateTime<Utc>,
}

impl LogEntry {
    fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            ts: Utc::now(),
        }
    }
}

/// Global log broadcaster.
pub static LOG_BUS: Lazy<LogBus> = Lazy::new(LogBus::new);

/// Broadcasts log entries to all connected SSE clients.
pub struct LogBus {
    sender: broadcast::Sender<LogEntry>,
}

impl LogBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Publish an entry to stdout and to all subscribers.
    pub fn publish(&self, entry: LogEntry) {
        let prefix = match entry.level {
            LogLevel::Info => "   ",
            LogLevel::Success => "   ✓",
            LogLevel::Warning => "   ⚠️",
            LogLevel::Error => "   ❌",
        };
        println!("{} {}", prefix, entry.message);

        // Ignore the send result: no receivers is fine
        let _ = self.sender.send(entry);
    }

    /// Get a receiver for SSE streaming.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenient logging functions
pub fn log_info(msg: impl Into<String>) {
    LOG_BUS.publish(LogEntry::new(LogLevel::Info, msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_BUS.publish(LogEntry::new(LogLevel::Success, msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_BUS.publish(LogEntry::new(LogLevel::Warning, msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_BUS.publish(LogEntry::new(LogLevel::Error, msg));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_reach_subscribers() {
        let bus = LogBus::new();
        let mut rx = bus.subscribe();

        bus.publish(LogEntry::new(LogLevel::Success, "讀取 120 行"));

        let entry = rx.try_recv().unwrap();
        assert!(matches!(entry.level, LogLevel::Success));
        assert_eq!(entry.message, "讀取 120 行");
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let entry = LogEntry::new(LogLevel::Warning, "跳過 3 行");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["level"], "warning");
        assert!(json.get("ts").is_some());
    }
}
