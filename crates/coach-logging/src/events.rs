use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Structured log events for interview and practice sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    SessionStarted {
        session_id: String,
        topic: String,
        difficulty: String,
        role: String,
        mode: String,
    },
    UserMessage {
        session_id: String,
        turn: usize,
        chars: usize,
    },
    ModelReplied {
        session_id: String,
        turn: usize,
        chars: usize,
    },
    AwaitingNextQuestion {
        session_id: String,
        turn: usize,
    },
    SessionEnded {
        session_id: String,
        turns: usize,
        has_feedback: bool,
        duration_secs: f64,
    },
    SessionAbandoned {
        session_id: String,
        turns: usize,
    },
    FeedbackGenerated {
        session_id: String,
        /// `summary` or `structured`
        kind: String,
        chars: usize,
    },
    RecordSaved {
        record_id: String,
        kind: String,
    },
    ErrorEncountered {
        session_id: String,
        error: String,
    },
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Logger for session events - handles both console output and file logging
pub struct Logger {
    format: LogFormat,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            file_writer: None,
        }
    }

    /// Create a logger with file output in addition to console
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            file_writer: Some(Mutex::new(file)),
        })
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    pub fn log(&self, event: &LogEvent) {
        // File output is always JSON
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let json = event.with_timestamp();
                let _ = writeln!(file, "{}", json);
            }
        }

        match self.format {
            LogFormat::Json => self.log_json(event),
            LogFormat::Pretty => self.log_pretty(event),
            LogFormat::Compact => self.log_compact(event),
        }
    }

    fn log_json(&self, event: &LogEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{}", json);
        }
    }

    fn log_pretty(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        match event {
            LogEvent::SessionStarted {
                topic,
                difficulty,
                role,
                mode,
                ..
            } => {
                let _ = writeln!(stderr);
                let _ = writeln!(
                    stderr,
                    "{}",
                    "╭─────────────────────────────────────────────────────────────────────╮"
                        .bright_blue()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {}{}",
                    "│".bright_blue(),
                    "interview-coach".bold().bright_white(),
                    " ".repeat(52) + &"│".bright_blue().to_string()
                );
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Topic:".dimmed(),
                    Self::truncate_with_padding(topic, 58, 66).dimmed()
                );
                let details = format!("{} · {} · {} feedback", role, difficulty, mode);
                let _ = writeln!(
                    stderr,
                    "{}  {} {}",
                    "│".bright_blue(),
                    "Setup:".dimmed(),
                    Self::truncate_with_padding(&details, 58, 66).dimmed()
                );
                let _ = writeln!(
                    stderr,
                    "{}",
                    "╰─────────────────────────────────────────────────────────────────────╯"
                        .bright_blue()
                );
                let _ = writeln!(stderr);
            }
            LogEvent::AwaitingNextQuestion { .. } => {
                let _ = writeln!(
                    stderr,
                    "  {} {}",
                    "→".bright_yellow(),
                    "Type /next when you're ready for the next question".dimmed()
                );
            }
            LogEvent::SessionEnded {
                turns,
                has_feedback,
                duration_secs,
                ..
            } => {
                let status = if *has_feedback {
                    "✓".bright_green()
                } else {
                    "✗".bright_red()
                };
                let _ = writeln!(
                    stderr,
                    "{} Session ended after {} turns ({:.1}s)",
                    status, turns, duration_secs
                );
            }
            LogEvent::SessionAbandoned { .. } => {
                let _ = writeln!(
                    stderr,
                    "{} {}",
                    "○".dimmed(),
                    "Session ended before any answers; nothing saved".dimmed()
                );
            }
            LogEvent::RecordSaved { record_id, kind } => {
                let short = record_id.get(..8).unwrap_or(record_id);
                let _ = writeln!(
                    stderr,
                    "{} {}",
                    "✓".bright_green(),
                    format!("Saved {} to history ({})", kind, short).dimmed()
                );
            }
            LogEvent::ErrorEncountered { error, .. } => {
                let _ = writeln!(stderr, "{} {}", "✗".bright_red(), error.bright_red());
            }
            // The transcript itself is rendered by the front-end
            LogEvent::UserMessage { .. }
            | LogEvent::ModelReplied { .. }
            | LogEvent::FeedbackGenerated { .. } => {}
        }
    }

    fn log_compact(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        let msg = match event {
            LogEvent::SessionStarted {
                topic,
                difficulty,
                mode,
                ..
            } => format!(
                "[{}] session:start {} {} {}",
                timestamp, topic, difficulty, mode
            ),
            LogEvent::UserMessage { turn, chars, .. } => {
                format!("[{}] user:{} {}c", timestamp, turn, chars)
            }
            LogEvent::ModelReplied { turn, chars, .. } => {
                format!("[{}] model:{} {}c", timestamp, turn, chars)
            }
            LogEvent::AwaitingNextQuestion { turn, .. } => {
                format!("[{}] session:wait:{}", timestamp, turn)
            }
            LogEvent::SessionEnded {
                turns,
                has_feedback,
                duration_secs,
                ..
            } => format!(
                "[{}] session:done turns={} feedback={} {:.1}s",
                timestamp, turns, has_feedback, duration_secs
            ),
            LogEvent::SessionAbandoned { turns, .. } => {
                format!("[{}] session:abandon turns={}", timestamp, turns)
            }
            LogEvent::FeedbackGenerated { kind, chars, .. } => {
                format!("[{}] feedback:{} {}c", timestamp, kind, chars)
            }
            LogEvent::RecordSaved { record_id, kind } => {
                format!("[{}] history:{} {}", timestamp, kind, record_id)
            }
            LogEvent::ErrorEncountered { error, .. } => {
                format!("[{}] error:{}", timestamp, error)
            }
        };
        let _ = writeln!(stderr, "{}", msg);
    }

    /// Truncate a string and pad to exact width
    fn truncate_with_padding(s: &str, max_len: usize, total_width: usize) -> String {
        let count = s.chars().count();
        let truncated = if count > max_len {
            let head: String = s.chars().take(max_len - 3).collect();
            format!("{}...", head)
        } else {
            s.to_string()
        };

        let padding_needed = total_width.saturating_sub(truncated.chars().count() + 1);
        format!("{}{}│", truncated, " ".repeat(padding_needed))
    }
}
