//! Run reporting: a colored console printer doubling as an append-only log.
//!
//! Every decision point in a run goes through a [`Reporter`], which prints
//! the message immediately and records it so that talkative mode can replay
//! the whole chronological log after the batch finishes.

use std::fmt;

use colored::Colorize;
use serde::Serialize;

/// Severity of a log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Info,
    Warn,
    Error,
    Success,
    /// Verbose-only commentary about the current pipeline step.
    Highlight,
}

/// One recorded log entry.
#[derive(Clone, Debug, Serialize)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            Level::Info => "[I]",
            Level::Warn => "[W]",
            Level::Error => "[E]",
            Level::Success => "[S]",
            Level::Highlight => "[H]",
        };
        write!(f, "{} {}", tag, self.message)
    }
}

/// Console reporter and append-only execution log.
#[derive(Debug, Default)]
pub struct Reporter {
    talkative: bool,
    entries: Vec<LogEntry>,
}

impl Reporter {
    pub fn new(talkative: bool) -> Self {
        Self {
            talkative,
            entries: Vec::new(),
        }
    }

    pub fn talkative(&self) -> bool {
        self.talkative
    }

    /// The chronological log recorded so far.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.record(Level::Info, message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.record(Level::Warn, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.record(Level::Error, message.into());
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.record(Level::Success, message.into());
    }

    /// Verbose commentary: only printed (and only recorded) in talkative mode.
    pub fn highlight(&mut self, message: impl Into<String>) {
        if self.talkative {
            self.record(Level::Highlight, message.into());
        }
    }

    fn record(&mut self, level: Level, message: String) {
        let entry = LogEntry { level, message };
        match level {
            Level::Info => println!("{}", entry),
            Level::Warn => println!("{}", entry.to_string().yellow()),
            Level::Error => eprintln!("{}", entry.to_string().red()),
            Level::Success => println!("{}", entry.to_string().green()),
            Level::Highlight => println!("{}", entry.to_string().blue()),
        }
        self.entries.push(entry);
    }
}
