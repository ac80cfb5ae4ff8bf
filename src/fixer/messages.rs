//! The ordered diagnostic log a fix produces.
//!
//! Every correction or violation a stage finds is appended here. Entries are
//! never edited or removed, so the log reads in emission order. Each entry is
//! also mirrored to `tracing` at the matching level.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub level: Level,
    pub text: String,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.text)
    }
}

/// Append-only message log.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Messages {
    entries: Vec<Message>,
}

impl Messages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::info!("{text}");
        self.push(Level::Info, text);
    }

    pub fn warn(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::warn!("{text}");
        self.push(Level::Warning, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::error!("{text}");
        self.push(Level::Error, text);
    }

    fn push(&mut self, level: Level, text: String) {
        self.entries.push(Message { level, text });
    }

    pub fn entries(&self) -> &[Message] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter()
    }

    /// Returns the entries logged at `level`, in emission order.
    pub fn at_level(&self, level: Level) -> impl Iterator<Item = &Message> {
        self.entries.iter().filter(move |m| m.level == level)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_keep_emission_order() {
        let mut messages = Messages::new();
        messages.warn("second");
        messages.info("first");
        messages.error("third");

        let levels: Vec<_> = messages.iter().map(|m| m.level).collect();
        assert_eq!(levels, [Level::Warning, Level::Info, Level::Error]);
        assert_eq!(messages.at_level(Level::Info).count(), 1);
        assert_eq!(messages.entries()[2].to_string(), "ERROR: third");
    }
}
