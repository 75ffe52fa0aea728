use std::fmt;

use tracing::debug;

// ---------------------------------------------------------------------------
// Error kinds surfaced to the user
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Transport,
    Data,
    Asset,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Transport => "transport",
            ErrorKind::Data => "data",
            ErrorKind::Asset => "asset",
        };
        f.write_str(s)
    }
}

/// Sink for user-visible error messages.
///
/// The render and orchestration code only talks to this trait, so it can be
/// driven in tests without any display surface.
pub trait Notifier {
    fn notify(&mut self, kind: ErrorKind, message: &str);

    fn clear(&mut self);
}

// ---------------------------------------------------------------------------
// Single-slot message region
// ---------------------------------------------------------------------------

/// Holds at most one message; each notification replaces the last.
#[derive(Debug, Clone, Default)]
pub struct MessageSlot {
    current: Option<(ErrorKind, String)>,
}

impl MessageSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<(ErrorKind, &str)> {
        self.current.as_ref().map(|(k, m)| (*k, m.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }
}

impl Notifier for MessageSlot {
    fn notify(&mut self, kind: ErrorKind, message: &str) {
        // Asset failures fall back to a primitive and are never shown.
        if kind == ErrorKind::Asset {
            debug!(reason = message, "asset error suppressed");
            return;
        }
        self.current = Some((kind, message.to_string()));
    }

    fn clear(&mut self) {
        self.current = None;
    }
}

// ---------------------------------------------------------------------------
// Progress line
// ---------------------------------------------------------------------------

/// Free-form progress text, separate from the error slot.
#[derive(Debug, Clone)]
pub struct StatusLine {
    text: String,
}

impl StatusLine {
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Default for StatusLine {
    fn default() -> Self {
        Self { text: "Waiting for simulation...".into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_message_replaces_earlier() {
        let mut slot = MessageSlot::new();
        slot.notify(ErrorKind::Validation, "first");
        slot.notify(ErrorKind::Transport, "second");
        assert_eq!(slot.current(), Some((ErrorKind::Transport, "second")));
        slot.clear();
        assert!(slot.is_empty());
    }

    #[test]
    fn asset_errors_are_not_shown() {
        let mut slot = MessageSlot::new();
        slot.notify(ErrorKind::Data, "bad payload");
        slot.notify(ErrorKind::Asset, "model missing");
        assert_eq!(slot.current(), Some((ErrorKind::Data, "bad payload")));
    }
}
