use std::error::Error;
use std::fmt;

use crate::notify::ErrorKind;

// ---------------------------------------------------------------------------
// Viewer error taxonomy
// ---------------------------------------------------------------------------

/// Every failure the viewer can hit, grouped by where it is detected.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerError {
    /// Malformed form input, caught before any network call.
    Validation(String),
    /// Network failure or non-success HTTP status.
    Transport(String),
    /// Response arrived but the payload is missing, empty or inconsistent.
    Data(String),
    /// 3D model asset could not be loaded. Recovered locally.
    Asset(String),
}

impl ViewerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ViewerError::Validation(_) => ErrorKind::Validation,
            ViewerError::Transport(_) => ErrorKind::Transport,
            ViewerError::Data(_) => ErrorKind::Data,
            ViewerError::Asset(_) => ErrorKind::Asset,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ViewerError::Validation(m)
            | ViewerError::Transport(m)
            | ViewerError::Data(m)
            | ViewerError::Asset(m) => m,
        }
    }
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} error: {}", self.kind(), self.message())
    }
}

impl Error for ViewerError {}

pub type Result<T> = std::result::Result<T, ViewerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let e = ViewerError::Data("No valid data to plot.".into());
        assert_eq!(e.to_string(), "data error: No valid data to plot.");
        assert_eq!(e.kind(), ErrorKind::Data);
    }
}
