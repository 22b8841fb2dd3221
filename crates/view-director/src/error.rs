//! Error types for the view director.

use std::fmt;

use crate::{cameras::ViewSlot, mode::ViewMode};

/// Result type for view director operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while switching or configuring view modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The view a mode needs is not present in the camera set.
    ///
    /// Recoverable: the current mode is left unchanged.
    CameraUnavailable {
        /// The mode that was requested.
        mode: ViewMode,
        /// The view that mode needs.
        view: ViewSlot,
    },
    /// A mode value has no defined entry behavior.
    ///
    /// Fatal at initialization.
    InvalidModeConfiguration {
        /// The rejected value, as given.
        value: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CameraUnavailable { mode, view } => {
                write!(f, "camera is not available: {view} (required by {mode})")
            }
            Error::InvalidModeConfiguration { value } => {
                write!(f, "unsupported view mode: {value}")
            }
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_view_and_mode() {
        let err = Error::CameraUnavailable {
            mode: ViewMode::Backup,
            view: ViewSlot::Backup,
        };
        assert_eq!(
            err.to_string(),
            "camera is not available: backup camera (required by Backup)"
        );

        let err = Error::InvalidModeConfiguration {
            value: "9".to_string(),
        };
        assert_eq!(err.to_string(), "unsupported view mode: 9");
    }
}
