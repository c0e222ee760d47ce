//! # Error Types Module
//!
//! This module defines the error types used by the intake flow and by
//! hierarchy loading. Flow errors are always recovered in-conversation by
//! replying to the user; hierarchy errors only happen at startup.

use std::path::PathBuf;

use thiserror::Error;

use crate::session::Step;

/// Errors reported back to the user while walking the intake flow
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowError {
    /// Input did not match any menu key at the current step
    #[error("invalid selection at step {step:?}")]
    InvalidSelection {
        step: Step,
        /// Valid options for the step, used to re-render the menu
        options: Vec<String>,
    },
    /// Event arrived for a user without a session
    #[error("no active session")]
    NoActiveSession,
    /// Submit requested with zero attachments
    #[error("nothing to send")]
    EmptySubmission,
    /// Event carried a kind of content the flow does not accept
    #[error("unsupported input kind")]
    UnsupportedInputKind,
    /// Session handed to the resolver is missing a selection
    #[error("session is not ready for submission")]
    IncompleteSession,
    /// Selected triple has no destination in the hierarchy
    #[error("no destination for {region} / {district} / {neighborhood}")]
    UnknownDestination {
        region: String,
        district: String,
        neighborhood: String,
    },
}

impl FlowError {
    /// Localization key of the message shown to the user
    pub fn message_key(&self) -> &'static str {
        match self {
            FlowError::InvalidSelection { step, .. } => match step {
                Step::AwaitingRegion => "invalid-region",
                Step::AwaitingDistrict => "invalid-district",
                _ => "invalid-neighborhood",
            },
            FlowError::NoActiveSession => "start-first",
            FlowError::EmptySubmission => "nothing-to-send",
            FlowError::UnsupportedInputKind => "unsupported",
            FlowError::IncompleteSession | FlowError::UnknownDestination { .. } => {
                "error-destination"
            }
        }
    }
}

/// Failures of the session storage backend
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionStoreError {
    #[error("session storage failed: {0}")]
    Backend(String),
}

/// Errors raised while loading the location hierarchy
#[derive(Debug, Error)]
pub enum HierarchyError {
    #[error("failed to read hierarchy file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("hierarchy is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected {expected} at '{path}'")]
    InvalidShape {
        path: String,
        expected: &'static str,
    },
    #[error("'{path}' has no entries")]
    Empty { path: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_selection_keys_follow_step() {
        let key = |step| FlowError::InvalidSelection { step, options: vec![] }.message_key();

        assert_eq!(key(Step::AwaitingRegion), "invalid-region");
        assert_eq!(key(Step::AwaitingDistrict), "invalid-district");
        assert_eq!(key(Step::AwaitingNeighborhood), "invalid-neighborhood");
    }

    #[test]
    fn test_error_display() {
        let err = FlowError::UnknownDestination {
            region: "North".to_string(),
            district: "CityA".to_string(),
            neighborhood: "ZoneX".to_string(),
        };
        assert_eq!(err.to_string(), "no destination for North / CityA / ZoneX");

        let err = HierarchyError::Empty { path: "North".to_string() };
        assert_eq!(err.to_string(), "'North' has no entries");
    }
}
