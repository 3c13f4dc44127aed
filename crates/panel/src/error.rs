//! Error types for the panel core.

use thiserror::Error;

/// Result type alias for panel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during aggregation or dispatch.
#[derive(Debug, Error)]
pub enum Error {
    /// A remote request failed; the whole aggregation pass fails with it.
    #[error(transparent)]
    Client(#[from] rdbg_client::Error),

    /// The host add-on registry could not be enumerated.
    #[error("Add-on registry error: {0}")]
    Registry(String),

    /// The presentation layer failed to open a toolbox.
    #[error("Toolbox error: {0}")]
    Toolbox(String),

    /// The target's kind has no known debug strategy.
    ///
    /// Reachable by construction: target kinds come from external data, so
    /// an unrecognized kind is a reportable condition, not a bug.
    #[error("No debug strategy for target '{0}'")]
    UnsupportedTarget(String),
}

impl Error {
    /// Returns true if this failure should be surfaced to the user rather
    /// than merely logged (the controller itself survives either way).
    pub fn is_reportable(&self) -> bool {
        matches!(self, Error::UnsupportedTarget(_))
    }
}
