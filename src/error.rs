use thiserror::Error;

/// Failures reported by the tracker client or the configuration layer.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Issue {key} not found")]
    NotFound { key: String },

    #[error("Jira API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid issue key '{key}'")]
    InvalidKey { key: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// True when `err` wraps a [`TrackerError::NotFound`].
pub fn is_not_found(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<TrackerError>(),
        Some(TrackerError::NotFound { .. })
    )
}
