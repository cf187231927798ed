use thiserror::Error;

use crate::host::ContainerId;

/// Errors surfaced by the toolkit.
///
/// Validation failures are not errors: a rejected command is reported through
/// [`crate::command::Outcome::Rejected`] after the actor has been messaged.
#[derive(Debug, Error)]
pub enum KitError {
    /// Programmer error detected while building a pipeline, GUI or config.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The host refused a container or messaging primitive.
    #[error("host error: {0}")]
    Host(String),

    /// A container handle the host does not know about.
    #[error("unknown container: {0}")]
    UnknownContainer(ContainerId),

    /// Application callback failed while a validated command was dispatched.
    #[error("command '{command}' callback failed: {source}")]
    Callback {
        command: String,
        #[source]
        source: anyhow::Error,
    },

    /// Background task scheduled outside of a tokio runtime.
    #[error("no async runtime available for background task")]
    NoRuntime,

    /// Wrapper around IO errors (config files, scripts).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper around TOML parse errors.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Wrapper around JSON errors (replay scripts).
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl KitError {
    pub fn config(msg: impl Into<String>) -> Self {
        KitError::Configuration(msg.into())
    }
}

pub type KitResult<T> = Result<T, KitError>;
