//! Provider error types.
//!
//! Remote failures are carried verbatim in [`ProviderError::Calico`]; the
//! remaining variants cover configuration, schema and state-file problems
//! detected locally.

use calico_client::CalicoError;
use thiserror::Error;

/// Errors that can occur while running resource operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Calico API error (anything other than a tombstoned read)
    #[error("Calico error: {0}")]
    Calico(#[from] CalicoError),

    /// Resource configuration failed schema validation
    #[error("invalid configuration for {resource}: {}", .problems.join("; "))]
    InvalidConfig {
        resource: String,
        problems: Vec<String>,
    },

    /// An attribute holds a value the mapping cannot translate
    #[error("invalid value for {path}: {reason}")]
    InvalidAttribute { path: String, reason: String },

    /// Attribute path does not fit the shape of the stored attributes
    #[error("invalid attribute path: {0}")]
    InvalidPath(String),

    /// No resource type with this name is registered
    #[error("unknown resource type: {0}")]
    UnknownResourceType(String),

    /// The resource type does not support import
    #[error("resource type {0} does not support import")]
    ImportNotSupported(String),

    /// An address appears twice in the manifest, or already exists on import
    #[error("duplicate resource address: {0}")]
    DuplicateAddress(String),

    /// The object disappeared right after it was created
    #[error("{0} was created but could not be read back")]
    ResourceVanished(String),

    /// A destroyed resource can still be read
    #[error("{0} still exists")]
    ResourceStillExists(String),

    /// Invalid provider configuration
    #[error("Invalid provider configuration: {0}")]
    InvalidProviderConfig(String),

    /// State or manifest file I/O
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// State file (de)serialization
    #[error("state serialization error: {0}")]
    StateFormat(#[from] serde_json::Error),

    /// Manifest parse error
    #[error("manifest parse error: {0}")]
    Manifest(#[from] serde_yaml::Error),
}

impl ProviderError {
    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        ProviderError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}
