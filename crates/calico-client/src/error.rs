//! Calico client errors

use thiserror::Error;

/// Errors that can occur when interacting with the Calico API
#[derive(Debug, Error)]
pub enum CalicoError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Authentication failed (invalid token, expired, forbidden)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// API server answered with a non-success status
    #[error("Calico API error ({code} {reason}): {message}")]
    Status {
        code: u16,
        reason: String,
        message: String,
    },

    /// The named resource does not exist
    #[error("resource does not exist: {kind}({name})")]
    ResourceDoesNotExist { kind: String, name: String },

    /// A resource with the same name already exists
    #[error("resource already exists: {kind}({name})")]
    ResourceAlreadyExists { kind: String, name: String },

    /// Invalid request (e.g., missing name)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl CalicoError {
    /// True for the "remote object absent" class of errors
    pub fn is_not_found(&self) -> bool {
        matches!(self, CalicoError::ResourceDoesNotExist { .. })
    }

    /// Attach resource identity to a raw status error.
    ///
    /// 404 becomes [`CalicoError::ResourceDoesNotExist`] and 409 becomes
    /// [`CalicoError::ResourceAlreadyExists`]; everything else is returned as is.
    pub fn for_resource(self, kind: &str, name: &str) -> Self {
        match self {
            CalicoError::Status { code: 404, .. } => CalicoError::ResourceDoesNotExist {
                kind: kind.to_string(),
                name: name.to_string(),
            },
            CalicoError::Status { code: 409, .. } => CalicoError::ResourceAlreadyExists {
                kind: kind.to_string(),
                name: name.to_string(),
            },
            other => other,
        }
    }

    /// Like [`CalicoError::for_resource`], but only 404 is mapped.
    ///
    /// A 409 on replace means a stale `resourceVersion`, not a name clash.
    pub fn for_existing(self, kind: &str, name: &str) -> Self {
        match self {
            CalicoError::Status { code: 404, .. } => CalicoError::ResourceDoesNotExist {
                kind: kind.to_string(),
                name: name.to_string(),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> CalicoError {
        CalicoError::Status {
            code,
            reason: "Reason".to_string(),
            message: "message".to_string(),
        }
    }

    #[test]
    fn test_for_resource_maps_not_found() {
        let err = status(404).for_resource("BGPPeer", "peer-a");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "resource does not exist: BGPPeer(peer-a)");
    }

    #[test]
    fn test_for_resource_maps_conflict() {
        let err = status(409).for_resource("IPPool", "pool-a");
        assert!(matches!(err, CalicoError::ResourceAlreadyExists { .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_for_resource_keeps_other_errors() {
        let err = status(500).for_resource("IPPool", "pool-a");
        assert!(matches!(err, CalicoError::Status { code: 500, .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_for_existing_keeps_conflict() {
        assert!(status(404).for_existing("IPPool", "pool-a").is_not_found());
        assert!(matches!(
            status(409).for_existing("IPPool", "pool-a"),
            CalicoError::Status { code: 409, .. }
        ));
    }
}
