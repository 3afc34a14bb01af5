//! Desired-state manifest
//!
//! ```yaml
//! resources:
//!   - type: calico_ippool
//!     name: default_v4
//!     config:
//!       metadata:
//!         name: default-ipv4-ippool
//!       spec:
//!         cidr: 10.48.0.0/16
//!         nat_outgoing: true
//! ```

use crate::error::ProviderError;
use crate::state::resource_address;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

/// Resources the user wants to exist
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub resources: Vec<ResourceBlock>,
}

/// One `resource` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceBlock {
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Local name; unique per type
    pub name: String,
    #[serde(default)]
    pub config: Value,
}

impl ResourceBlock {
    pub fn address(&self) -> String {
        resource_address(&self.resource_type, &self.name)
    }
}

impl Manifest {
    /// Parse a manifest and reject duplicate addresses
    pub fn parse(raw: &str) -> Result<Self, ProviderError> {
        let manifest: Manifest = serde_yaml::from_str(raw)?;

        let mut seen = HashSet::new();
        for block in &manifest.resources {
            let address = block.address();
            if !seen.insert(address.clone()) {
                return Err(ProviderError::DuplicateAddress(address));
            }
        }

        Ok(manifest)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ProviderError::io(path, e))?;
        Self::parse(&raw)
    }

    pub fn get(&self, address: &str) -> Option<&ResourceBlock> {
        self.resources.iter().find(|block| block.address() == address)
    }
}
