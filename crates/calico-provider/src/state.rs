//! Persisted resource state.
//!
//! The state file is JSON. Each save bumps `serial`; `lineage` is fixed when a
//! state is first created and identifies it across saves. Resources are keyed
//! by address, `<type>.<name>`.

use crate::error::ProviderError;
use crate::resource_data::ResourceData;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

/// Format version written to new state files
pub const STATE_VERSION: u32 = 1;

/// Address of a resource instance
pub fn resource_address(resource_type: &str, name: &str) -> String {
    format!("{}.{}", resource_type, name)
}

/// Whole state file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub version: u32,
    pub serial: u64,
    pub lineage: Uuid,
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub root: ModuleState,
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    pub fn new() -> Self {
        Self {
            version: STATE_VERSION,
            serial: 0,
            lineage: Uuid::new_v4(),
            last_modified: Utc::now(),
            root: ModuleState::default(),
        }
    }

    pub fn root_module(&self) -> &ModuleState {
        &self.root
    }

    pub fn root_module_mut(&mut self) -> &mut ModuleState {
        &mut self.root
    }

    /// Load state from `path`; a missing file yields an empty state.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let path = path.as_ref();
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No state at {}, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(e) => return Err(ProviderError::io(path, e)),
        };

        Ok(serde_json::from_slice(&raw)?)
    }

    /// Write state to `path`, replacing the previous file atomically.
    pub async fn save(&mut self, path: impl AsRef<Path>) -> Result<(), ProviderError> {
        let path = path.as_ref();
        self.serial += 1;
        self.last_modified = Utc::now();

        let body = serde_json::to_vec_pretty(self)?;
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");

        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| ProviderError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| ProviderError::io(path, e))?;

        debug!("Saved state serial {} to {}", self.serial, path.display());
        Ok(())
    }
}

/// Resources of one module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleState {
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceState>,
}

impl ModuleState {
    pub fn get(&self, address: &str) -> Option<&ResourceState> {
        self.resources.get(address)
    }

    pub fn insert(&mut self, address: impl Into<String>, resource: ResourceState) {
        self.resources.insert(address.into(), resource);
    }

    pub fn remove(&mut self, address: &str) -> Option<ResourceState> {
        self.resources.remove(address)
    }
}

/// One managed resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub primary: InstanceState,
}

impl ResourceState {
    pub fn new(resource_type: impl Into<String>, data: ResourceData) -> Self {
        let (id, attributes) = data.into_parts();
        Self {
            resource_type: resource_type.into(),
            primary: InstanceState { id, attributes },
        }
    }

    /// Attribute map for handing to a resource handler
    pub fn to_data(&self) -> ResourceData {
        ResourceData::with_id(self.primary.id.clone(), self.primary.attributes.clone())
    }
}

/// Identifier and attributes of the live object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceState {
    pub id: String,
    #[serde(default)]
    pub attributes: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn peer_state() -> ResourceState {
        ResourceState::new(
            "calico_bgppeer",
            ResourceData::with_id(
                "rack1-tor",
                json!({ "metadata": [{ "name": "rack1-tor" }], "spec": [{ "as_number": 64512 }] }),
            ),
        )
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = State::load(dir.path().join("calico.tfstate")).await.unwrap();

        assert_eq!(state.serial, 0);
        assert!(state.root_module().resources.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calico.tfstate");

        let mut state = State::new();
        state.root_module_mut().insert("calico_bgppeer.rack1-tor", peer_state());
        state.save(&path).await.unwrap();
        state.save(&path).await.unwrap();

        let loaded = State::load(&path).await.unwrap();
        assert_eq!(loaded.serial, 2);
        assert_eq!(loaded.lineage, state.lineage);
        assert_eq!(loaded, state);
        assert!(!dir.path().join("calico.tfstate.tmp").exists());
    }

    #[tokio::test]
    async fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calico.tfstate");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(State::load(&path).await, Err(ProviderError::StateFormat(_))));
    }

    #[test]
    fn test_resource_state_wire_format() {
        let value = serde_json::to_value(peer_state()).unwrap();
        assert_eq!(value["type"], "calico_bgppeer");
        assert_eq!(value["primary"]["id"], "rack1-tor");
        assert_eq!(value["primary"]["attributes"]["spec"][0]["as_number"], 64512);
        assert_eq!(peer_state().to_data().id(), "rack1-tor");
    }

    #[test]
    fn test_resource_address() {
        assert_eq!(resource_address("calico_ippool", "pool-a"), "calico_ippool.pool-a");
    }
}
