//! Mock CalicoClient for unit testing
//!
//! This module provides an in-memory implementation of `CalicoClientTrait`
//! that can be used in unit tests without a running Calico API server.
//!
//! The mock behaves like the API server where it matters to callers:
//! - names are unique per kind (create on an existing name conflicts)
//! - `uid` and `resourceVersion` are assigned on every write
//! - a replace carrying a stale `resourceVersion` conflicts
//! - server-side defaults are filled in (`ipipMode` defaults to `Never`)

use crate::calico_trait::CalicoClientTrait;
use crate::common::{require_name, resource_name};
use crate::error::CalicoError;
use crds::{BGPPeer, IPPool, IpipMode};
use kube::Resource;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mock CalicoClient for testing
///
/// Clones share the same store, so a test can keep a handle while the code
/// under test owns another.
#[derive(Debug, Clone)]
pub struct MockCalicoClient {
    pub(crate) base_url: String,
    pub(crate) bgp_peers: Arc<Mutex<HashMap<String, BGPPeer>>>,
    pub(crate) ip_pools: Arc<Mutex<HashMap<String, IPPool>>>,
    // Counter for resourceVersion
    pub(crate) next_version: Arc<Mutex<u64>>,
    // Injected failure returned by every call while set
    pub(crate) failure: Arc<Mutex<Option<(u16, String)>>>,
    // Injected failures for single operations, keyed by operation name
    pub(crate) operation_failures: Arc<Mutex<HashMap<String, (u16, String)>>>,
    // Operation log, e.g. "create_bgp_peer:rack1-tor"
    pub(crate) calls: Arc<Mutex<Vec<String>>>,
}

impl MockCalicoClient {
    /// Create a new mock client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            bgp_peers: Arc::new(Mutex::new(HashMap::new())),
            ip_pools: Arc::new(Mutex::new(HashMap::new())),
            next_version: Arc::new(Mutex::new(1)),
            failure: Arc::new(Mutex::new(None)),
            operation_failures: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a BGP peer to the mock store (for test setup)
    pub fn add_bgp_peer(&self, mut peer: BGPPeer) {
        self.stamp(&mut peer);
        let name = peer.meta().name.clone().unwrap_or_default();
        self.bgp_peers.lock().unwrap().insert(name, peer);
    }

    /// Add an IP pool to the mock store (for test setup)
    pub fn add_ip_pool(&self, mut pool: IPPool) {
        self.stamp(&mut pool);
        Self::default_ip_pool(&mut pool);
        let name = pool.meta().name.clone().unwrap_or_default();
        self.ip_pools.lock().unwrap().insert(name, pool);
    }

    /// Stored BGP peer, bypassing the call log
    pub fn bgp_peer(&self, name: &str) -> Option<BGPPeer> {
        self.bgp_peers.lock().unwrap().get(name).cloned()
    }

    /// Stored IP pool, bypassing the call log
    pub fn ip_pool(&self, name: &str) -> Option<IPPool> {
        self.ip_pools.lock().unwrap().get(name).cloned()
    }

    /// Remove a BGP peer behind the caller's back (simulates out-of-band deletion)
    pub fn remove_bgp_peer(&self, name: &str) {
        self.bgp_peers.lock().unwrap().remove(name);
    }

    /// Remove an IP pool behind the caller's back (simulates out-of-band deletion)
    pub fn remove_ip_pool(&self, name: &str) {
        self.ip_pools.lock().unwrap().remove(name);
    }

    /// Make every subsequent call fail with the given HTTP status
    pub fn set_failure(&self, code: u16, message: impl Into<String>) {
        *self.failure.lock().unwrap() = Some((code, message.into()));
    }

    /// Make one operation (e.g. `"get_ip_pool"`) fail with the given HTTP status.
    ///
    /// The status is mapped like a server response: 404 becomes not-found,
    /// and 409 on a create becomes already-exists.
    pub fn set_operation_failure(&self, operation: &str, code: u16, message: impl Into<String>) {
        self.operation_failures
            .lock()
            .unwrap()
            .insert(operation.to_string(), (code, message.into()));
    }

    /// Stop failing calls
    pub fn clear_failure(&self) {
        *self.failure.lock().unwrap() = None;
        self.operation_failures.lock().unwrap().clear();
    }

    /// Operations performed so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Forget the operation log
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, operation: &str, name: &str) -> Result<(), CalicoError> {
        self.calls.lock().unwrap().push(format!("{}:{}", operation, name));
        let injected = self
            .operation_failures
            .lock()
            .unwrap()
            .get(operation)
            .cloned()
            .or_else(|| self.failure.lock().unwrap().clone());
        match injected {
            Some((code, message)) => Err(CalicoError::Status {
                code,
                reason: "InjectedFailure".to_string(),
                message,
            }),
            None => Ok(()),
        }
    }

    fn stamp<K: Resource>(&self, object: &mut K) {
        let mut version = self.next_version.lock().unwrap();
        let meta = object.meta_mut();
        meta.resource_version = Some(version.to_string());
        if meta.uid.is_none() {
            meta.uid = Some(uuid::Uuid::new_v4().to_string());
        }
        *version += 1;
    }

    fn default_ip_pool(pool: &mut IPPool) {
        if pool.spec.ipip_mode.is_none() {
            pool.spec.ipip_mode = Some(IpipMode::Never);
        }
    }

    fn not_found(kind: &str, name: &str) -> CalicoError {
        CalicoError::ResourceDoesNotExist {
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }

    fn create_in<K>(&self, store: &Mutex<HashMap<String, K>>, object: &K) -> Result<K, CalicoError>
    where
        K: Resource<DynamicType = ()> + Clone,
    {
        let name = resource_name(object)?;
        let mut store = store.lock().unwrap();
        if store.contains_key(&name) {
            return Err(CalicoError::ResourceAlreadyExists {
                kind: K::kind(&()).to_string(),
                name,
            });
        }

        let mut created = object.clone();
        created.meta_mut().uid = None;
        self.stamp(&mut created);
        store.insert(name, created.clone());
        Ok(created)
    }

    fn replace_in<K>(&self, store: &Mutex<HashMap<String, K>>, object: &K) -> Result<K, CalicoError>
    where
        K: Resource<DynamicType = ()> + Clone,
    {
        let name = resource_name(object)?;
        let mut store = store.lock().unwrap();
        let current = store
            .get(&name)
            .ok_or_else(|| Self::not_found(&K::kind(&()), &name))?;

        if let Some(version) = &object.meta().resource_version {
            if current.meta().resource_version.as_ref() != Some(version) {
                return Err(CalicoError::Status {
                    code: 409,
                    reason: "Conflict".to_string(),
                    message: format!(
                        "the object has been modified; please apply your changes to the latest version ({})",
                        name
                    ),
                });
            }
        }

        let mut replaced = object.clone();
        replaced.meta_mut().uid = current.meta().uid.clone();
        self.stamp(&mut replaced);
        store.insert(name, replaced.clone());
        Ok(replaced)
    }
}

#[async_trait::async_trait]
impl CalicoClientTrait for MockCalicoClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn validate_token(&self) -> Result<(), CalicoError> {
        self.record("validate_token", "")
    }

    async fn get_bgp_peer(&self, name: &str) -> Result<BGPPeer, CalicoError> {
        self.record("get_bgp_peer", name)
            .map_err(|e| e.for_existing("BGPPeer", name))?;
        require_name("BGPPeer", name)?;
        self.bgp_peer(name)
            .ok_or_else(|| Self::not_found("BGPPeer", name))
    }

    async fn create_bgp_peer(&self, peer: &BGPPeer) -> Result<BGPPeer, CalicoError> {
        let name = peer.meta().name.as_deref().unwrap_or_default();
        self.record("create_bgp_peer", name)
            .map_err(|e| e.for_resource("BGPPeer", name))?;
        self.create_in(&self.bgp_peers, peer)
    }

    async fn update_bgp_peer(&self, peer: &BGPPeer) -> Result<BGPPeer, CalicoError> {
        let name = peer.meta().name.as_deref().unwrap_or_default();
        self.record("update_bgp_peer", name)
            .map_err(|e| e.for_existing("BGPPeer", name))?;
        self.replace_in(&self.bgp_peers, peer)
    }

    async fn delete_bgp_peer(&self, name: &str) -> Result<(), CalicoError> {
        self.record("delete_bgp_peer", name)
            .map_err(|e| e.for_existing("BGPPeer", name))?;
        require_name("BGPPeer", name)?;
        self.bgp_peers
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Self::not_found("BGPPeer", name))
    }

    async fn get_ip_pool(&self, name: &str) -> Result<IPPool, CalicoError> {
        self.record("get_ip_pool", name)
            .map_err(|e| e.for_existing("IPPool", name))?;
        require_name("IPPool", name)?;
        self.ip_pool(name)
            .ok_or_else(|| Self::not_found("IPPool", name))
    }

    async fn create_ip_pool(&self, pool: &IPPool) -> Result<IPPool, CalicoError> {
        let name = pool.meta().name.as_deref().unwrap_or_default();
        self.record("create_ip_pool", name)
            .map_err(|e| e.for_resource("IPPool", name))?;
        let mut pool = pool.clone();
        Self::default_ip_pool(&mut pool);
        self.create_in(&self.ip_pools, &pool)
    }

    async fn update_ip_pool(&self, pool: &IPPool) -> Result<IPPool, CalicoError> {
        let name = pool.meta().name.as_deref().unwrap_or_default();
        self.record("update_ip_pool", name)
            .map_err(|e| e.for_existing("IPPool", name))?;
        let mut pool = pool.clone();
        Self::default_ip_pool(&mut pool);
        self.replace_in(&self.ip_pools, &pool)
    }

    async fn delete_ip_pool(&self, name: &str) -> Result<(), CalicoError> {
        self.record("delete_ip_pool", name)
            .map_err(|e| e.for_existing("IPPool", name))?;
        require_name("IPPool", name)?;
        self.ip_pools
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Self::not_found("IPPool", name))
    }
}
