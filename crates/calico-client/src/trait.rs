//! CalicoClient trait for mocking
//!
//! This trait abstracts the Calico API client so resource handlers can be
//! exercised against an in-memory mock in unit tests.

use crate::error::CalicoError;
use crds::{BGPPeer, IPPool};

/// Trait for Calico API client operations
///
/// Every operation is keyed by object name. A missing object is reported as
/// [`CalicoError::ResourceDoesNotExist`].
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait CalicoClientTrait: Send + Sync {
    /// Get the base URL
    fn base_url(&self) -> &str;

    /// Check connectivity and that the token may read Calico resources
    async fn validate_token(&self) -> Result<(), CalicoError>;

    // BGP peers
    async fn get_bgp_peer(&self, name: &str) -> Result<BGPPeer, CalicoError>;
    async fn create_bgp_peer(&self, peer: &BGPPeer) -> Result<BGPPeer, CalicoError>;
    async fn update_bgp_peer(&self, peer: &BGPPeer) -> Result<BGPPeer, CalicoError>;
    async fn delete_bgp_peer(&self, name: &str) -> Result<(), CalicoError>;

    // IP pools
    async fn get_ip_pool(&self, name: &str) -> Result<IPPool, CalicoError>;
    async fn create_ip_pool(&self, pool: &IPPool) -> Result<IPPool, CalicoError>;
    async fn update_ip_pool(&self, pool: &IPPool) -> Result<IPPool, CalicoError>;
    async fn delete_ip_pool(&self, name: &str) -> Result<(), CalicoError>;
}
