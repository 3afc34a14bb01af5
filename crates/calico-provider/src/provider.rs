//! Provider: the client handle plus the registry of resource types.

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::resources::{resource_calico_bgp_peer, resource_calico_ip_pool};
use crate::schema::Resource;
use calico_client::CalicoClientTrait;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info};

/// Every resource type this provider serves, keyed by type name
pub fn resource_types() -> BTreeMap<&'static str, Resource> {
    [resource_calico_bgp_peer(), resource_calico_ip_pool()]
        .into_iter()
        .map(|r| (r.type_name, r))
        .collect()
}

/// Shared client handle and resource registry
#[derive(Clone)]
pub struct Provider {
    client: Arc<dyn CalicoClientTrait>,
    resources: BTreeMap<&'static str, Resource>,
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("base_url", &self.client.base_url())
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Provider {
    /// Provider over an existing client (the mock, in tests)
    pub fn new(client: Arc<dyn CalicoClientTrait>) -> Self {
        Self {
            client,
            resources: resource_types(),
        }
    }

    /// Provider with a REST client built from `config`
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = config.to_client()?;
        Ok(Self::new(Arc::new(client)))
    }

    pub fn client(&self) -> &dyn CalicoClientTrait {
        self.client.as_ref()
    }

    /// Look up a resource type by name
    pub fn resource(&self, type_name: &str) -> Result<&Resource, ProviderError> {
        self.resources
            .get(type_name)
            .ok_or_else(|| ProviderError::UnknownResourceType(type_name.to_string()))
    }

    pub fn resource_type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    /// Check that the API is reachable and the credentials are accepted.
    pub async fn configure(&self) -> Result<(), ProviderError> {
        info!("Validating Calico API access at {}", self.client.base_url());
        self.client.validate_token().await.map_err(|e| {
            error!("Calico API validation failed: {}", e);
            ProviderError::from(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calico_client::{CalicoError, MockCalicoClient};

    #[test]
    fn test_registry() {
        let provider = Provider::new(Arc::new(MockCalicoClient::new("http://test-calico")));

        assert_eq!(
            provider.resource_type_names().collect::<Vec<_>>(),
            vec!["calico_bgppeer", "calico_ippool"]
        );
        assert_eq!(provider.resource("calico_ippool").unwrap().type_name, "calico_ippool");
        assert!(matches!(
            provider.resource("calico_felixconfig"),
            Err(ProviderError::UnknownResourceType(_))
        ));
    }

    #[tokio::test]
    async fn test_configure() {
        let mock = MockCalicoClient::new("http://test-calico");
        let provider = Provider::new(Arc::new(mock.clone()));

        provider.configure().await.unwrap();
        assert_eq!(mock.calls(), vec!["validate_token:"]);

        mock.set_failure(401, "Unauthorized");
        assert!(matches!(
            provider.configure().await,
            Err(ProviderError::Calico(CalicoError::Status { code: 401, .. }))
        ));
    }
}
