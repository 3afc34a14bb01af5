//! Helpers for acceptance-style tests that inspect state.

use crate::error::ProviderError;
use crate::provider::Provider;
use crate::state::{ResourceState, State};
use tracing::debug;

/// Every resource in the root module whose type is `resource_type`, in address order.
pub fn get_resources_by_type<'a>(resource_type: &str, state: &'a State) -> Vec<&'a ResourceState> {
    state
        .root_module()
        .resources
        .values()
        .filter(|rs| rs.resource_type == resource_type)
        .collect()
}

/// Fail if any `resource_type` resource recorded in `state` can still be read.
pub async fn check_resources_destroyed(
    provider: &Provider,
    state: &State,
    resource_type: &str,
) -> Result<(), ProviderError> {
    let resource = provider.resource(resource_type)?;

    for rs in get_resources_by_type(resource_type, state) {
        let mut d = rs.to_data();
        resource.read(&mut d, provider.client()).await?;
        if !d.is_gone() {
            return Err(ProviderError::ResourceStillExists(format!(
                "{} {}",
                resource_type, rs.primary.id
            )));
        }
        debug!("{} {} is destroyed", resource_type, rs.primary.id);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource_data::ResourceData;
    use calico_client::MockCalicoClient;
    use crds::{IPPool, IPPoolSpec};
    use serde_json::json;
    use std::sync::Arc;

    fn state_with(entries: &[(&str, &str)]) -> State {
        let mut state = State::new();
        for (resource_type, name) in entries {
            state.root_module_mut().insert(
                format!("{}.{}", resource_type, name),
                ResourceState::new(
                    *resource_type,
                    ResourceData::with_id(*name, json!({ "metadata": [{ "name": name }] })),
                ),
            );
        }
        state
    }

    #[test]
    fn test_get_resources_by_type() {
        let state = state_with(&[
            ("calico_ippool", "pool-b"),
            ("calico_bgppeer", "peer-a"),
            ("calico_ippool", "pool-a"),
        ]);

        let pools = get_resources_by_type("calico_ippool", &state);
        let ids: Vec<_> = pools.iter().map(|rs| rs.primary.id.as_str()).collect();
        assert_eq!(ids, vec!["pool-a", "pool-b"]);

        assert_eq!(get_resources_by_type("calico_bgppeer", &state).len(), 1);
        assert!(get_resources_by_type("calico_felixconfig", &state).is_empty());
        assert!(get_resources_by_type("calico_ippool", &State::new()).is_empty());
    }

    #[tokio::test]
    async fn test_check_resources_destroyed() {
        let mock = MockCalicoClient::new("http://test-calico");
        let provider = Provider::new(Arc::new(mock.clone()));
        let state = state_with(&[("calico_ippool", "pool-a")]);

        check_resources_destroyed(&provider, &state, "calico_ippool").await.unwrap();

        mock.add_ip_pool(IPPool::new(
            "pool-a",
            IPPoolSpec {
                cidr: "10.0.0.0/24".to_string(),
                ..Default::default()
            },
        ));
        assert!(matches!(
            check_resources_destroyed(&provider, &state, "calico_ippool").await,
            Err(ProviderError::ResourceStillExists(_))
        ));
    }
}
