//! Unit tests for the IP pool resource

#[cfg(test)]
mod tests {
    use super::super::ip_pool::*;
    use crate::error::ProviderError;
    use crate::resource_data::ResourceData;
    use calico_client::{CalicoError, MockCalicoClient};
    use crds::{IPPool, IPPoolSpec, IpipMode};
    use serde_json::{json, Value};

    fn pool_config() -> Value {
        json!({
            "metadata": [{ "name": "pool-a" }],
            "spec": [{
                "cidr": "10.48.0.0/16",
                "nat_outgoing": true,
                "ipip_mode": "CrossSubnet",
                "disabled": false
            }]
        })
    }

    #[tokio::test]
    async fn test_create_then_read_round_trips() {
        let client = MockCalicoClient::new("http://test-calico");
        let resource = resource_calico_ip_pool();
        let mut d = ResourceData::new(pool_config());

        resource.create(&mut d, &client).await.unwrap();

        assert_eq!(d.id(), "pool-a");
        assert_eq!(d.attributes(), &pool_config());

        let stored = client.ip_pool("pool-a").unwrap();
        assert_eq!(stored.spec.cidr, "10.48.0.0/16");
        assert!(stored.spec.nat_outgoing);
        assert_eq!(stored.spec.ipip_mode, Some(IpipMode::CrossSubnet));
    }

    #[tokio::test]
    async fn test_create_reads_back_server_defaults() {
        let client = MockCalicoClient::new("http://test-calico");
        let resource = resource_calico_ip_pool();
        let mut d = ResourceData::new(json!({
            "metadata": [{ "name": "pool-v6" }],
            "spec": [{ "cidr": "fd00:10:48::/64" }]
        }));

        resource.create(&mut d, &client).await.unwrap();

        assert_eq!(d.get_string("spec.0.ipip_mode"), "Never");
        assert!(!d.get_bool("spec.0.nat_outgoing"));
        assert_eq!(d.get("spec.0.disabled"), Some(&json!(false)));
    }

    #[tokio::test]
    async fn test_read_out_of_band_delete_clears_id() {
        let client = MockCalicoClient::new("http://test-calico");
        let resource = resource_calico_ip_pool();
        let mut d = ResourceData::new(pool_config());
        resource.create(&mut d, &client).await.unwrap();

        client.remove_ip_pool("pool-a");
        resource.read(&mut d, &client).await.unwrap();

        assert!(d.is_gone());
    }

    #[tokio::test]
    async fn test_delete_without_id_skips_client() {
        let client = MockCalicoClient::new("http://test-calico");
        client.add_ip_pool(IPPool::new(
            "pool-a",
            IPPoolSpec {
                cidr: "10.48.0.0/16".to_string(),
                ..Default::default()
            },
        ));
        let resource = resource_calico_ip_pool();
        let mut d = ResourceData::new(pool_config());

        resource.delete(&mut d, &client).await.unwrap();

        assert!(client.calls().is_empty());
        assert!(client.ip_pool("pool-a").is_some());
    }

    #[tokio::test]
    async fn test_read_uses_id() {
        let client = MockCalicoClient::new("http://test-calico");
        client.add_ip_pool(IPPool::new(
            "pool-b",
            IPPoolSpec {
                cidr: "10.50.0.0/16".to_string(),
                ..Default::default()
            },
        ));
        let resource = resource_calico_ip_pool();
        // Attributes still name another pool; the id wins
        let mut d = ResourceData::with_id("pool-b", pool_config());

        resource.read(&mut d, &client).await.unwrap();

        assert_eq!(d.get_string("metadata.0.name"), "pool-b");
        assert_eq!(d.get_string("spec.0.cidr"), "10.50.0.0/16");
        assert_eq!(client.calls(), vec!["get_ip_pool:pool-b"]);
    }

    #[tokio::test]
    async fn test_read_propagates_other_errors() {
        let client = MockCalicoClient::new("http://test-calico");
        client.set_failure(403, "forbidden");
        let resource = resource_calico_ip_pool();
        let mut d = ResourceData::with_id("pool-a", pool_config());

        let err = resource.read(&mut d, &client).await.unwrap_err();

        assert!(matches!(err, ProviderError::Calico(CalicoError::Status { code: 403, .. })));
        assert!(!d.is_gone());
    }

    #[tokio::test]
    async fn test_update_omitted_ipip_mode_reverts_to_default() {
        let client = MockCalicoClient::new("http://test-calico");
        let resource = resource_calico_ip_pool();
        let mut d = ResourceData::new(pool_config());
        resource.create(&mut d, &client).await.unwrap();

        let mut d = ResourceData::with_id(
            "pool-a",
            json!({
                "metadata": [{ "name": "pool-a" }],
                "spec": [{ "cidr": "10.48.0.0/16", "disabled": true }]
            }),
        );
        resource.update(&mut d, &client).await.unwrap();

        let stored = client.ip_pool("pool-a").unwrap();
        assert!(stored.spec.disabled);
        assert!(!stored.spec.nat_outgoing);
        assert_eq!(stored.spec.ipip_mode, Some(IpipMode::Never));
        // Update does not read back
        assert_eq!(d.get("spec.0.ipip_mode"), None);
    }

    #[tokio::test]
    async fn test_delete_then_delete_again_fails() {
        let client = MockCalicoClient::new("http://test-calico");
        let resource = resource_calico_ip_pool();
        let mut d = ResourceData::new(pool_config());
        resource.create(&mut d, &client).await.unwrap();

        resource.delete(&mut d, &client).await.unwrap();
        assert!(client.ip_pool("pool-a").is_none());

        let err = resource.delete(&mut d, &client).await.unwrap_err();
        assert!(matches!(err, ProviderError::Calico(e) if e.is_not_found()));
    }

    #[test]
    fn test_mapping_rejects_unknown_ipip_mode() {
        let d = ResourceData::new(json!({
            "metadata": [{ "name": "pool-a" }],
            "spec": [{ "cidr": "10.0.0.0/8", "ipip_mode": "Sometimes" }]
        }));

        assert!(matches!(
            ip_pool_from_data(&d),
            Err(ProviderError::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn test_mapping_without_ipip_mode() {
        let d = ResourceData::new(json!({
            "metadata": [{ "name": "pool-a" }],
            "spec": [{ "cidr": "10.0.0.0/8", "nat_outgoing": "true" }]
        }));

        let pool = ip_pool_from_data(&d).unwrap();
        assert_eq!(pool.metadata.name.as_deref(), Some("pool-a"));
        assert_eq!(pool.spec.ipip_mode, None);
        assert!(pool.spec.nat_outgoing);
    }

    #[test]
    fn test_schema_validation() {
        let resource = resource_calico_ip_pool();
        resource.validate(&pool_config()).unwrap();

        let err = resource
            .validate(&json!({
                "metadata": [{ "name": "pool-a" }],
                "spec": [{ "cidr": "10.0.0.0/33", "ipip_mode": "Sometimes" }]
            }))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("spec.0.cidr"));
        assert!(message.contains("spec.0.ipip_mode"));
    }

    #[test]
    fn test_cidr_change_forces_replacement() {
        let resource = resource_calico_ip_pool();
        let mut moved = pool_config();
        moved["spec"][0]["cidr"] = json!("10.49.0.0/16");
        assert!(resource.diff(&pool_config(), &moved).requires_replace());

        let mut toggled = pool_config();
        toggled["spec"][0]["nat_outgoing"] = json!(false);
        let diff = resource.diff(&pool_config(), &toggled);
        assert_eq!(diff.changes.len(), 1);
        assert!(!diff.requires_replace());
    }
}
