//! Acceptance-style tests for the Calico provider
//!
//! The mock-backed tests run everywhere. Tests marked `#[ignore]` need a
//! running Calico API server; set CALICO_API_URL and CALICO_TOKEN to run them.

use calico_client::MockCalicoClient;
use calico_provider::testing::{check_resources_destroyed, get_resources_by_type};
use calico_provider::{engine, Manifest, Provider, ProviderConfig, State};
use std::sync::Arc;

const MANIFEST: &str = r#"
resources:
  - type: calico_bgppeer
    name: tor
    config:
      metadata:
        name: rack1-tor
      spec:
        as_number: "64512"
        node: node-1
        peer_ip: 10.0.0.1
  - type: calico_ippool
    name: v4
    config:
      metadata:
        name: pool-v4
      spec:
        cidr: 10.48.0.0/16
        nat_outgoing: true
  - type: calico_ippool
    name: v6
    config:
      metadata:
        name: pool-v6
      spec:
        cidr: fd00:10:48::/64
        ipip_mode: Never
"#;

#[tokio::test]
async fn test_apply_refresh_destroy_with_state_file() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("calico.tfstate");
    let mock = MockCalicoClient::new("http://test-calico");
    let provider = Provider::new(Arc::new(mock.clone()));
    let manifest = Manifest::parse(MANIFEST).unwrap();

    let mut state = State::load(&state_path).await.unwrap();
    let plan = engine::plan(&provider, &manifest, &state).unwrap();
    engine::apply(&provider, &plan, &mut state).await.unwrap();
    state.save(&state_path).await.unwrap();

    let mut state = State::load(&state_path).await.unwrap();
    let pools = get_resources_by_type("calico_ippool", &state);
    assert_eq!(pools.len(), 2);
    assert_eq!(get_resources_by_type("calico_bgppeer", &state).len(), 1);
    assert_eq!(mock.bgp_peer("rack1-tor").unwrap().spec.as_number, Some(64512));

    engine::refresh(&provider, &mut state).await.unwrap();
    let plan = engine::plan(&provider, &manifest, &state).unwrap();
    assert!(!plan.has_changes());

    let recorded = state.clone();
    engine::destroy(&provider, &mut state).await.unwrap();
    state.save(&state_path).await.unwrap();

    let destroyed = State::load(&state_path).await.unwrap();
    assert!(destroyed.root_module().resources.is_empty());
    check_resources_destroyed(&provider, &recorded, "calico_ippool").await.unwrap();
    check_resources_destroyed(&provider, &recorded, "calico_bgppeer").await.unwrap();
    assert!(mock.ip_pool("pool-v4").is_none());
    assert!(mock.bgp_peer("rack1-tor").is_none());
}

#[tokio::test]
async fn test_out_of_band_delete_is_recreated() {
    let mock = MockCalicoClient::new("http://test-calico");
    let provider = Provider::new(Arc::new(mock.clone()));
    let manifest = Manifest::parse(MANIFEST).unwrap();
    let mut state = State::new();

    let plan = engine::plan(&provider, &manifest, &state).unwrap();
    engine::apply(&provider, &plan, &mut state).await.unwrap();
    let recorded = state.clone();

    mock.remove_bgp_peer("rack1-tor");
    assert!(check_resources_destroyed(&provider, &recorded, "calico_bgppeer").await.is_ok());

    let removed = engine::refresh(&provider, &mut state).await.unwrap();
    assert_eq!(removed, vec!["calico_bgppeer.tor"]);

    let plan = engine::plan(&provider, &manifest, &state).unwrap();
    assert_eq!(plan.summary().add, 1);
    engine::apply(&provider, &plan, &mut state).await.unwrap();
    assert!(mock.bgp_peer("rack1-tor").is_some());
}

#[tokio::test]
#[ignore] // Requires running Calico API server
async fn test_live_ip_pool_lifecycle() {
    let config = ProviderConfig::from_env().expect("Failed to read CALICO_* configuration");
    let provider = Provider::from_config(&config).expect("Failed to create provider");
    provider.configure().await.expect("Calico API is not usable");

    let manifest = Manifest::parse(
        r#"
resources:
  - type: calico_ippool
    name: it
    config:
      metadata:
        name: calico-provider-it-pool
      spec:
        cidr: 10.251.0.0/24
"#,
    )
    .unwrap();

    let mut state = State::new();
    let plan = engine::plan(&provider, &manifest, &state).unwrap();
    engine::apply(&provider, &plan, &mut state).await.expect("Failed to apply");

    let recorded = state.clone();
    engine::destroy(&provider, &mut state).await.expect("Failed to destroy");
    check_resources_destroyed(&provider, &recorded, "calico_ippool")
        .await
        .expect("Pool still exists");
}
