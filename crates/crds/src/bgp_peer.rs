//! BGPPeer resource
//!
//! A configured remote routing peer. Matches the `projectcalico.org/v3`
//! BGPPeer kind served by the Calico API server.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "projectcalico.org",
    version = "v3",
    kind = "BGPPeer",
    plural = "bgppeers",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct BGPPeerSpec {
    /// AS number of the remote peer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_number: Option<u32>,

    /// Node this peering applies to (empty means global)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,

    /// Selector for the nodes that should have this peering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<String>,

    /// IP address of the peer, optionally followed by `:port`
    #[serde(default, rename = "peerIP", skip_serializing_if = "Option::is_none")]
    pub peer_ip: Option<String>,

    /// Selector for the nodes that act as remote peers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_selector: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::Resource;

    #[test]
    fn test_bgp_peer_wire_names() {
        let peer = BGPPeer::new(
            "rack1-tor",
            BGPPeerSpec {
                as_number: Some(64512),
                peer_ip: Some("10.0.0.1".to_string()),
                ..Default::default()
            },
        );

        let value = serde_json::to_value(&peer).unwrap();
        assert_eq!(value["apiVersion"], "projectcalico.org/v3");
        assert_eq!(value["kind"], "BGPPeer");
        assert_eq!(value["metadata"]["name"], "rack1-tor");
        assert_eq!(value["spec"]["asNumber"], 64512);
        assert_eq!(value["spec"]["peerIP"], "10.0.0.1");
        // Unset fields are left for the API server to default
        assert!(value["spec"].get("node").is_none());
    }

    #[test]
    fn test_bgp_peer_url_path() {
        assert_eq!(BGPPeer::url_path(&(), None), "/apis/projectcalico.org/v3/bgppeers");
    }

    #[test]
    fn test_bgp_peer_from_yaml() {
        let yaml = r#"
apiVersion: projectcalico.org/v3
kind: BGPPeer
metadata:
  name: global-peer
spec:
  peerIP: 192.0.2.10:1179
  asNumber: 65001
  nodeSelector: rack == 'a'
"#;
        let peer: BGPPeer = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(peer.spec.peer_ip.as_deref(), Some("192.0.2.10:1179"));
        assert_eq!(peer.spec.as_number, Some(65001));
        assert_eq!(peer.spec.node_selector.as_deref(), Some("rack == 'a'"));
        assert_eq!(peer.spec.node, None);
    }
}
