//! `calico_bgppeer` resource

use super::{metadata_schema, object_meta_from_data};
use crate::error::ProviderError;
use crate::resource_data::ResourceData;
use crate::schema::{Importer, Resource, ResourceHandler, Schema, SchemaMap};
use calico_client::CalicoClientTrait;
use crds::{BGPPeer, BGPPeerSpec};
use serde_json::Value;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Resource type name
pub const BGP_PEER_TYPE: &str = "calico_bgppeer";

/// Schema and handler for BGP peers
pub fn resource_calico_bgp_peer() -> Resource {
    let spec = SchemaMap::from([
        ("as_number", Schema::int().validate(validate_as_number)),
        ("node", Schema::string().force_new()),
        ("node_selector", Schema::string()),
        ("peer_ip", Schema::string().validate(validate_peer_ip)),
        ("peer_selector", Schema::string()),
    ]);

    Resource::new(
        BGP_PEER_TYPE,
        SchemaMap::from([
            ("metadata", metadata_schema()),
            ("spec", Schema::block(spec).max_items(1)),
        ]),
        Arc::new(BgpPeerHandler),
    )
    .with_importer(Importer::Passthrough)
}

fn validate_as_number(value: &Value) -> Result<(), String> {
    match value.as_i64() {
        Some(n) if u32::try_from(n).is_ok() => Ok(()),
        _ => Err(format!("{} is not a valid AS number (0-{})", value, u32::MAX)),
    }
}

fn validate_peer_ip(value: &Value) -> Result<(), String> {
    let raw = value.as_str().unwrap_or_default();
    if raw.parse::<IpAddr>().is_ok() || raw.parse::<SocketAddr>().is_ok() {
        Ok(())
    } else {
        Err(format!("'{}' is not an IP address or IP:port", raw))
    }
}

/// Build the API object from the attributes (used for create and update)
pub fn bgp_peer_from_data(d: &ResourceData) -> Result<BGPPeer, ProviderError> {
    let as_number = d
        .get_int("spec.0.as_number")?
        .map(|n| {
            u32::try_from(n).map_err(|_| ProviderError::InvalidAttribute {
                path: "spec.0.as_number".to_string(),
                reason: format!("{} is out of range for an AS number", n),
            })
        })
        .transpose()?;

    let spec = BGPPeerSpec {
        as_number,
        node: d.get_opt_string("spec.0.node"),
        node_selector: d.get_opt_string("spec.0.node_selector"),
        peer_ip: d.get_opt_string("spec.0.peer_ip"),
        peer_selector: d.get_opt_string("spec.0.peer_selector"),
    };

    let mut peer = BGPPeer::new("", spec);
    peer.metadata = object_meta_from_data(d);
    Ok(peer)
}

/// Overwrite every attribute from the fetched object
fn bgp_peer_to_data(peer: &BGPPeer, d: &mut ResourceData) -> Result<(), ProviderError> {
    let name = peer.metadata.name.clone().unwrap_or_default();

    d.set_id(name.as_str());
    d.set("metadata.0.name", name.as_str())?;
    match peer.spec.as_number {
        Some(asn) => d.set("spec.0.as_number", asn)?,
        None => d.remove("spec.0.as_number")?,
    }
    d.set_opt_string("spec.0.node", peer.spec.node.as_deref())?;
    d.set_opt_string("spec.0.node_selector", peer.spec.node_selector.as_deref())?;
    d.set_opt_string("spec.0.peer_ip", peer.spec.peer_ip.as_deref())?;
    d.set_opt_string("spec.0.peer_selector", peer.spec.peer_selector.as_deref())?;

    Ok(())
}

/// Handler for `calico_bgppeer`
#[derive(Debug, Clone, Copy, Default)]
pub struct BgpPeerHandler;

#[async_trait::async_trait]
impl ResourceHandler for BgpPeerHandler {
    async fn create(&self, d: &mut ResourceData, client: &dyn CalicoClientTrait) -> Result<(), ProviderError> {
        let peer = bgp_peer_from_data(d)?;
        let name = peer.metadata.name.clone().unwrap_or_default();

        info!("Creating BGPPeer {}", name);
        client.create_bgp_peer(&peer).await?;

        d.set_id(name);
        self.read(d, client).await
    }

    async fn read(&self, d: &mut ResourceData, client: &dyn CalicoClientTrait) -> Result<(), ProviderError> {
        if d.is_gone() {
            debug!("BGPPeer has no id, nothing to read");
            return Ok(());
        }
        let name = d.id().to_string();
        debug!("Reading BGPPeer {}", name);

        let peer = match client.get_bgp_peer(&name).await {
            Ok(peer) => peer,
            Err(e) if e.is_not_found() => {
                warn!("BGPPeer {} no longer exists, clearing id", name);
                d.clear_id();
                return Ok(());
            }
            Err(e) => {
                error!("Failed to read BGPPeer {}: {}", name, e);
                return Err(e.into());
            }
        };

        bgp_peer_to_data(&peer, d)
    }

    async fn update(&self, d: &mut ResourceData, client: &dyn CalicoClientTrait) -> Result<(), ProviderError> {
        let peer = bgp_peer_from_data(d)?;

        info!("Updating BGPPeer {}", d.id());
        client.update_bgp_peer(&peer).await?;
        Ok(())
    }

    async fn delete(&self, d: &mut ResourceData, client: &dyn CalicoClientTrait) -> Result<(), ProviderError> {
        if d.is_gone() {
            warn!("BGPPeer has no id, skipping delete");
            return Ok(());
        }
        info!("Deleting BGPPeer {}", d.id());
        client.delete_bgp_peer(d.id()).await?;
        Ok(())
    }
}
