//! Resource handlers for Calico objects.
//!
//! - `bgp_peer`: `calico_bgppeer`
//! - `ip_pool`: `calico_ippool`
//!
//! Both follow the same template: map attributes onto the typed API object,
//! call the client, and map the returned object back.

pub mod bgp_peer;
pub mod ip_pool;
#[cfg(test)]
mod ip_pool_test;

use crate::resource_data::ResourceData;
use crate::schema::{Schema, SchemaMap};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde_json::Value;

pub use bgp_peer::{bgp_peer_from_data, resource_calico_bgp_peer, BgpPeerHandler};
pub use ip_pool::{ip_pool_from_data, resource_calico_ip_pool, IpPoolHandler};

/// `metadata` block shared by every Calico resource
pub(crate) fn metadata_schema() -> Schema {
    Schema::block(SchemaMap::from([(
        "name",
        Schema::string().required().force_new().validate(validate_name),
    )]))
    .required()
    .max_items(1)
}

/// Object metadata from the `metadata` block
pub(crate) fn object_meta_from_data(d: &ResourceData) -> ObjectMeta {
    ObjectMeta {
        name: Some(d.get_string("metadata.0.name")),
        ..Default::default()
    }
}

/// Calico names are lowercase DNS subdomains
fn validate_name(value: &Value) -> Result<(), String> {
    let name = value.as_str().unwrap_or_default();
    let valid = !name.is_empty()
        && name.len() <= 253
        && name
            .split('.')
            .all(|label| {
                !label.is_empty()
                    && label.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
                    && !label.starts_with('-')
                    && !label.ends_with('-')
            });

    if valid {
        Ok(())
    } else {
        Err(format!("'{}' is not a valid resource name (lowercase DNS subdomain)", name))
    }
}
