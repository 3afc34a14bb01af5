//! `calico_ippool` resource

use super::{metadata_schema, object_meta_from_data};
use crate::error::ProviderError;
use crate::resource_data::ResourceData;
use crate::schema::{Importer, Resource, ResourceHandler, Schema, SchemaMap};
use calico_client::CalicoClientTrait;
use crds::{IPPool, IPPoolSpec, IpipMode};
use ipnet::IpNet;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Resource type name
pub const IP_POOL_TYPE: &str = "calico_ippool";

/// Schema and handler for IP pools
pub fn resource_calico_ip_pool() -> Resource {
    let spec = SchemaMap::from([
        ("cidr", Schema::string().force_new().validate(validate_cidr)),
        ("nat_outgoing", Schema::bool()),
        (
            "ipip_mode",
            Schema::string()
                .default_value(IpipMode::Never.as_str())
                .validate(validate_ipip_mode),
        ),
        ("disabled", Schema::bool()),
    ]);

    Resource::new(
        IP_POOL_TYPE,
        SchemaMap::from([
            ("metadata", metadata_schema()),
            ("spec", Schema::block(spec).max_items(1)),
        ]),
        Arc::new(IpPoolHandler),
    )
    .with_importer(Importer::Passthrough)
}

fn validate_cidr(value: &Value) -> Result<(), String> {
    let raw = value.as_str().unwrap_or_default();
    raw.parse::<IpNet>()
        .map(|_| ())
        .map_err(|_| format!("'{}' is not a valid IPv4 or IPv6 CIDR", raw))
}

fn validate_ipip_mode(value: &Value) -> Result<(), String> {
    let raw = value.as_str().unwrap_or_default();
    if raw.is_empty() {
        return Ok(());
    }
    raw.parse::<IpipMode>().map(|_| ()).map_err(|e| e.to_string())
}

/// Build the API object from the attributes (used for create and update)
pub fn ip_pool_from_data(d: &ResourceData) -> Result<IPPool, ProviderError> {
    let ipip_mode = d
        .get_opt_string("spec.0.ipip_mode")
        .map(|mode| {
            mode.parse::<IpipMode>().map_err(|e| ProviderError::InvalidAttribute {
                path: "spec.0.ipip_mode".to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()?;

    let spec = IPPoolSpec {
        cidr: d.get_string("spec.0.cidr"),
        nat_outgoing: d.get_bool("spec.0.nat_outgoing"),
        ipip_mode,
        disabled: d.get_bool("spec.0.disabled"),
    };

    let mut pool = IPPool::new("", spec);
    pool.metadata = object_meta_from_data(d);
    Ok(pool)
}

/// Overwrite every attribute from the fetched object
fn ip_pool_to_data(pool: &IPPool, d: &mut ResourceData) -> Result<(), ProviderError> {
    let name = pool.metadata.name.clone().unwrap_or_default();

    d.set_id(name.as_str());
    d.set("metadata.0.name", name.as_str())?;
    d.set("spec.0.cidr", pool.spec.cidr.as_str())?;
    d.set_opt_string("spec.0.ipip_mode", pool.spec.ipip_mode.as_ref().map(IpipMode::as_str))?;
    d.set("spec.0.nat_outgoing", pool.spec.nat_outgoing)?;
    d.set("spec.0.disabled", pool.spec.disabled)?;

    Ok(())
}

/// Handler for `calico_ippool`
#[derive(Debug, Clone, Copy, Default)]
pub struct IpPoolHandler;

#[async_trait::async_trait]
impl ResourceHandler for IpPoolHandler {
    async fn create(&self, d: &mut ResourceData, client: &dyn CalicoClientTrait) -> Result<(), ProviderError> {
        let pool = ip_pool_from_data(d)?;
        let name = pool.metadata.name.clone().unwrap_or_default();

        info!("Creating IPPool {} ({})", name, pool.spec.cidr);
        client.create_ip_pool(&pool).await?;

        d.set_id(name);
        self.read(d, client).await
    }

    async fn read(&self, d: &mut ResourceData, client: &dyn CalicoClientTrait) -> Result<(), ProviderError> {
        if d.is_gone() {
            debug!("IPPool has no id, nothing to read");
            return Ok(());
        }
        let name = d.id().to_string();
        debug!("Reading IPPool {}", name);

        let pool = match client.get_ip_pool(&name).await {
            Ok(pool) => pool,
            Err(e) if e.is_not_found() => {
                warn!("IPPool {} no longer exists, clearing id", name);
                d.clear_id();
                return Ok(());
            }
            Err(e) => {
                error!("Failed to read IPPool {}: {}", name, e);
                return Err(e.into());
            }
        };

        ip_pool_to_data(&pool, d)
    }

    async fn update(&self, d: &mut ResourceData, client: &dyn CalicoClientTrait) -> Result<(), ProviderError> {
        let pool = ip_pool_from_data(d)?;

        info!("Updating IPPool {}", d.id());
        client.update_ip_pool(&pool).await?;
        Ok(())
    }

    async fn delete(&self, d: &mut ResourceData, client: &dyn CalicoClientTrait) -> Result<(), ProviderError> {
        if d.is_gone() {
            warn!("IPPool has no id, skipping delete");
            return Ok(());
        }
        info!("Deleting IPPool {}", d.id());
        client.delete_ip_pool(d.id()).await?;
        Ok(())
    }
}
