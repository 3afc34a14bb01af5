//! IPPool resource
//!
//! Defines an address range that Calico allocates workload addresses from,
//! together with its NAT and IP-in-IP encapsulation settings.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(CustomResource, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "projectcalico.org",
    version = "v3",
    kind = "IPPool",
    plural = "ippools",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct IPPoolSpec {
    /// Pool CIDR (e.g., "10.244.0.0/16")
    pub cidr: String,

    /// Masquerade traffic leaving the pool towards non-pool destinations
    #[serde(default)]
    pub nat_outgoing: bool,

    /// IP-in-IP encapsulation mode; the API server defaults it to `Never`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipip_mode: Option<IpipMode>,

    /// Stop allocating new addresses from this pool
    #[serde(default)]
    pub disabled: bool,
}

/// IP-in-IP encapsulation mode of a pool
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
pub enum IpipMode {
    /// Never encapsulate
    #[default]
    Never,

    /// Always encapsulate
    Always,

    /// Encapsulate only when crossing a subnet boundary
    CrossSubnet,
}

impl IpipMode {
    /// All accepted modes, in wire form
    pub const VARIANTS: [&'static str; 3] = ["Never", "Always", "CrossSubnet"];

    /// Wire form of the mode
    pub fn as_str(&self) -> &'static str {
        match self {
            IpipMode::Never => "Never",
            IpipMode::Always => "Always",
            IpipMode::CrossSubnet => "CrossSubnet",
        }
    }
}

impl fmt::Display for IpipMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of [`IpipMode::VARIANTS`]
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid IPIP mode '{0}', expected one of Never, Always, CrossSubnet")]
pub struct ParseIpipModeError(pub String);

impl FromStr for IpipMode {
    type Err = ParseIpipModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Never" => Ok(IpipMode::Never),
            "Always" => Ok(IpipMode::Always),
            "CrossSubnet" => Ok(IpipMode::CrossSubnet),
            other => Err(ParseIpipModeError(other.to_string())),
        }
    }
}
