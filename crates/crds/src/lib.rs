//! Calico v3 resource definitions
//!
//! Typed `projectcalico.org/v3` objects exchanged with the Calico API server.
//! Calico owns these definitions; the types here only describe the wire form.

pub mod bgp_peer;
pub mod ip_pool;

pub use bgp_peer::*;
pub use ip_pool::*;

/// API group served by the Calico API server
pub const CALICO_API_GROUP: &str = "projectcalico.org";

/// API version of the resources in this crate
pub const CALICO_API_VERSION: &str = "v3";
