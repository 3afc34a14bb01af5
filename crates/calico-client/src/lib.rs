//! Calico REST API Client
//!
//! A Rust client library for the `projectcalico.org/v3` API served by the
//! Calico API server. Provides typed get/create/replace/delete operations for
//! BGP peers and IP pools, keyed by object name.
//!
//! # Example
//!
//! ```no_run
//! use calico_client::{CalicoClient, CalicoClientTrait, ClientOptions};
//! use crds::{IPPool, IPPoolSpec};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CalicoClient::new(
//!     "https://kubernetes.default.svc".to_string(),
//!     Some("your-api-token".to_string()),
//!     ClientOptions::default(),
//! )?;
//!
//! let pool = IPPool::new("pool-a", IPPoolSpec {
//!     cidr: "10.244.0.0/16".to_string(),
//!     nat_outgoing: true,
//!     ..Default::default()
//! });
//! client.create_ip_pool(&pool).await?;
//!
//! match client.get_ip_pool("pool-a").await {
//!     Ok(pool) => println!("pool {} exists", pool.spec.cidr),
//!     Err(e) if e.is_not_found() => println!("pool is gone"),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod common;
pub mod error;
#[path = "trait.rs"]
pub mod calico_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use calico_trait::CalicoClientTrait;
pub use client::{CalicoClient, ClientOptions};
pub use common::HttpClient;
pub use error::CalicoError;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockCalicoClient;
