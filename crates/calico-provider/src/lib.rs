//! Calico resource provider
//!
//! Terraform-style resource handlers for Calico `BGPPeer` and `IPPool`
//! objects. Each handler maps a generic attribute map onto the typed
//! `projectcalico.org/v3` object and delegates the remote call to a
//! [`calico_client::CalicoClientTrait`].
//!
//! - [`schema`]: attribute schemas, validation and diffing
//! - [`resource_data`]: the attribute map handed to handlers
//! - [`resources`]: `calico_bgppeer` and `calico_ippool`
//! - [`provider`]: client handle and resource registry
//! - [`state`], [`manifest`], [`engine`]: the host side (refresh, plan, apply)
//! - [`testing`]: helpers for acceptance-style tests
//!
//! # Example
//!
//! ```no_run
//! use calico_provider::{engine, Manifest, Provider, ProviderConfig, State};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Provider::from_config(&ProviderConfig::from_env()?)?;
//! provider.configure().await?;
//!
//! let manifest = Manifest::load("calico.yaml").await?;
//! let mut state = State::load("calico.tfstate").await?;
//!
//! engine::refresh(&provider, &mut state).await?;
//! let plan = engine::plan(&provider, &manifest, &state)?;
//! let result = engine::apply(&provider, &plan, &mut state).await;
//! state.save("calico.tfstate").await?;
//! result?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod manifest;
pub mod provider;
pub mod resource_data;
pub mod resources;
pub mod schema;
pub mod state;
pub mod testing;

pub use config::ProviderConfig;
pub use error::ProviderError;
pub use manifest::Manifest;
pub use provider::Provider;
pub use resource_data::ResourceData;
pub use schema::{Resource, ResourceHandler};
pub use state::State;
pub use testing::get_resources_by_type;
