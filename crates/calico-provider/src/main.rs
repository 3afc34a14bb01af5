//! Calico Provider CLI
//!
//! Manages Calico BGP peers and IP pools from a YAML manifest, keeping a
//! local state file of what it created:
//! - plan: show what apply would change
//! - apply: create, update, replace and delete to match the manifest
//! - refresh: re-read every managed object
//! - destroy: delete every managed object
//! - import: adopt an existing object
//! - show: print the state file
//!
//! API connection settings come from `CALICO_*` environment variables.

use anyhow::{Context, Result};
use calico_provider::engine::{self, Plan};
use calico_provider::{Manifest, Provider, ProviderConfig, State};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cmd {
    #[arg(short, long, global = true, default_value = "calico.yaml", help = "Manifest file")]
    manifest: PathBuf,

    #[arg(short, long, global = true, default_value = "calico.tfstate", help = "State file")]
    state: PathBuf,

    #[arg(long, global = true, help = "Skip refreshing state before planning")]
    no_refresh: bool,

    #[clap(subcommand)]
    sub: SubCmd,
}

#[derive(Debug, Clone, Subcommand)]
enum SubCmd {
    /// Show the changes apply would make
    Plan,
    /// Make remote objects match the manifest
    Apply,
    /// Re-read every object in state
    Refresh,
    /// Delete every object in state
    Destroy,
    /// Adopt an existing object into state
    Import {
        /// Resource type, e.g. calico_ippool
        resource_type: String,
        /// Local name in the manifest
        name: String,
        /// Name of the remote object
        id: String,
    },
    /// Print the state file
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cmd = Cmd::parse();
    let mut state = State::load(&cmd.state)
        .await
        .with_context(|| format!("loading state from {}", cmd.state.display()))?;

    if let SubCmd::Show = cmd.sub {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    let config = ProviderConfig::from_env()?;
    info!("Calico API: {}", config.api_url);
    let provider = Provider::from_config(&config)?;
    provider.configure().await.context("Calico API is not usable")?;

    match cmd.sub {
        SubCmd::Plan => {
            let manifest = Manifest::load(&cmd.manifest).await?;
            if !cmd.no_refresh {
                engine::refresh(&provider, &mut state).await?;
            }
            print_plan(&engine::plan(&provider, &manifest, &state)?);
        }
        SubCmd::Apply => {
            let manifest = Manifest::load(&cmd.manifest).await?;
            if !cmd.no_refresh {
                engine::refresh(&provider, &mut state).await?;
            }
            let plan = engine::plan(&provider, &manifest, &state)?;
            print_plan(&plan);
            let result = engine::apply(&provider, &plan, &mut state).await;
            save(&mut state, &cmd.state).await?;
            println!("Apply complete! Resources: {}", result?);
        }
        SubCmd::Refresh => {
            let removed = engine::refresh(&provider, &mut state).await?;
            save(&mut state, &cmd.state).await?;
            for address in removed {
                println!("{} no longer exists", address);
            }
        }
        SubCmd::Destroy => {
            if !cmd.no_refresh {
                engine::refresh(&provider, &mut state).await?;
            }
            print_plan(&engine::plan_destroy(&state));
            let result = engine::destroy(&provider, &mut state).await;
            save(&mut state, &cmd.state).await?;
            println!("Destroy complete! Resources: {}", result?);
        }
        SubCmd::Import { resource_type, name, id } => {
            engine::import(&provider, &mut state, &resource_type, &name, &id).await?;
            save(&mut state, &cmd.state).await?;
            println!("Imported {} as {}.{}", id, resource_type, name);
        }
        SubCmd::Show => {}
    }

    Ok(())
}

fn print_plan(plan: &Plan) {
    if !plan.has_changes() {
        println!("No changes. Remote objects match the manifest.");
        return;
    }
    for change in plan.changes.iter().filter(|c| c.action != engine::Action::NoOp) {
        print!("{}", change);
    }
    println!("Plan: {}", plan.summary());
}

async fn save(state: &mut State, path: &Path) -> Result<()> {
    state
        .save(path)
        .await
        .with_context(|| format!("saving state to {}", path.display()))
}
