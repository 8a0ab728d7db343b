use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use router::Router;
use tracing::trace;
use tracing_subscriber::{prelude::*, util::SubscriberInitExt};

mod asus_router;
mod config;
mod parse;
mod payload;
mod router;
mod token;

#[derive(clap::Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List clients known to the router
    Clients,
    /// Show live radio stats for associated clients
    Status,
    /// Authenticate and store a fresh session token
    Login,
    /// Block the given MACs, keeping existing blocks in place
    Block { macs: Vec<String> },
    /// Unblock the given MACs, keeping other blocks in place
    Unblock { macs: Vec<String> },
    /// Block every currently connected client
    BlockAll,
    /// Clear the block list
    UnblockAll,
}

fn main() -> Result<()> {
    configure_tracing();
    let options = Cli::parse();
    let config = config::get_config().context("Failed to read settings")?;
    let settings = config
        .router_settings()
        .context("Failed to resolve router credentials")?;
    let mut router =
        asus_router::AsusRouter::new(&settings).context("Failed to create router interface")?;

    match options.command {
        Commands::Clients => {
            for client in router.connected_clients()? {
                let marker = if client.is_blocked { " [blocked]" } else { "" };
                println!(
                    "{} {} {}{marker}",
                    client.mac_addr, client.ip_addr, client.name
                );
            }
        }
        Commands::Status => {
            for sample in fetch_statuses(&mut router)? {
                println!(
                    "{} {} tx {} rx {} up {}",
                    sample.mac_addr, sample.rssi, sample.tx_rate, sample.rx_rate, sample.connection_time
                );
            }
        }
        Commands::Login => {
            router.login()?;
            if !router.is_authenticated() {
                anyhow::bail!("Router rejected the credentials");
            }
        }
        Commands::Block { macs } => {
            let list = with_blocked(&router, &macs, |blocked, mac| blocked.push(mac))?;
            router.block_clients(&list)?;
        }
        Commands::Unblock { macs } => {
            let list = with_blocked(&router, &macs, |blocked, mac| blocked.retain(|b| b != &mac))?;
            router.block_clients(&list)?;
        }
        Commands::BlockAll => {
            let all: Vec<String> = router
                .connected_clients()?
                .into_iter()
                .map(|c| c.mac_addr)
                .collect();
            router.block_clients(&all)?;
        }
        Commands::UnblockAll => {
            router.unblock_all_clients()?;
        }
    }

    Ok(())
}

/// The status page needs a live session; on failure, login once and retry.
/// The router gives no structured "session expired" signal, so any transport
/// error triggers the one re-login.
fn fetch_statuses(
    router: &mut asus_router::AsusRouter,
) -> Result<Vec<router::ConnectionSample>> {
    match router.client_connection_statuses() {
        Ok(samples) => Ok(samples),
        Err(e) => {
            trace!("Status fetch failed ({e:#}), authenticating and retrying");
            router.login().context("Failed to login on router")?;
            router.client_connection_statuses()
        }
    }
}

/// The apply endpoint replaces the whole block list, so edits start from the
/// currently blocked set as reported by the router.
fn with_blocked(
    router: &impl Router,
    macs: &[String],
    mut edit: impl FnMut(&mut Vec<String>, String),
) -> Result<Vec<String>> {
    let mut blocked: Vec<String> = router
        .connected_clients()
        .context("Failed to get current block list")?
        .into_iter()
        .filter(|c| c.is_blocked)
        .map(|c| c.mac_addr)
        .collect();
    for mac in macs {
        edit(&mut blocked, mac.to_uppercase());
    }
    let mut seen = std::collections::HashSet::new();
    blocked.retain(|mac| seen.insert(mac.clone()));
    Ok(blocked)
}

pub fn configure_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new("wifimanager=trace"))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
