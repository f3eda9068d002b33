use anyhow::Context;
use clap::Parser;
use csync_node::{build_api, routes, telemetry, Cli};
use csync_peer::{HttpPeer, SharedTransport};
use csync_store::ConditionTreeStore;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.verbose).context("failed to install log subscriber")?;

    let config = cli.resolve().context("invalid configuration")?;
    info!(
        role = %config.role,
        listen = %config.listen,
        peer = %config.peer.base_url,
        "starting csync-node"
    );

    let peer: SharedTransport = Arc::new(HttpPeer::new(&config.peer)?);
    let api = build_api(&config, ConditionTreeStore::shared(), peer).await;

    let (addr, server) = warp::serve(routes::finish(api))
        .try_bind_with_graceful_shutdown(config.listen, shutdown_signal())
        .with_context(|| format!("cannot bind {}", config.listen))?;
    info!(%addr, "listening");

    server.await;
    info!("stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "cannot listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
}
