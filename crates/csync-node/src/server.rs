//! Role wiring: store, peer and services behind one API filter

use crate::config::{NodeConfig, Role};
use crate::routes;
use csync_peer::{ConsumerService, Outbox, SharedTransport, SourceService};
use csync_store::SharedStore;
use tracing::{info, warn};
use warp::filters::BoxedFilter;
use warp::reply::Response;

/// Build the API for the configured role
///
/// A source starts its outbound delivery task here. A consumer with
/// `pull_on_start` set pulls a snapshot first; a failed pull is logged and
/// the node starts empty.
pub async fn build_api(
    config: &NodeConfig,
    store: SharedStore,
    peer: SharedTransport,
) -> BoxedFilter<(Response,)> {
    match config.role {
        Role::Source => {
            // The delivery task lives as long as the service holding the outbox.
            let (outbox, _worker) = Outbox::spawn(peer, config.peer.outbox_capacity);
            routes::source_api(SourceService::new(store, outbox))
        }
        Role::Consumer => {
            let service = ConsumerService::new(store, peer);
            if config.pull_on_start {
                match service.pull_snapshot().await {
                    Ok(stats) => info!(
                        projects = stats.projects,
                        conditions = stats.conditions,
                        "initial snapshot pulled"
                    ),
                    Err(error) => warn!(%error, "initial snapshot pull failed; starting empty"),
                }
            }
            routes::consumer_api(service)
        }
    }
}
