//! Internal session coordination for crawling operations.
//!
//! This module contains the [`CrawlSession`] which runs the breadth-first
//! exploration: one bounded pool of probe tasks per layer, with the next
//! layer's frontier built only after the current layer fully drains.

use crate::client::{Connector, GeoProvider, NodeApi};
use crate::registry::VisitedRegistry;
use crate::topology::{NodeOutcome, PeerRecord, Topology};
use log::{debug, info};
use peermap_client::{resolve_ip, Address};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Configuration for a crawl session.
#[derive(Debug, Clone)]
pub(crate) struct SessionConfig {
    /// Bound on simultaneously in-flight queries within a layer.
    pub max_concurrent_tasks: usize,
}

/// Internal coordinator for a crawling session.
///
/// The session owns the visited registry, so every run starts from a clean
/// slate and independent runs never interfere.
///
/// # Architecture
///
/// * **Scheduler** (`run()`) - Drives the layer loop: claims frontier
///   addresses, spawns bounded probe tasks, merges their results.
/// * **Probes** (`process()`) - Handle one node each: the two RPC calls,
///   then best-effort resolution and geo enrichment.
#[derive(Clone)]
pub(crate) struct CrawlSession<C: Connector, G: GeoProvider> {
    config: SessionConfig,
    connector: C,
    geo: G,
    registry: Arc<VisitedRegistry>,
}

impl<C: Connector, G: GeoProvider> CrawlSession<C, G> {
    pub(crate) fn new(config: SessionConfig, connector: C, geo: G) -> Self {
        Self {
            config,
            connector,
            geo,
            registry: Arc::new(VisitedRegistry::new()),
        }
    }

    /// Query one node and assemble its outcome.
    ///
    /// Any failure to obtain peers or version marks the address
    /// unreachable. Resolution and geo failures only degrade the record;
    /// they never fail the probe.
    async fn process(&self, address: &Address) -> NodeOutcome {
        debug!("Probing {address}");

        let api = match self.connector.connect(address) {
            Ok(api) => api,
            Err(err) => {
                debug!("Can't create client for {address}: {err}");
                return NodeOutcome::Unreachable;
            }
        };

        let peers = match api.get_peers().await {
            Ok(peers) => peers,
            Err(err) => {
                debug!("Can't fetch peers from {address}: {err}");
                return NodeOutcome::Unreachable;
            }
        };

        let version = match api.get_version().await {
            Ok(version) => version,
            Err(err) => {
                debug!("Can't fetch version from {address}: {err}");
                return NodeOutcome::Unreachable;
            }
        };

        let resolved_ip = resolve_ip(address).await;
        let geo = match resolved_ip {
            Some(ip) => match self.geo.lookup(ip).await {
                Ok(location) => Some(location),
                Err(err) => {
                    debug!("Geo lookup failed for {address} ({ip}): {err}");
                    None
                }
            },
            None => None,
        };

        info!(
            "Scanned peer {address} (version {version}, {} peers)",
            peers.len()
        );

        NodeOutcome::Reachable(PeerRecord {
            announced_address: address.clone(),
            resolved_ip,
            geo,
            version,
            peers,
        })
    }

    /// Run the breadth-first crawl to exhaustion.
    ///
    /// Each layer claims every frontier address not yet queried, probes
    /// them with bounded concurrency, commits the outcomes, and collects
    /// newly discovered addresses into the next frontier. The crawl
    /// terminates when a layer discovers nothing new. A single unreachable
    /// peer never aborts the run.
    pub(crate) async fn run(&self, seeds: Vec<Address>) -> Topology {
        let mut frontier = seeds;
        let mut layer = 0usize;

        while !frontier.is_empty() {
            layer += 1;
            let permits = Arc::new(Semaphore::new(self.config.max_concurrent_tasks));
            let mut tasks = Vec::new();

            for address in frontier.drain(..) {
                // The claim is the single-query-per-address guarantee; a
                // duplicate frontier entry or an address probed by an
                // earlier layer is dropped here.
                if !self.registry.claim(&address).await {
                    continue;
                }

                // Acquire_owned so the permit can be moved into the task;
                // holding it for the probe's lifetime bounds the fan-out.
                let permit = permits.clone().acquire_owned().await.unwrap();
                let session = self.clone();
                tasks.push(tokio::spawn(async move {
                    let outcome = session.process(&address).await;
                    drop(permit);
                    (address, outcome)
                }));
            }

            debug!("Layer {layer}: dispatched {} queries", tasks.len());

            let mut next_frontier = Vec::new();
            for task in tasks {
                let (address, outcome) = match task.await {
                    Ok(result) => result,
                    Err(err) => {
                        debug!("Probe task failed to complete: {err}");
                        continue;
                    }
                };

                let discovered = outcome
                    .record()
                    .map(|record| record.peers.clone())
                    .unwrap_or_default();

                if self.registry.commit(address, outcome).await {
                    for peer in discovered {
                        if !self.registry.is_recorded(&peer).await {
                            next_frontier.push(peer);
                        }
                    }
                }
            }

            info!(
                "Layer {layer} complete: {} addresses checked, {} newly discovered",
                self.registry.checked_count().await,
                next_frontier.len()
            );
            frontier = next_frontier;
        }

        info!("Crawler exhausted - all discovered peers processed");
        self.registry.snapshot().await
    }
}
