//! The public crawler type and its entry point.

use crate::builder::CrawlerBuilder;
use crate::client::HttpConnector;
use crate::session::{CrawlSession, SessionConfig};
use crate::topology::Topology;
use log::info;
use peermap_client::{Address, AddressError, GeoClient, GeoError};
use rand::seq::SliceRandom;
use std::fmt;
use std::time::Duration;

/// Errors that can occur before any querying begins.
///
/// Once a crawl is underway, per-node failures are absorbed into the
/// topology record and never surface here.
#[derive(Debug)]
pub enum CrawlerError {
    /// The bootstrap configuration contained no seed addresses.
    NoSeeds,
    /// A configured seed address could not be normalized.
    InvalidSeed {
        seed: String,
        source: AddressError,
    },
    /// The geo lookup client could not be constructed.
    Geo(GeoError),
}

impl fmt::Display for CrawlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlerError::NoSeeds => write!(f, "Bootstrap configuration has no seed addresses"),
            CrawlerError::InvalidSeed { seed, source } => {
                write!(f, "Unusable seed address {seed:?}: {source}")
            }
            CrawlerError::Geo(err) => write!(f, "Can't set up geo lookup client: {err}"),
        }
    }
}

impl std::error::Error for CrawlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CrawlerError::NoSeeds => None,
            CrawlerError::InvalidSeed { source, .. } => Some(source),
            CrawlerError::Geo(err) => Some(err),
        }
    }
}

/// A crawler for an HTTP peer-to-peer network.
///
/// Starting from a set of bootstrap addresses, the crawler queries every
/// reachable node for its peer list and version, breadth-first, until no
/// new addresses are discovered. Each address is queried at most once per
/// run; the product is a [`Topology`] mapping every queried address to its
/// outcome.
#[derive(Debug, Clone)]
pub struct Crawler {
    max_concurrent_tasks: usize,
    peer_timeout: Duration,
    default_port: u16,
}

impl Crawler {
    pub(crate) fn new(
        max_concurrent_tasks: usize,
        peer_timeout: Duration,
        default_port: u16,
    ) -> Self {
        Crawler {
            max_concurrent_tasks,
            peer_timeout,
            default_port,
        }
    }

    /// Crawl the network starting from the given bootstrap addresses.
    ///
    /// Seed order carries no meaning and is shuffled before the first
    /// layer. The crawl runs until a layer discovers no new addresses;
    /// there is no layer-count or wall-clock cap.
    ///
    /// # Arguments
    ///
    /// * `seeds` - Bootstrap addresses, e.g. `["us-east.signum.network"]`.
    ///
    /// # Returns
    ///
    /// * `Ok(Topology)` - The finalized topology record. Unreachable peers
    ///   are entries in the record, not errors.
    /// * `Err(CrawlerError)` - If the seed list is empty or unusable.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), peermap_crawler::CrawlerError> {
    /// use peermap_crawler::CrawlerBuilder;
    ///
    /// let crawler = CrawlerBuilder::new().build();
    /// let topology = crawler.crawl(["us-east.signum.network"]).await?;
    /// println!("Discovered {} nodes", topology.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn crawl<I, S>(&self, seeds: I) -> Result<Topology, CrawlerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut addresses = Vec::new();
        for seed in seeds {
            let raw = seed.as_ref();
            let address = Address::parse(raw, self.default_port).map_err(|source| {
                CrawlerError::InvalidSeed {
                    seed: raw.to_string(),
                    source,
                }
            })?;
            addresses.push(address);
        }
        if addresses.is_empty() {
            return Err(CrawlerError::NoSeeds);
        }
        addresses.shuffle(&mut rand::thread_rng());

        info!("Starting crawl from {} seed addresses", addresses.len());

        let session = CrawlSession::new(
            SessionConfig {
                max_concurrent_tasks: self.max_concurrent_tasks,
            },
            HttpConnector::new(self.peer_timeout, self.default_port),
            GeoClient::new().map_err(CrawlerError::Geo)?,
        );

        let topology = session.run(addresses).await;
        info!(
            "Crawl finished: {} nodes recorded, {} unreachable",
            topology.len(),
            topology.unreachable_count()
        );
        Ok(topology)
    }
}

impl Default for Crawler {
    fn default() -> Self {
        CrawlerBuilder::new().build()
    }
}
