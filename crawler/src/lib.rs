//! Concurrent discovery of an HTTP peer-to-peer network's topology.
//!
//! The crawler starts from a handful of bootstrap nodes, queries each
//! reachable node for its known peers, and explores breadth-first with
//! bounded concurrency until no new addresses turn up. The result is a
//! [`Topology`] record suitable for rendering or export.

mod builder;
mod client;
mod crawler;
mod registry;
mod session;
mod topology;

pub use builder::CrawlerBuilder;
pub use client::{Connector, GeoProvider, HttpConnector, NodeApi};
pub use crawler::{Crawler, CrawlerError};
pub use topology::{NodeOutcome, PeerRecord, Topology};

// Re-exports.
pub use peermap_client::{
    Address, AddressError, ClientError, GeoClient, GeoError, GeoLocation, Scheme,
    DEFAULT_P2P_PORT, UNKNOWN_VERSION,
};
