//! Per-node building blocks for mapping an HTTP peer-to-peer network.
//!
//! This crate covers everything the crawler needs to talk to a single node:
//! announced-address normalization, the two read-only RPC calls (`getPeers`
//! and `getInfo`), best-effort hostname resolution, and geo-IP enrichment.

mod address;
mod api;
mod geo;
mod resolve;

pub use address::{Address, AddressError, Scheme, DEFAULT_P2P_PORT};
pub use api::{ClientError, P2pClient, API_PATH, DEFAULT_TIMEOUT, UNKNOWN_VERSION};
pub use geo::{GeoClient, GeoError, GeoLocation, GEO_API_URL};
pub use resolve::resolve_ip;
