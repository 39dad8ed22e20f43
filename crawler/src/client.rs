//! Per-node client abstractions for testing and mocking.
//!
//! This module provides the [`NodeApi`] and [`Connector`] traits that
//! abstract the RPC client, plus the [`GeoProvider`] trait for the external
//! geo lookup, enabling dependency injection for tests without touching the
//! core crawl logic.

use peermap_client::{Address, ClientError, GeoClient, GeoError, GeoLocation, P2pClient};
use std::net::IpAddr;
use std::time::Duration;

/// The two read-only queries the crawler issues against a node.
pub trait NodeApi: Send {
    fn get_peers(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Address>, ClientError>> + Send;
    fn get_version(
        &self,
    ) -> impl std::future::Future<Output = Result<String, ClientError>> + Send;
}

impl NodeApi for P2pClient {
    fn get_peers(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Address>, ClientError>> + Send {
        P2pClient::get_peers(self)
    }

    fn get_version(
        &self,
    ) -> impl std::future::Future<Output = Result<String, ClientError>> + Send {
        P2pClient::get_version(self)
    }
}

/// Factory trait for creating per-node clients.
///
/// Each probe task gets its own client; clients are never shared across
/// concurrent queries.
pub trait Connector: Clone + Send + Sync + 'static {
    type Api: NodeApi + Send;

    /// Create a client for the specified node.
    fn connect(&self, address: &Address) -> Result<Self::Api, ClientError>;
}

/// Standard connector that creates real HTTP clients.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    timeout: Duration,
    default_port: u16,
}

impl HttpConnector {
    /// Create a connector with the given per-call timeout and the default
    /// port assumed for announced peers that omit one.
    pub fn new(timeout: Duration, default_port: u16) -> Self {
        Self {
            timeout,
            default_port,
        }
    }
}

impl Connector for HttpConnector {
    type Api = P2pClient;

    fn connect(&self, address: &Address) -> Result<Self::Api, ClientError> {
        P2pClient::with_config(address, self.timeout, self.default_port)
    }
}

/// The external geo lookup collaborator, `lookup(ip) -> location | failure`.
pub trait GeoProvider: Clone + Send + Sync + 'static {
    fn lookup(
        &self,
        ip: IpAddr,
    ) -> impl std::future::Future<Output = Result<GeoLocation, GeoError>> + Send;
}

impl GeoProvider for GeoClient {
    fn lookup(
        &self,
        ip: IpAddr,
    ) -> impl std::future::Future<Output = Result<GeoLocation, GeoError>> + Send {
        GeoClient::lookup(self, ip)
    }
}

#[cfg(test)]
pub mod test_utils {
    //! Scripted mock implementations for exercising the crawl engine.

    use super::*;
    use peermap_client::DEFAULT_P2P_PORT;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Scripted behavior of one mock node.
    #[derive(Debug, Clone)]
    pub struct MockNode {
        pub peers: Vec<String>,
        pub version: String,
    }

    impl MockNode {
        pub fn new(peers: &[&str], version: &str) -> Self {
            MockNode {
                peers: peers.iter().map(|peer| peer.to_string()).collect(),
                version: version.to_string(),
            }
        }
    }

    /// Mock connector backed by a script of node behaviors.
    ///
    /// Addresses without a scripted node fail their queries, emulating
    /// unreachable peers. Every `get_peers` invocation is counted so tests
    /// can assert the at-most-once property.
    #[derive(Debug, Clone, Default)]
    pub struct MockConnector {
        nodes: Arc<Mutex<HashMap<Address, MockNode>>>,
        calls: Arc<Mutex<HashMap<Address, usize>>>,
    }

    impl MockConnector {
        pub fn new() -> Self {
            Self::default()
        }

        /// Script a reachable node.
        pub fn add_node(&self, raw: &str, node: MockNode) {
            let address = Address::parse(raw, DEFAULT_P2P_PORT).unwrap();
            self.nodes.lock().unwrap().insert(address, node);
        }

        /// How many times the given address was queried.
        pub fn query_count(&self, raw: &str) -> usize {
            let address = Address::parse(raw, DEFAULT_P2P_PORT).unwrap();
            self.calls.lock().unwrap().get(&address).copied().unwrap_or(0)
        }

        /// Total queries issued across all addresses.
        pub fn total_queries(&self) -> usize {
            self.calls.lock().unwrap().values().sum()
        }
    }

    impl Connector for MockConnector {
        type Api = MockApi;

        fn connect(&self, address: &Address) -> Result<Self::Api, ClientError> {
            Ok(MockApi {
                address: address.clone(),
                node: self.nodes.lock().unwrap().get(address).cloned(),
                calls: self.calls.clone(),
            })
        }
    }

    /// Mock per-node client handed out by [`MockConnector`].
    #[derive(Debug)]
    pub struct MockApi {
        address: Address,
        node: Option<MockNode>,
        calls: Arc<Mutex<HashMap<Address, usize>>>,
    }

    impl NodeApi for MockApi {
        async fn get_peers(&self) -> Result<Vec<Address>, ClientError> {
            *self
                .calls
                .lock()
                .unwrap()
                .entry(self.address.clone())
                .or_insert(0) += 1;

            let node = self
                .node
                .as_ref()
                .ok_or_else(|| ClientError::MalformedResponse("connection refused".to_string()))?;
            Ok(node
                .peers
                .iter()
                .map(|raw| Address::parse(raw, DEFAULT_P2P_PORT).unwrap())
                .collect())
        }

        async fn get_version(&self) -> Result<String, ClientError> {
            let node = self
                .node
                .as_ref()
                .ok_or_else(|| ClientError::MalformedResponse("connection refused".to_string()))?;
            Ok(node.version.clone())
        }
    }

    /// Mock geo provider with scripted locations per IP.
    ///
    /// Unscripted IPs fail the lookup, which must degrade the record rather
    /// than the crawl.
    #[derive(Debug, Clone, Default)]
    pub struct MockGeo {
        locations: Arc<Mutex<HashMap<IpAddr, GeoLocation>>>,
    }

    impl MockGeo {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_location(&self, ip: IpAddr, location: GeoLocation) {
            self.locations.lock().unwrap().insert(ip, location);
        }
    }

    impl GeoProvider for MockGeo {
        async fn lookup(&self, ip: IpAddr) -> Result<GeoLocation, GeoError> {
            self.locations
                .lock()
                .unwrap()
                .get(&ip)
                .cloned()
                .ok_or(GeoError::Incomplete)
        }
    }
}
