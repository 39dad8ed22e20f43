//! The topology record produced by a crawl.
//!
//! A [`Topology`] maps every address the crawler ever queried to its
//! outcome. Once an address has an entry, success or failure, it is never
//! queried again for the lifetime of the run. The finalized record is the
//! hand-off surface for any exporter or renderer.

use peermap_client::{Address, GeoLocation};
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;

/// Result of successfully querying one node.
///
/// Created exactly once, when the query to the address succeeds, and
/// immutable thereafter. Resolution and geo fields are genuinely optional:
/// a record without them is structurally valid and its peer list is still
/// traversed.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerRecord {
    /// The address the node was queried under.
    pub announced_address: Address,
    /// IP the announced host resolved to, when resolution succeeded.
    pub resolved_ip: Option<IpAddr>,
    /// Location of the resolved IP, when enrichment succeeded.
    pub geo: Option<GeoLocation>,
    /// Version the node reported, or `"Unknown"`.
    pub version: String,
    /// The node's announced peer list, in the order it reported.
    pub peers: Vec<Address>,
}

impl fmt::Display for PeerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (version: {}, peers: {}, country: {})",
            self.announced_address,
            self.version,
            self.peers.len(),
            self.geo
                .as_ref()
                .map(|geo| geo.country_code.as_str())
                .unwrap_or("unknown"),
        )
    }
}

/// Outcome of querying one address.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOutcome {
    /// The node answered; its record is final.
    Reachable(PeerRecord),
    /// The query failed. Recorded so the address is never retried, which
    /// distinguishes "tried and failed" from "never tried".
    Unreachable,
}

impl NodeOutcome {
    /// Whether the node answered the query.
    pub fn is_reachable(&self) -> bool {
        matches!(self, NodeOutcome::Reachable(_))
    }

    /// The record for a reachable node.
    pub fn record(&self) -> Option<&PeerRecord> {
        match self {
            NodeOutcome::Reachable(record) => Some(record),
            NodeOutcome::Unreachable => None,
        }
    }
}

impl fmt::Display for NodeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeOutcome::Reachable(record) => write!(f, "Reachable: {record}"),
            NodeOutcome::Unreachable => write!(f, "Unreachable"),
        }
    }
}

/// The accumulated mapping from address to discovery outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Topology {
    nodes: HashMap<Address, NodeOutcome>,
}

impl Topology {
    pub(crate) fn from_nodes(nodes: HashMap<Address, NodeOutcome>) -> Self {
        Topology { nodes }
    }

    /// The outcome for an address, if it was ever queried.
    pub fn get(&self, address: &Address) -> Option<&NodeOutcome> {
        self.nodes.get(address)
    }

    /// Number of addresses queried over the run.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over every queried address and its outcome.
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &NodeOutcome)> {
        self.nodes.iter()
    }

    /// Iterate over the records of nodes that answered.
    pub fn reachable(&self) -> impl Iterator<Item = &PeerRecord> {
        self.nodes.values().filter_map(NodeOutcome::record)
    }

    /// Number of addresses that were tried and failed.
    pub fn unreachable_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|outcome| !outcome.is_reachable())
            .count()
    }
}

impl IntoIterator for Topology {
    type Item = (Address, NodeOutcome);
    type IntoIter = std::collections::hash_map::IntoIter<Address, NodeOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peermap_client::DEFAULT_P2P_PORT;

    fn address(raw: &str) -> Address {
        Address::parse(raw, DEFAULT_P2P_PORT).unwrap()
    }

    fn record(raw: &str, peers: &[&str]) -> PeerRecord {
        PeerRecord {
            announced_address: address(raw),
            resolved_ip: None,
            geo: None,
            version: "3.8.4".to_string(),
            peers: peers.iter().map(|peer| address(peer)).collect(),
        }
    }

    #[test]
    fn test_accessors() {
        let a = address("10.0.0.1");
        let b = address("10.0.0.2");
        let mut nodes = HashMap::new();
        nodes.insert(a.clone(), NodeOutcome::Reachable(record("10.0.0.1", &["10.0.0.2"])));
        nodes.insert(b.clone(), NodeOutcome::Unreachable);
        let topology = Topology::from_nodes(nodes);

        assert_eq!(topology.len(), 2);
        assert_eq!(topology.unreachable_count(), 1);
        assert_eq!(topology.reachable().count(), 1);
        assert!(topology.get(&a).unwrap().is_reachable());
        assert!(!topology.get(&b).unwrap().is_reachable());
        assert!(topology.get(&address("10.0.0.3")).is_none());
    }

    #[test]
    fn test_degraded_record_is_valid() {
        // No resolved IP and no geo is a structurally complete record.
        let record = record("node.example.org", &["10.0.0.1"]);
        assert_eq!(record.resolved_ip, None);
        assert_eq!(record.geo, None);
        assert_eq!(record.peers.len(), 1);
        assert_eq!(
            record.to_string(),
            "http://node.example.org:8123 (version: 3.8.4, peers: 1, country: unknown)"
        );
    }
}
