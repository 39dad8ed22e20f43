//! Visited-state bookkeeping shared across concurrent probe tasks.

use crate::topology::{NodeOutcome, Topology};
use peermap_client::Address;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

/// Concurrency-safe record of which addresses have been claimed for a query
/// and which have a committed outcome.
///
/// Owned by the engine instance, so independent crawls never share state.
/// Both operations are atomic insert-if-absent under a mutex; together they
/// are the entire mechanism guaranteeing that each address is queried at
/// most once per run.
#[derive(Debug, Default)]
pub(crate) struct VisitedRegistry {
    /// Addresses a query has been launched for, including in-flight ones.
    checked: Mutex<HashSet<Address>>,
    /// Final outcome per address.
    outcomes: Mutex<HashMap<Address, NodeOutcome>>,
}

impl VisitedRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Claim an address for querying.
    ///
    /// # Returns
    ///
    /// `true` if the caller is the first to claim the address and may query
    /// it, `false` if it was already claimed by an earlier layer, another
    /// task, or a duplicate frontier entry.
    pub(crate) async fn claim(&self, address: &Address) -> bool {
        self.checked.lock().await.insert(address.clone())
    }

    /// Commit the outcome of a completed query, test-and-set.
    ///
    /// # Returns
    ///
    /// `true` if the outcome was recorded, `false` if the address already
    /// had an entry and the result was discarded.
    pub(crate) async fn commit(&self, address: Address, outcome: NodeOutcome) -> bool {
        let mut outcomes = self.outcomes.lock().await;
        if outcomes.contains_key(&address) {
            return false;
        }
        outcomes.insert(address, outcome);
        true
    }

    /// Whether the address already has a committed outcome.
    pub(crate) async fn is_recorded(&self, address: &Address) -> bool {
        self.outcomes.lock().await.contains_key(address)
    }

    /// Number of addresses claimed so far.
    pub(crate) async fn checked_count(&self) -> usize {
        self.checked.lock().await.len()
    }

    /// Snapshot the committed outcomes as a finalized topology.
    pub(crate) async fn snapshot(&self) -> Topology {
        Topology::from_nodes(self.outcomes.lock().await.clone())
    }
}
