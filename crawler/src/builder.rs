//! Builder pattern for configuring and creating crawler instances.

use crate::crawler::Crawler;
use peermap_client::{DEFAULT_P2P_PORT, DEFAULT_TIMEOUT};
use std::time::Duration;

/// Default maximum number of concurrent probe tasks per layer.
const DEFAULT_MAX_CONCURRENT_TASKS: usize = 20;

/// Builder for creating a customized [`Crawler`] instance.
///
/// # Example
///
/// ```
/// use peermap_crawler::CrawlerBuilder;
/// use std::time::Duration;
///
/// // Create a crawler with the default settings.
/// let basic_crawler = CrawlerBuilder::new().build();
///
/// // Create a crawler with custom settings.
/// let custom_crawler = CrawlerBuilder::new()
///     .with_max_concurrent_tasks(8)
///     .with_peer_timeout(Duration::from_secs(5))
///     .with_default_port(8125)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct CrawlerBuilder {
    /// Maximum number of concurrent probe tasks.
    max_concurrent_tasks: usize,
    /// Timeout for each RPC call against a node.
    peer_timeout: Duration,
    /// Port applied to addresses announced without one.
    default_port: u16,
}

impl CrawlerBuilder {
    /// Create a new crawler builder with default settings.
    pub fn new() -> Self {
        CrawlerBuilder {
            max_concurrent_tasks: DEFAULT_MAX_CONCURRENT_TASKS,
            peer_timeout: DEFAULT_TIMEOUT,
            default_port: DEFAULT_P2P_PORT,
        }
    }

    /// Set the maximum number of concurrent probe tasks per layer.
    ///
    /// This is the single fan-out bound for the whole crawl: the seed layer
    /// and every inner layer share it. Higher values may speed up crawling
    /// but increase network load. Values below 1 are raised to 1.
    ///
    /// # Arguments
    ///
    /// * `max_tasks` - Maximum concurrent tasks (defaults to 20).
    ///
    /// # Returns
    ///
    /// Self for method chaining.
    pub fn with_max_concurrent_tasks(mut self, max_tasks: usize) -> Self {
        self.max_concurrent_tasks = max_tasks.max(1);
        self
    }

    /// Set the timeout for each RPC call against a node.
    ///
    /// Bounds every round trip, so a single unresponsive node cannot stall
    /// a whole layer.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Maximum time per call (defaults to 10 seconds).
    ///
    /// # Returns
    ///
    /// Self for method chaining.
    pub fn with_peer_timeout(mut self, timeout: Duration) -> Self {
        self.peer_timeout = timeout;
        self
    }

    /// Set the port applied to addresses announced without one.
    ///
    /// # Arguments
    ///
    /// * `port` - The default port (defaults to 8123).
    ///
    /// # Returns
    ///
    /// Self for method chaining.
    pub fn with_default_port(mut self, port: u16) -> Self {
        self.default_port = port;
        self
    }

    /// Build the crawler with the configured options.
    ///
    /// # Returns
    ///
    /// A configured `Crawler` instance.
    pub fn build(self) -> Crawler {
        Crawler::new(
            self.max_concurrent_tasks,
            self.peer_timeout,
            self.default_port,
        )
    }
}

impl Default for CrawlerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
