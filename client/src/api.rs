//! HTTP RPC client for querying a single node.
//!
//! The protocol is a plain request/response exchange: a POST to the node's
//! well-known API path with an operation name in the JSON body. Only the two
//! read-only operations the crawler needs are implemented, `getPeers` and
//! `getInfo`.

use crate::address::Address;
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Well-known API path under a node's base URL.
pub const API_PATH: &str = "/burst";
/// Protocol tag sent with every request.
const PROTOCOL: &str = "B1";
/// User agent advertised to peers.
const USER_AGENT: &str = "BRS/3.8.4";
/// Version string reported when a node does not announce one.
pub const UNKNOWN_VERSION: &str = "Unknown";
/// Default per-call timeout so one unresponsive node cannot stall a layer.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur while querying a node.
///
/// The crawler does not distinguish between the variants, every failure to
/// obtain peers or version from a node is treated as unreachable. The split
/// exists for logging and for tests.
#[derive(Debug)]
pub enum ClientError {
    /// Transport failure: connect error, timeout, TLS, or a non-2xx status.
    Http(reqwest::Error),
    /// The node responded, but the body did not have the expected shape.
    MalformedResponse(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Http(err) => write!(f, "Node request failed: {err}"),
            ClientError::MalformedResponse(detail) => {
                write!(f, "Unexpected response structure: {detail}")
            }
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Http(err) => Some(err),
            ClientError::MalformedResponse(_) => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Http(err)
    }
}

#[derive(Deserialize)]
struct PeersResponse {
    peers: Option<Vec<String>>,
}

/// RPC client bound to a single node.
///
/// Holds one [`reqwest::Client`] as its reusable connection handle. The
/// handle is private to the worker probing this node and is released when
/// the client is dropped, on success and failure paths alike.
#[derive(Debug, Clone)]
pub struct P2pClient {
    api_url: String,
    default_port: u16,
    http: reqwest::Client,
}

impl P2pClient {
    /// Create a client for the given node with default timeout and port.
    pub fn new(address: &Address) -> Result<Self, ClientError> {
        Self::with_config(address, DEFAULT_TIMEOUT, crate::address::DEFAULT_P2P_PORT)
    }

    /// Create a client for the given node with explicit configuration.
    ///
    /// # Arguments
    ///
    /// * `address` - The normalized address of the node to query.
    /// * `timeout` - Bound on each RPC round trip.
    /// * `default_port` - Port assumed for announced peers that omit one.
    pub fn with_config(
        address: &Address,
        timeout: Duration,
        default_port: u16,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            // Nodes announcing https addresses commonly run self-signed
            // certificates.
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(P2pClient {
            api_url: format!("{}{API_PATH}", address.base_url()),
            default_port,
            http,
        })
    }

    /// Issue one RPC call and parse the response body as JSON.
    async fn request(&self, request_type: &str) -> Result<Value, ClientError> {
        debug!("Requesting {request_type} from {}", self.api_url);

        let body = serde_json::json!({
            "requestType": request_type,
            "protocol": PROTOCOL,
        });

        let response = self
            .http
            .post(&self.api_url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    /// Ask the node for the peers it knows about.
    ///
    /// Each announced address is normalized on observation, using this
    /// node's port as the default for peers that omit one. Entries that do
    /// not normalize are skipped rather than failing the whole list.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Address>)` - The node's announced peer list, in its order.
    /// * `Err(ClientError)` - If the call failed or `peers` was missing.
    pub async fn get_peers(&self) -> Result<Vec<Address>, ClientError> {
        let response = self.request("getPeers").await?;
        let parsed: PeersResponse = serde_json::from_value(response)
            .map_err(|err| ClientError::MalformedResponse(err.to_string()))?;

        let announced = parsed
            .peers
            .ok_or_else(|| ClientError::MalformedResponse("missing peers field".to_string()))?;

        let mut peers = Vec::with_capacity(announced.len());
        for raw in announced {
            match Address::parse(&raw, self.default_port) {
                Ok(peer) => peers.push(peer),
                Err(err) => debug!("Skipping unparseable announced peer {raw:?}: {err}"),
            }
        }
        Ok(peers)
    }

    /// Ask the node for its version.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The announced version, or [`UNKNOWN_VERSION`] when
    ///   the response carries none.
    /// * `Err(ClientError)` - If the call itself failed.
    pub async fn get_version(&self) -> Result<String, ClientError> {
        let response = self.request("getInfo").await?;
        Ok(extract_version(&response))
    }
}

/// Pulls a version string out of a `getInfo` response.
///
/// Nodes report their version either top-level or nested under an
/// `application` sub-object. A missing version is not an error.
fn extract_version(response: &Value) -> String {
    response
        .get("version")
        .and_then(Value::as_str)
        .or_else(|| {
            response
                .get("application")
                .and_then(|application| application.get("version"))
                .and_then(Value::as_str)
        })
        .unwrap_or(UNKNOWN_VERSION)
        .to_string()
}
