//! Best-effort resolution of an announced address to a literal IP.

use crate::address::Address;
use log::debug;
use std::net::IpAddr;
use tokio::net::lookup_host;
use url::Host;

/// Resolve an address to a literal IP, if possible.
///
/// Addresses that already encode an IP literal are used as-is without a
/// lookup. Domain names go through the system resolver; a resolution
/// failure is not an error, the caller simply gets no IP and the record is
/// produced without geo enrichment.
pub async fn resolve_ip(address: &Address) -> Option<IpAddr> {
    match address.host() {
        Host::Ipv4(ip) => Some(IpAddr::V4(*ip)),
        Host::Ipv6(ip) => Some(IpAddr::V6(*ip)),
        Host::Domain(name) => {
            match lookup_host((name.as_str(), address.port())).await {
                Ok(mut resolved) => resolved.next().map(|socket_addr| socket_addr.ip()),
                Err(err) => {
                    debug!("Can't resolve host {address}: {err}");
                    None
                }
            }
        }
    }
}
