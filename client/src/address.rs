//! Node address normalization and comparison.
//!
//! Every address observed by the crawler, whether from the bootstrap
//! configuration or from a peer's announced list, is normalized exactly once
//! through [`Address::parse`] before it is compared or stored. Two addresses
//! are equal iff their normalized components are equal; there is no
//! canonicalization by resolved IP.

use std::fmt;
use url::Host;

/// Default port applied when an announced address omits one.
pub const DEFAULT_P2P_PORT: u16 = 8123;

/// Errors that can occur while normalizing an announced address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// The host component could not be parsed as a domain or IP literal.
    InvalidHost(url::ParseError),
    /// The address contains no host component.
    MissingHost,
    /// The port component is not a valid u16.
    InvalidPort,
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressError::InvalidHost(err) => write!(f, "Invalid host in address: {err}"),
            AddressError::MissingHost => write!(f, "Address has no host component"),
            AddressError::InvalidPort => write!(f, "Address port is not a valid u16"),
        }
    }
}

impl std::error::Error for AddressError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AddressError::InvalidHost(err) => Some(err),
            AddressError::MissingHost => None,
            AddressError::InvalidPort => None,
        }
    }
}

/// URL scheme a node is reachable under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Http => write!(f, "http"),
            Scheme::Https => write!(f, "https"),
        }
    }
}

/// A normalized node identifier: scheme-qualified host and port.
///
/// The host may be a domain name, an IPv4 literal, or a bracketed IPv6
/// literal. Domains are lowercased during parsing, so equality is stable
/// across differently-cased announcements of the same address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    scheme: Scheme,
    host: Host<String>,
    port: u16,
}

impl Address {
    /// Normalize a raw announced address.
    ///
    /// Missing schemes default to `http`, and a missing port is filled with
    /// `default_port`. Anything after the first path separator is ignored.
    ///
    /// # Arguments
    ///
    /// * `raw` - The announced address, e.g. `node.example.org` or
    ///   `https://10.0.0.1:8125`.
    /// * `default_port` - Port applied when the address does not carry one.
    ///
    /// # Returns
    ///
    /// * `Ok(Address)` - The normalized address.
    /// * `Err(AddressError)` - If the host or port cannot be parsed.
    pub fn parse(raw: &str, default_port: u16) -> Result<Self, AddressError> {
        let trimmed = raw.trim();

        let (scheme, rest) = if let Some(rest) = trimmed.strip_prefix("https://") {
            (Scheme::Https, rest)
        } else if let Some(rest) = trimmed.strip_prefix("http://") {
            (Scheme::Http, rest)
        } else {
            (Scheme::Http, trimmed)
        };

        // Announced addresses occasionally carry a trailing slash or path.
        let authority = rest.split('/').next().unwrap_or_default();
        if authority.is_empty() {
            return Err(AddressError::MissingHost);
        }

        let (host_part, port) = split_port(authority)?;
        if host_part.is_empty() {
            return Err(AddressError::MissingHost);
        }

        let host = Host::parse(host_part).map_err(AddressError::InvalidHost)?;

        Ok(Address {
            scheme,
            host,
            port: port.unwrap_or(default_port),
        })
    }

    /// The host component: a domain, IPv4 literal, or IPv6 literal.
    pub fn host(&self) -> &Host<String> {
        &self.host
    }

    /// The port the node is reachable on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The scheme the node is reachable under.
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// The base URL for RPC calls against this node, without a trailing slash.
    pub fn base_url(&self) -> String {
        self.to_string()
    }
}

/// Splits an explicit `:port` suffix off an authority string.
///
/// Bracketed IPv6 literals are handled before the split so their colons are
/// not mistaken for a port separator.
fn split_port(authority: &str) -> Result<(&str, Option<u16>), AddressError> {
    if authority.starts_with('[') {
        // An unterminated bracket falls through and is rejected by
        // `Host::parse` below.
        if let Some(end) = authority.find(']') {
            let host = &authority[..=end];
            return match authority[end + 1..].strip_prefix(':') {
                Some(port) => Ok((host, Some(parse_port(port)?))),
                None if authority[end + 1..].is_empty() => Ok((host, None)),
                None => Err(AddressError::InvalidPort),
            };
        }
    }

    match authority.rsplit_once(':') {
        // A colon in an unbracketed remainder means an IPv6 literal without
        // brackets, which `Host::parse` will reject below.
        Some((host, _)) if host.contains(':') => Ok((authority, None)),
        Some((host, port)) => Ok((host, Some(parse_port(port)?))),
        None => Ok((authority, None)),
    }
}

fn parse_port(port: &str) -> Result<u16, AddressError> {
    port.parse::<u16>().map_err(|_| AddressError::InvalidPort)
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `Host` brackets IPv6 literals in its Display impl.
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_parse_bare_host() {
        let address = Address::parse("node.example.org", DEFAULT_P2P_PORT).unwrap();
        assert_eq!(address.scheme(), Scheme::Http);
        assert_eq!(address.host(), &Host::Domain("node.example.org".to_string()));
        assert_eq!(address.port(), DEFAULT_P2P_PORT);
        assert_eq!(address.to_string(), "http://node.example.org:8123");
    }

    #[test]
    fn test_parse_explicit_port() {
        let address = Address::parse("node.example.org:8125", DEFAULT_P2P_PORT).unwrap();
        assert_eq!(address.port(), 8125);
    }

    #[test]
    fn test_parse_preserves_https() {
        let address = Address::parse("https://node.example.org", DEFAULT_P2P_PORT).unwrap();
        assert_eq!(address.scheme(), Scheme::Https);
        assert_eq!(address.to_string(), "https://node.example.org:8123");
    }

    #[test]
    fn test_parse_ipv4_literal() {
        let address = Address::parse("10.0.0.1:8123", DEFAULT_P2P_PORT).unwrap();
        assert_eq!(address.host(), &Host::<String>::Ipv4(Ipv4Addr::new(10, 0, 0, 1)));
    }

    #[test]
    fn test_parse_bracketed_ipv6() {
        let address = Address::parse("[2001:db8::1]:8125", DEFAULT_P2P_PORT).unwrap();
        assert_eq!(
            address.host(),
            &Host::<String>::Ipv6("2001:db8::1".parse::<Ipv6Addr>().unwrap())
        );
        assert_eq!(address.port(), 8125);
        assert_eq!(address.to_string(), "http://[2001:db8::1]:8125");
    }

    #[test]
    fn test_parse_ipv6_without_port() {
        let address = Address::parse("[2001:db8::1]", DEFAULT_P2P_PORT).unwrap();
        assert_eq!(address.port(), DEFAULT_P2P_PORT);
    }

    #[test]
    fn test_parse_ignores_path() {
        let address = Address::parse("http://node.example.org:8123/burst", DEFAULT_P2P_PORT).unwrap();
        assert_eq!(address.to_string(), "http://node.example.org:8123");
    }

    #[test]
    fn test_parse_lowercases_domain() {
        let a = Address::parse("Node.Example.ORG", DEFAULT_P2P_PORT).unwrap();
        let b = Address::parse("node.example.org", DEFAULT_P2P_PORT).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_is_string_level() {
        // Different hostnames stay distinct even if they would resolve to
        // the same machine. Dedup is by announced address, not IP.
        let a = Address::parse("localhost", DEFAULT_P2P_PORT).unwrap();
        let b = Address::parse("127.0.0.1", DEFAULT_P2P_PORT).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_different_ports_are_distinct() {
        let a = Address::parse("node.example.org:8123", DEFAULT_P2P_PORT).unwrap();
        let b = Address::parse("node.example.org:8125", DEFAULT_P2P_PORT).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(
            Address::parse("", DEFAULT_P2P_PORT),
            Err(AddressError::MissingHost)
        );
        assert_eq!(
            Address::parse("http://", DEFAULT_P2P_PORT),
            Err(AddressError::MissingHost)
        );
    }

    #[test]
    fn test_parse_rejects_bad_port() {
        assert_eq!(
            Address::parse("node.example.org:99999", DEFAULT_P2P_PORT),
            Err(AddressError::InvalidPort)
        );
    }
}
