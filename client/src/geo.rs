//! Geo-IP enrichment via the ipwho.is lookup service.

use log::debug;
use serde::Deserialize;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

/// Base URL of the geo lookup service.
pub const GEO_API_URL: &str = "https://ipwho.is";
/// The lookup service is independent of the slow peers being probed, so a
/// short timeout keeps enrichment from dominating a probe.
const GEO_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur during a geo lookup.
///
/// Geo failures never propagate past record assembly; an erroring lookup
/// degrades the record to one without geo data.
#[derive(Debug)]
pub enum GeoError {
    /// The lookup request failed at the transport level.
    Http(reqwest::Error),
    /// The service answered without the data needed for a location.
    Incomplete,
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoError::Http(err) => write!(f, "Geo lookup failed: {err}"),
            GeoError::Incomplete => write!(f, "Geo lookup returned incomplete data"),
        }
    }
}

impl std::error::Error for GeoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeoError::Http(err) => Some(err),
            GeoError::Incomplete => None,
        }
    }
}

impl From<reqwest::Error> for GeoError {
    fn from(err: reqwest::Error) -> Self {
        GeoError::Http(err)
    }
}

/// Location of a resolved node IP.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeoLocation {
    /// ISO country code reported by the lookup service.
    pub country_code: String,
    /// Latitude, when the service reports one.
    pub latitude: Option<f64>,
    /// Longitude, when the service reports one.
    pub longitude: Option<f64>,
}

/// Raw lookup response. The service reports failures in-band with a
/// `success` flag rather than an HTTP error status.
#[derive(Debug, Deserialize)]
struct GeoResponse {
    success: Option<bool>,
    country_code: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl TryFrom<GeoResponse> for GeoLocation {
    type Error = GeoError;

    fn try_from(response: GeoResponse) -> Result<Self, GeoError> {
        if response.success == Some(false) {
            return Err(GeoError::Incomplete);
        }
        let country_code = response.country_code.ok_or(GeoError::Incomplete)?;
        Ok(GeoLocation {
            country_code,
            latitude: response.latitude,
            longitude: response.longitude,
        })
    }
}

/// Client for the external geo lookup collaborator.
#[derive(Debug, Clone)]
pub struct GeoClient {
    base_url: String,
    http: reqwest::Client,
}

impl GeoClient {
    /// Create a geo client against the default lookup service.
    pub fn new() -> Result<Self, GeoError> {
        Self::with_base_url(GEO_API_URL)
    }

    /// Create a geo client against a custom base URL.
    pub fn with_base_url<S: Into<String>>(base_url: S) -> Result<Self, GeoError> {
        let http = reqwest::Client::builder().timeout(GEO_TIMEOUT).build()?;
        Ok(GeoClient {
            base_url: base_url.into(),
            http,
        })
    }

    /// Look up the location of an IP.
    ///
    /// # Returns
    ///
    /// * `Ok(GeoLocation)` - The reported location.
    /// * `Err(GeoError)` - If the lookup failed or was incomplete.
    pub async fn lookup(&self, ip: IpAddr) -> Result<GeoLocation, GeoError> {
        let url = format!("{}/{ip}", self.base_url);
        let response: GeoResponse = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let location = GeoLocation::try_from(response)?;
        debug!("Geo lookup for {ip}: {location:?}");
        Ok(location)
    }
}
