use std::time::Duration;

use geokit_location::Coordinate;
use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::{LocationSource, ResolveConfig, ResolveError, ResolvedLocation};

/// Body of an ip-api.com `/json/` answer. Failed lookups carry only
/// `status` and `message`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    #[serde(default)]
    lat: f64,
    #[serde(default)]
    lon: f64,
    #[serde(default)]
    city: String,
    #[serde(default)]
    region_name: String,
    #[serde(default)]
    country: String,
}

/// Locates this machine from its public IP address.
#[derive(Debug, Clone)]
pub struct IpLocator {
    client: Client,
    endpoint: String,
}

impl IpLocator {
    /// Creates a locator querying `endpoint` with a request `timeout`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ResolveError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Creates a locator from the IP settings of `config`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ResolveConfig) -> Result<Self, ResolveError> {
        Self::new(config.ip_endpoint.clone(), config.ip_timeout)
    }

    /// The endpoint queried by [`locate`](Self::locate).
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Looks up the location of this machine's public address.
    ///
    /// An empty city is replaced by the region name.
    ///
    /// # Errors
    /// - [`ResolveError::Http`] if the request or body decoding fails.
    /// - [`ResolveError::Status`] on any status other than 200.
    /// - [`ResolveError::Lookup`] if the service reports a failed lookup.
    pub fn locate(&self) -> Result<ResolvedLocation, ResolveError> {
        debug!("IP geolocation via {}", self.endpoint);
        let response = self.client.get(&self.endpoint).send()?;
        if response.status() != StatusCode::OK {
            return Err(ResolveError::Status(response.status().as_u16()));
        }

        let body: IpApiResponse = response.json()?;
        if body.status != "success" {
            return Err(ResolveError::Lookup(
                body.message.unwrap_or_else(|| body.status.clone()),
            ));
        }

        let city = if body.city.is_empty() {
            body.region_name
        } else {
            body.city
        };
        Ok(ResolvedLocation {
            coordinate: Coordinate::new(body.lat, body.lon),
            city: non_empty(city),
            country: non_empty(body.country),
            source: LocationSource::Ip,
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}
