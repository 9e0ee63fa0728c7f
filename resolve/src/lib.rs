//! Location resolution with fallbacks.
//!
//! Picks the first available answer in a fixed order: a coordinate from
//! configuration, a configured city name through a [`Geocoder`], the device
//! location when location services are on, and finally IP geolocation.
//!
//! ```no_run
//! use geokit_resolve::{ResolveConfig, Resolver};
//!
//! let resolver = Resolver::system(ResolveConfig::default())?;
//! let location = resolver.resolve()?;
//! println!(
//!     "{:.4}, {:.4} ({})",
//!     location.coordinate.latitude, location.coordinate.longitude, location.source
//! );
//! # Ok::<(), geokit_resolve::ResolveError>(())
//! ```

#![warn(missing_docs)]

mod config;
mod ip;
mod resolver;

use std::fmt;
use std::time::Duration;

use geokit_location::{
    AuthorizationSource, Coordinate, FetchError, LocationBackend, LocationFetcher,
};

pub use config::{DEFAULT_DEVICE_TIMEOUT, DEFAULT_IP_ENDPOINT, DEFAULT_IP_TIMEOUT, ResolveConfig};
pub use ip::IpLocator;
pub use resolver::Resolver;

/// Where a [`ResolvedLocation`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationSource {
    /// A configured coordinate or city.
    Manual,
    /// The device's location service.
    Device,
    /// IP address geolocation.
    Ip,
}

impl fmt::Display for LocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Manual => "manual",
            Self::Device => "device",
            Self::Ip => "ip",
        })
    }
}

/// A geocoded place: a coordinate with optional names.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    /// Position of the place.
    pub coordinate: Coordinate,
    /// City or region name.
    pub city: Option<String>,
    /// Country name.
    pub country: Option<String>,
}

/// A resolved location together with its source.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    /// Position.
    pub coordinate: Coordinate,
    /// City or region name, when the source knows it.
    pub city: Option<String>,
    /// Country name, when the source knows it.
    pub country: Option<String>,
    /// How the location was obtained.
    pub source: LocationSource,
}

impl ResolvedLocation {
    /// A bare coordinate without names.
    #[must_use]
    pub const fn at(coordinate: Coordinate, source: LocationSource) -> Self {
        Self {
            coordinate,
            city: None,
            country: None,
            source,
        }
    }

    fn from_place(place: Place, source: LocationSource) -> Self {
        Self {
            coordinate: place.coordinate,
            city: place.city,
            country: place.country,
            source,
        }
    }
}

/// Errors that can occur while resolving a location.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The configured coordinate is out of range.
    #[error("invalid coordinate {0:?}")]
    InvalidCoordinate(Coordinate),
    /// The geocoder could not resolve the configured city.
    #[error("geocoding failed: {0}")]
    Geocode(String),
    /// The IP geolocation request failed.
    #[error("IP geolocation request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The IP geolocation service answered with a non-200 status.
    #[error("IP geolocation returned status {0}")]
    Status(u16),
    /// The IP geolocation service could not locate this address.
    #[error("IP geolocation failed: {0}")]
    Lookup(String),
}

/// Turns a city name into a place.
pub trait Geocoder: Send + Sync {
    /// Looks up `city`.
    ///
    /// # Errors
    /// Returns an error if the city cannot be found or the lookup fails.
    fn geocode(&self, city: &str) -> Result<Place, ResolveError>;
}

impl<F> Geocoder for F
where
    F: Fn(&str) -> Result<Place, ResolveError> + Send + Sync,
{
    fn geocode(&self, city: &str) -> Result<Place, ResolveError> {
        self(city)
    }
}

/// A source of device fixes.
pub trait DeviceLocator {
    /// Whether the system-wide location service is switched on.
    fn services_enabled(&self) -> bool;

    /// One fix, waiting at most `timeout`.
    ///
    /// # Errors
    /// Returns the device fetch error.
    fn locate(&self, timeout: Duration) -> Result<Coordinate, FetchError>;
}

impl<B: LocationBackend, A: AuthorizationSource> DeviceLocator for LocationFetcher<B, A> {
    fn services_enabled(&self) -> bool {
        self.gate().services_enabled()
    }

    fn locate(&self, timeout: Duration) -> Result<Coordinate, FetchError> {
        self.fetch(timeout)
    }
}

impl<T: DeviceLocator + ?Sized> DeviceLocator for &T {
    fn services_enabled(&self) -> bool {
        (**self).services_enabled()
    }

    fn locate(&self, timeout: Duration) -> Result<Coordinate, FetchError> {
        (**self).locate(timeout)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(LocationSource::Manual, "manual")]
    #[case(LocationSource::Device, "device")]
    #[case(LocationSource::Ip, "ip")]
    fn source_displays_lowercase(#[case] source: LocationSource, #[case] expected: &str) {
        assert_eq!(source.to_string(), expected);
    }

    #[test]
    fn closures_are_geocoders() {
        let geocoder = |city: &str| {
            Ok::<_, ResolveError>(Place {
                coordinate: Coordinate::new(52.52, 13.41),
                city: Some(city.to_owned()),
                country: Some("Germany".to_owned()),
            })
        };

        let place = geocoder.geocode("Berlin").unwrap();
        assert_eq!(place.city.as_deref(), Some("Berlin"));
    }
}
