use std::fmt;

use geokit_location::SystemFetcher;
use log::{debug, info};

use crate::{
    DeviceLocator, Geocoder, IpLocator, LocationSource, ResolveConfig, ResolveError,
    ResolvedLocation,
};

/// Resolves a location from configuration, the device or the IP address.
pub struct Resolver<D> {
    config: ResolveConfig,
    device: D,
    geocoder: Option<Box<dyn Geocoder>>,
    ip: IpLocator,
}

impl<D> fmt::Debug for Resolver<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("config", &self.config)
            .field("geocoder", &self.geocoder.is_some())
            .field("ip", &self.ip)
            .finish_non_exhaustive()
    }
}

impl Resolver<&'static SystemFetcher> {
    /// A resolver over the process-wide device fetcher.
    ///
    /// # Errors
    /// Returns an error if the IP geolocation client cannot be built.
    pub fn system(config: ResolveConfig) -> Result<Self, ResolveError> {
        Self::new(config, geokit_location::system_fetcher())
    }
}

impl<D: DeviceLocator> Resolver<D> {
    /// Creates a resolver using `device` for device fixes.
    ///
    /// # Errors
    /// Returns an error if the IP geolocation client cannot be built.
    pub fn new(config: ResolveConfig, device: D) -> Result<Self, ResolveError> {
        let ip = IpLocator::from_config(&config)?;
        Ok(Self {
            config,
            device,
            geocoder: None,
            ip,
        })
    }

    /// Sets the geocoder used for a configured city. Without one the city is
    /// ignored.
    #[must_use]
    pub fn with_geocoder(mut self, geocoder: impl Geocoder + 'static) -> Self {
        self.geocoder = Some(Box::new(geocoder));
        self
    }

    /// The configuration this resolver was built with.
    pub const fn config(&self) -> &ResolveConfig {
        &self.config
    }

    /// Resolves the location.
    ///
    /// In order: the configured coordinate, the configured city, the device
    /// (only when location services are on), IP geolocation. Device
    /// failures fall through to IP; geocoding failures are returned.
    ///
    /// # Errors
    /// - [`ResolveError::InvalidCoordinate`] for an out-of-range coordinate.
    /// - The geocoder's error for an unknown city.
    /// - The IP locator's error when every earlier source is unavailable.
    pub fn resolve(&self) -> Result<ResolvedLocation, ResolveError> {
        if let Some(coordinate) = self.config.coordinate {
            if !coordinate.is_valid() {
                return Err(ResolveError::InvalidCoordinate(coordinate));
            }
            return Ok(ResolvedLocation::at(coordinate, LocationSource::Manual));
        }

        if let Some(city) = self.config.city.as_deref().filter(|city| !city.is_empty()) {
            match &self.geocoder {
                Some(geocoder) => {
                    let place = geocoder.geocode(city)?;
                    return Ok(ResolvedLocation::from_place(place, LocationSource::Manual));
                }
                None => debug!("no geocoder set, ignoring city {city:?}"),
            }
        }

        if let Some(location) = self.device_location() {
            return Ok(location);
        }

        self.ip.locate()
    }

    fn device_location(&self) -> Option<ResolvedLocation> {
        if !self.device.services_enabled() {
            debug!("location services off, skipping device");
            return None;
        }
        match self.device.locate(self.config.device_timeout) {
            Ok(coordinate) => Some(ResolvedLocation::at(coordinate, LocationSource::Device)),
            Err(err) => {
                info!("device location unavailable ({err}), falling back to IP");
                None
            }
        }
    }
}
