use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use geokit_location::{
    AuthorizationGate, AuthorizationSource, Coordinate, EventSink, FetchError, LocationBackend,
    LocationEvent, LocationFetcher, PermissionError, PermissionStatus,
};
use geokit_resolve::{
    DeviceLocator, LocationSource, Place, ResolveConfig, ResolveError, ResolvedLocation, Resolver,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

const BERLIN: Coordinate = Coordinate::new(52.52, 13.41);
const PARIS: Coordinate = Coordinate::new(48.85, 2.35);
const SAN_FRANCISCO: Coordinate = Coordinate::new(37.7749, -122.4194);

struct Device {
    enabled: bool,
    result: Result<Coordinate, FetchError>,
    calls: AtomicUsize,
}

impl Device {
    fn new(enabled: bool, result: Result<Coordinate, FetchError>) -> Self {
        Self {
            enabled,
            result,
            calls: AtomicUsize::new(0),
        }
    }
}

impl DeviceLocator for Device {
    fn services_enabled(&self) -> bool {
        self.enabled
    }

    fn locate(&self, timeout: Duration) -> Result<Coordinate, FetchError> {
        assert_eq!(timeout, Duration::from_secs(3));
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result
    }
}

fn ip_server(expected_hits: usize) -> (mockito::ServerGuard, mockito::Mock) {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/json/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "status": "success",
                "lat": 37.7749,
                "lon": -122.4194,
                "city": "San Francisco",
                "regionName": "California",
                "country": "United States"
            })
            .to_string(),
        )
        .expect(expected_hits)
        .create();
    (server, mock)
}

fn config(server: &mockito::ServerGuard) -> ResolveConfig {
    ResolveConfig {
        device_timeout: Duration::from_secs(3),
        ip_endpoint: format!("{}/json/", server.url()),
        ..ResolveConfig::default()
    }
}

fn berlin(city: &str) -> Result<Place, ResolveError> {
    assert_eq!(city, "Berlin");
    Ok(Place {
        coordinate: BERLIN,
        city: Some("Berlin".to_owned()),
        country: Some("Germany".to_owned()),
    })
}

#[test]
fn configured_coordinate_wins() {
    let (server, ip) = ip_server(0);
    let device = Device::new(true, Ok(SAN_FRANCISCO));
    let resolver = Resolver::new(
        ResolveConfig {
            coordinate: Some(PARIS),
            city: Some("Berlin".to_owned()),
            ..config(&server)
        },
        &device,
    )
    .unwrap()
    .with_geocoder(|_: &str| -> Result<Place, ResolveError> {
        panic!("geocoder must not run when a coordinate is configured")
    });

    assert_eq!(
        resolver.resolve().unwrap(),
        ResolvedLocation::at(PARIS, LocationSource::Manual)
    );
    assert_eq!(device.calls.load(Ordering::SeqCst), 0);
    ip.assert();
}

#[test]
fn out_of_range_coordinate_is_rejected() {
    let (server, ip) = ip_server(0);
    let resolver = Resolver::new(
        ResolveConfig {
            coordinate: Some(Coordinate::new(91.0, 0.0)),
            ..config(&server)
        },
        Device::new(true, Ok(SAN_FRANCISCO)),
    )
    .unwrap();

    assert!(matches!(
        resolver.resolve(),
        Err(ResolveError::InvalidCoordinate(_))
    ));
    ip.assert();
}

#[test]
fn city_is_geocoded() {
    let (server, ip) = ip_server(0);
    let resolver = Resolver::new(
        ResolveConfig {
            city: Some("Berlin".to_owned()),
            ..config(&server)
        },
        Device::new(true, Ok(SAN_FRANCISCO)),
    )
    .unwrap()
    .with_geocoder(berlin);

    assert_eq!(
        resolver.resolve().unwrap(),
        ResolvedLocation {
            coordinate: BERLIN,
            city: Some("Berlin".to_owned()),
            country: Some("Germany".to_owned()),
            source: LocationSource::Manual,
        }
    );
    ip.assert();
}

#[test]
fn geocoding_failure_does_not_fall_back() {
    let (server, ip) = ip_server(0);
    let device = Device::new(true, Ok(SAN_FRANCISCO));
    let resolver = Resolver::new(
        ResolveConfig {
            city: Some("Atlantis".to_owned()),
            ..config(&server)
        },
        &device,
    )
    .unwrap()
    .with_geocoder(|city: &str| -> Result<Place, ResolveError> {
        Err(ResolveError::Geocode(format!("city not found: {city}")))
    });

    let err = resolver.resolve().unwrap_err();
    assert_eq!(err.to_string(), "geocoding failed: city not found: Atlantis");
    assert_eq!(device.calls.load(Ordering::SeqCst), 0);
    ip.assert();
}

#[test]
fn city_without_geocoder_is_ignored() {
    let (server, ip) = ip_server(0);
    let resolver = Resolver::new(
        ResolveConfig {
            city: Some("Berlin".to_owned()),
            ..config(&server)
        },
        Device::new(true, Ok(SAN_FRANCISCO)),
    )
    .unwrap();

    assert_eq!(
        resolver.resolve().unwrap(),
        ResolvedLocation::at(SAN_FRANCISCO, LocationSource::Device)
    );
    ip.assert();
}

#[rstest]
#[case(FetchError::NotAuthorized)]
#[case(FetchError::LocationUnavailable)]
#[case(FetchError::Timeout)]
#[case(FetchError::PlatformUnsupported)]
fn device_failure_falls_back_to_ip(#[case] error: FetchError) {
    let (server, ip) = ip_server(1);
    let device = Device::new(true, Err(error));
    let resolver = Resolver::new(config(&server), &device).unwrap();

    let location = resolver.resolve().unwrap();

    assert_eq!(location.source, LocationSource::Ip);
    assert_eq!(location.city.as_deref(), Some("San Francisco"));
    assert_eq!(device.calls.load(Ordering::SeqCst), 1);
    ip.assert();
}

#[test]
fn disabled_services_skip_the_device() {
    let (server, ip) = ip_server(1);
    let device = Device::new(false, Ok(PARIS));
    let resolver = Resolver::new(config(&server), &device).unwrap();

    assert_eq!(resolver.resolve().unwrap().source, LocationSource::Ip);
    assert_eq!(device.calls.load(Ordering::SeqCst), 0);
    ip.assert();
}

#[test]
fn ip_failure_is_the_final_error() {
    let mut server = mockito::Server::new();
    server.mock("GET", "/json/").with_status(503).create();
    let resolver = Resolver::new(config(&server), Device::new(false, Ok(PARIS))).unwrap();

    assert!(matches!(resolver.resolve(), Err(ResolveError::Status(503))));
}

struct Granted;

impl AuthorizationSource for Granted {
    fn services_enabled(&self) -> Result<bool, PermissionError> {
        Ok(true)
    }

    fn status(&self) -> Result<PermissionStatus, PermissionError> {
        Ok(PermissionStatus::Granted)
    }

    fn request(&self) -> Result<PermissionStatus, PermissionError> {
        Ok(PermissionStatus::Granted)
    }
}

/// Reports a cached fix while starting.
struct Cached(Coordinate);

impl LocationBackend for Cached {
    fn start_updates(&self, sink: EventSink) -> Result<(), FetchError> {
        sink.deliver(LocationEvent::Fix(self.0));
        Ok(())
    }

    fn stop_updates(&self) {}
}

#[test]
fn location_fetcher_is_a_device_locator() {
    let (server, ip) = ip_server(0);
    let fetcher = LocationFetcher::new(Cached(BERLIN), Arc::new(AuthorizationGate::new(Granted)));
    let resolver = Resolver::new(config(&server), fetcher).unwrap();

    assert_eq!(
        resolver.resolve().unwrap(),
        ResolvedLocation::at(BERLIN, LocationSource::Device)
    );
    ip.assert();
}
