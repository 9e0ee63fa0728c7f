//! Bounded, single-fix device location.
//!
//! The operating system delivers locations asynchronously, through a
//! delegate or event subscription, after an authorization check it runs on
//! its own schedule. This crate turns that into one call that returns a
//! single [`Coordinate`] or one [`FetchError`] within a caller-supplied
//! timeout, and always stops the OS update stream before returning.
//!
//! Supported backends: CoreLocation on iOS and macOS, GeoClue2 on Linux,
//! WinRT `Geolocator` on Windows. Elsewhere every fetch fails with
//! [`FetchError::PlatformUnsupported`].
//!
//! ```no_run
//! use geokit_location::{FetchError, get_current_location};
//!
//! match get_current_location(5.0) {
//!     Ok(fix) => println!("{}, {}", fix.latitude, fix.longitude),
//!     Err(FetchError::Timeout) => println!("no fix within 5s"),
//!     Err(e) => println!("location failed: {e}"),
//! }
//! ```

#![warn(missing_docs)]

mod fetch;
mod request;
/// Platform-specific implementations.
mod sys;

use std::sync::LazyLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use fetch::{LocationBackend, LocationFetcher};
pub use geokit_permission::{
    AuthorizationGate, AuthorizationSource, PermissionError, PermissionStatus,
    SystemAuthorization,
};
pub use request::{EventSink, LocationEvent};
pub use sys::SystemBackend;

/// Upper bound applied to caller-supplied timeouts.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// A geographic coordinate in degrees (WGS-84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both values are finite and within their ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Errors that can occur when fetching the current location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum FetchError {
    /// Location access was denied or restricted for this process.
    #[error("location access not authorized")]
    NotAuthorized,
    /// The location service could not determine a location.
    #[error("location not available")]
    LocationUnavailable,
    /// No location arrived before the timeout.
    #[error("location request timed out")]
    Timeout,
    /// This platform has no location service.
    #[error("location not supported on this platform")]
    PlatformUnsupported,
}

/// Converts a timeout in seconds into a [`Duration`].
///
/// Zero, negative and NaN read as [`Duration::ZERO`], which makes a fetch
/// accept only a fix the backend delivers while starting. Values above
/// [`MAX_TIMEOUT`], infinity included, are clamped to it.
#[must_use]
pub fn timeout_from_secs(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).map_or(MAX_TIMEOUT, |timeout| timeout.min(MAX_TIMEOUT))
}

/// The fetcher backed by the current platform.
pub type SystemFetcher = LocationFetcher<SystemBackend, SystemAuthorization>;

static SYSTEM_FETCHER: LazyLock<SystemFetcher> = LazyLock::new(|| {
    LocationFetcher::new(SystemBackend::default(), geokit_permission::system_gate())
});

/// The process-wide fetcher. Calls through it are serialized.
#[must_use]
pub fn system_fetcher() -> &'static SystemFetcher {
    &SYSTEM_FETCHER
}

/// Whether the system-wide location service is switched on.
///
/// This does not mean this process is authorized. Returns `false` when the
/// answer cannot be determined.
#[must_use]
pub fn services_enabled() -> bool {
    geokit_permission::services_enabled()
}

/// Get the current device location, waiting at most `timeout_secs` seconds.
///
/// The first call in a process may trigger the OS authorization prompt.
///
/// # Errors
/// - [`FetchError::NotAuthorized`] immediately if access is denied or restricted.
/// - [`FetchError::LocationUnavailable`] if the OS reports it cannot locate the device.
/// - [`FetchError::Timeout`] if no fix arrives in time.
/// - [`FetchError::PlatformUnsupported`] on platforms without a location service.
pub fn get_current_location(timeout_secs: f64) -> Result<Coordinate, FetchError> {
    SYSTEM_FETCHER.fetch(timeout_from_secs(timeout_secs))
}

/// Async variant of [`get_current_location`].
///
/// # Errors
/// Same as [`get_current_location`].
pub async fn get_current_location_async(timeout: Duration) -> Result<Coordinate, FetchError> {
    SYSTEM_FETCHER.fetch_async(timeout.min(MAX_TIMEOUT)).await
}
