//! Windows authorization implementation using WinRT Geolocator.

use windows::Devices::Geolocation::{GeolocationAccessStatus, Geolocator, PositionStatus};

use crate::{PermissionError, PermissionStatus};

fn unknown(err: &windows::core::Error) -> PermissionError {
    PermissionError::Unknown(err.message().to_string())
}

pub(crate) fn services_enabled() -> Result<bool, PermissionError> {
    let geolocator = Geolocator::new().map_err(|e| unknown(&e))?;
    let status = geolocator.LocationStatus().map_err(|e| unknown(&e))?;
    Ok(status != PositionStatus::Disabled && status != PositionStatus::NotAvailable)
}

pub(crate) fn status() -> Result<PermissionStatus, PermissionError> {
    let geolocator = Geolocator::new().map_err(|e| unknown(&e))?;
    let position = geolocator.LocationStatus().map_err(|e| unknown(&e))?;
    Ok(status_from_position(position))
}

/// Reads authorization off the locator status without asking for access.
/// `Disabled` covers both the app switch and the system switch.
fn status_from_position(position: PositionStatus) -> PermissionStatus {
    match position {
        PositionStatus::Disabled => PermissionStatus::Denied,
        PositionStatus::Ready | PositionStatus::Initializing | PositionStatus::NoData => {
            PermissionStatus::Granted
        }
        _ => PermissionStatus::NotDetermined,
    }
}

pub(crate) fn request() -> Result<PermissionStatus, PermissionError> {
    let access = Geolocator::RequestAccessAsync()
        .map_err(|e| unknown(&e))?
        .get()
        .map_err(|e| unknown(&e))?;

    Ok(match access {
        GeolocationAccessStatus::Allowed => PermissionStatus::Granted,
        GeolocationAccessStatus::Denied => PermissionStatus::Denied,
        _ => PermissionStatus::NotDetermined,
    })
}
