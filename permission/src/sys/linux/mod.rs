//! Linux authorization implementation using the GeoClue2 D-Bus service.
//!
//! GeoClue has no per-process authorization query. Access is decided by
//! the desktop's GeoClue agent when a client starts, and a refusal shows
//! up as an error on the location stream. What can be asked up front is
//! whether the service exists and whether the user switched location off,
//! which GeoClue reports as an available accuracy level of zero.

use zbus::blocking::{Connection, Proxy};

use crate::{PermissionError, PermissionStatus};

const GEOCLUE_BUS: &str = "org.freedesktop.GeoClue2";
const MANAGER_PATH: &str = "/org/freedesktop/GeoClue2/Manager";
const MANAGER_IFACE: &str = "org.freedesktop.GeoClue2.Manager";

fn unknown(err: impl std::fmt::Display) -> PermissionError {
    PermissionError::Unknown(err.to_string())
}

pub(crate) fn services_enabled() -> Result<bool, PermissionError> {
    let connection = Connection::system().map_err(unknown)?;
    let manager =
        Proxy::new(&connection, GEOCLUE_BUS, MANAGER_PATH, MANAGER_IFACE).map_err(unknown)?;
    let level: u32 = manager
        .get_property("AvailableAccuracyLevel")
        .map_err(unknown)?;
    Ok(level > 0)
}

pub(crate) const fn status() -> Result<PermissionStatus, PermissionError> {
    // Unsandboxed processes are authorized until the agent says otherwise.
    Ok(PermissionStatus::Granted)
}

pub(crate) const fn request() -> Result<PermissionStatus, PermissionError> {
    // No runtime prompt outside the agent
    Ok(PermissionStatus::Granted)
}
