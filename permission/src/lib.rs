//! Location services and authorization gate.
//!
//! Before the operating system hands out a location fix two independent
//! switches have to be on: the system-wide location service, and the
//! per-process authorization. This crate answers both questions without
//! ever blocking on user interaction, and owns the one-time authorization
//! prompt as explicit state instead of leaving it to whichever request
//! happens to run first.
//!
//! ```no_run
//! use geokit_permission::PermissionStatus;
//!
//! if geokit_permission::services_enabled() {
//!     let status = geokit_permission::request().unwrap_or(PermissionStatus::NotDetermined);
//!     println!("authorization: {status:?}, prompted: {}", geokit_permission::prompted());
//! }
//! ```

#![warn(missing_docs)]

mod gate;
/// Platform-specific implementations.
mod sys;

use std::sync::{Arc, LazyLock};

pub use gate::AuthorizationGate;

/// The current location authorization of this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionStatus {
    /// Permission has been granted by the user.
    Granted,
    /// Permission has been denied by the user.
    Denied,
    /// Permission is restricted (e.g., parental controls or MDM policy).
    Restricted,
    /// Permission has not been requested yet.
    NotDetermined,
}

impl PermissionStatus {
    /// Returns true if the OS refuses location access and will not ask again.
    #[must_use]
    pub const fn is_refused(self) -> bool {
        matches!(self, Self::Denied | Self::Restricted)
    }
}

/// Errors that can occur when querying or requesting authorization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionError {
    /// Location authorization is not available on this platform.
    #[error("location authorization not supported on this platform")]
    NotSupported,
    /// The platform reported an error.
    #[error("unknown error: {0}")]
    Unknown(String),
}

/// The operating system side of the gate.
///
/// Implementations answer from whatever the platform exposes; they never
/// wait for the user to answer a prompt.
pub trait AuthorizationSource: Send + Sync {
    /// Whether the system-wide location service is switched on.
    ///
    /// # Errors
    /// Returns an error if the platform cannot be queried.
    fn services_enabled(&self) -> Result<bool, PermissionError>;

    /// The current authorization of this process, without prompting.
    ///
    /// # Errors
    /// Returns an error if the platform cannot be queried.
    fn status(&self) -> Result<PermissionStatus, PermissionError>;

    /// Ask the OS to show its authorization prompt and return the status
    /// right after asking. The user's answer usually arrives later.
    ///
    /// # Errors
    /// Returns an error if the platform cannot be asked.
    fn request(&self) -> Result<PermissionStatus, PermissionError>;
}

/// Authorization source backed by the current platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAuthorization;

impl AuthorizationSource for SystemAuthorization {
    fn services_enabled(&self) -> Result<bool, PermissionError> {
        sys::services_enabled()
    }

    fn status(&self) -> Result<PermissionStatus, PermissionError> {
        sys::status()
    }

    fn request(&self) -> Result<PermissionStatus, PermissionError> {
        sys::request()
    }
}

static SYSTEM_GATE: LazyLock<Arc<AuthorizationGate<SystemAuthorization>>> =
    LazyLock::new(|| Arc::new(AuthorizationGate::new(SystemAuthorization)));

/// The process-wide gate for the current platform.
///
/// Every caller shares its prompt state, so the OS prompt is triggered at
/// most once per process no matter who asks.
#[must_use]
pub fn system_gate() -> Arc<AuthorizationGate<SystemAuthorization>> {
    Arc::clone(&SYSTEM_GATE)
}

/// Whether the system-wide location service is switched on.
///
/// Returns `false` when the answer cannot be determined.
#[must_use]
pub fn services_enabled() -> bool {
    SYSTEM_GATE.services_enabled()
}

/// Check the current authorization without requesting it.
#[must_use]
pub fn check() -> PermissionStatus {
    SYSTEM_GATE.check()
}

/// Request location authorization from the user.
///
/// If the status is already determined, or this process has already shown
/// the prompt, this returns the current status without prompting again.
///
/// # Errors
/// Returns a `PermissionError` if:
/// - Location authorization is not supported on this platform.
/// - An underlying platform error occurs.
pub fn request() -> Result<PermissionStatus, PermissionError> {
    SYSTEM_GATE.request()
}

/// Whether this process has already triggered the OS authorization prompt.
#[must_use]
pub fn prompted() -> bool {
    SYSTEM_GATE.prompted()
}
