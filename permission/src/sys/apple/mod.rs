//! Apple platform (iOS/macOS) authorization implementation using swift-bridge.

use crate::{PermissionError, PermissionStatus};

#[swift_bridge::bridge]
mod ffi {
    enum AuthorizationState {
        NotDetermined,
        Restricted,
        Denied,
        Granted,
    }

    extern "Swift" {
        fn location_services_enabled() -> bool;
        fn location_authorization_state() -> AuthorizationState;
        fn request_location_authorization() -> AuthorizationState;
    }
}

const fn status_from_ffi(state: ffi::AuthorizationState) -> PermissionStatus {
    match state {
        ffi::AuthorizationState::NotDetermined => PermissionStatus::NotDetermined,
        ffi::AuthorizationState::Restricted => PermissionStatus::Restricted,
        ffi::AuthorizationState::Denied => PermissionStatus::Denied,
        ffi::AuthorizationState::Granted => PermissionStatus::Granted,
    }
}

#[allow(clippy::unnecessary_wraps)]
pub(crate) fn services_enabled() -> Result<bool, PermissionError> {
    Ok(ffi::location_services_enabled())
}

#[allow(clippy::unnecessary_wraps)]
pub(crate) fn status() -> Result<PermissionStatus, PermissionError> {
    Ok(status_from_ffi(ffi::location_authorization_state()))
}

/// The prompt is asynchronous on Apple platforms; the returned status is the
/// one in effect right after asking.
#[allow(clippy::unnecessary_wraps)]
pub(crate) fn request() -> Result<PermissionStatus, PermissionError> {
    Ok(status_from_ffi(ffi::request_location_authorization()))
}
