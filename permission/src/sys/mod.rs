//! Platform-specific authorization implementations.

#[cfg(any(target_os = "ios", target_os = "macos"))]
mod apple;

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
mod linux;

// Re-export platform implementations
#[cfg(any(target_os = "ios", target_os = "macos"))]
pub(crate) use apple::{request, services_enabled, status};

#[cfg(target_os = "windows")]
pub(crate) use windows::{request, services_enabled, status};

#[cfg(target_os = "linux")]
pub(crate) use linux::{request, services_enabled, status};

// Fallback for unsupported platforms
#[cfg(not(any(
    target_os = "ios",
    target_os = "macos",
    target_os = "windows",
    target_os = "linux"
)))]
mod unsupported {
    use crate::{PermissionError, PermissionStatus};

    pub(crate) const fn services_enabled() -> Result<bool, PermissionError> {
        Err(PermissionError::NotSupported)
    }

    pub(crate) const fn status() -> Result<PermissionStatus, PermissionError> {
        Err(PermissionError::NotSupported)
    }

    pub(crate) const fn request() -> Result<PermissionStatus, PermissionError> {
        Err(PermissionError::NotSupported)
    }
}

#[cfg(not(any(
    target_os = "ios",
    target_os = "macos",
    target_os = "windows",
    target_os = "linux"
)))]
pub(crate) use unsupported::{request, services_enabled, status};
