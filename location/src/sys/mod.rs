//! Platform-specific location backends.

#[cfg(any(target_os = "ios", target_os = "macos"))]
mod apple;

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
mod linux;

// Re-export platform implementations
#[cfg(any(target_os = "ios", target_os = "macos"))]
pub use apple::SystemBackend;

#[cfg(target_os = "windows")]
pub use windows::SystemBackend;

#[cfg(target_os = "linux")]
pub use linux::SystemBackend;

// Fallback for unsupported platforms
#[cfg(not(any(
    target_os = "ios",
    target_os = "macos",
    target_os = "windows",
    target_os = "linux"
)))]
mod unsupported {
    use crate::{EventSink, FetchError, LocationBackend};

    /// Location backend for platforms without a location service.
    #[derive(Debug, Default)]
    pub struct SystemBackend;

    impl LocationBackend for SystemBackend {
        fn start_updates(&self, _sink: EventSink) -> Result<(), FetchError> {
            Err(FetchError::PlatformUnsupported)
        }

        fn stop_updates(&self) {}
    }
}

#[cfg(not(any(
    target_os = "ios",
    target_os = "macos",
    target_os = "windows",
    target_os = "linux"
)))]
pub use unsupported::SystemBackend;
