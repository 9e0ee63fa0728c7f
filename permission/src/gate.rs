use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};

use crate::{AuthorizationSource, PermissionError, PermissionStatus};

/// Wraps an [`AuthorizationSource`] with fail-closed reads and one-time
/// prompting.
#[derive(Debug)]
pub struct AuthorizationGate<S> {
    source: S,
    prompted: AtomicBool,
}

impl<S: AuthorizationSource> AuthorizationGate<S> {
    /// Creates a gate that has not prompted yet.
    pub const fn new(source: S) -> Self {
        Self {
            source,
            prompted: AtomicBool::new(false),
        }
    }

    /// Returns the wrapped source.
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Whether the system-wide location service is switched on.
    ///
    /// Fails closed: an error from the source reads as `false`.
    pub fn services_enabled(&self) -> bool {
        match self.source.services_enabled() {
            Ok(enabled) => enabled,
            Err(PermissionError::NotSupported) => {
                debug!("location services not supported on this platform");
                false
            }
            Err(err) => {
                warn!("cannot determine location services state: {err}");
                false
            }
        }
    }

    /// Current authorization without prompting.
    ///
    /// An error from the source reads as `NotDetermined`.
    pub fn check(&self) -> PermissionStatus {
        self.source.status().unwrap_or_else(|err| {
            debug!("cannot read location authorization: {err}");
            PermissionStatus::NotDetermined
        })
    }

    /// Whether this gate has already triggered the OS prompt.
    pub fn prompted(&self) -> bool {
        self.prompted.load(Ordering::Acquire)
    }

    /// Prompts for authorization if the status is undetermined and this gate
    /// has not prompted before; otherwise returns the current status.
    ///
    /// # Errors
    /// Propagates errors from the source. A failed prompt does not count as
    /// prompted, so a later call may try again.
    pub fn request(&self) -> Result<PermissionStatus, PermissionError> {
        let status = self.source.status()?;
        if status != PermissionStatus::NotDetermined {
            return Ok(status);
        }
        if self.prompted.swap(true, Ordering::AcqRel) {
            return Ok(status);
        }

        info!("requesting location authorization");
        self.source.request().inspect_err(|_| {
            self.prompted.store(false, Ordering::Release);
        })
    }
}
