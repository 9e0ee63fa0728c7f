//! Apple platform (iOS/macOS) location backend using swift-bridge.
//!
//! CoreLocation delivers to a delegate on the run loop of the thread that
//! created its manager. The Swift side gives every session its own thread
//! and run loop, so delivery never depends on the caller's thread, which
//! is blocked waiting for the outcome.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{Coordinate, EventSink, FetchError, LocationBackend, LocationEvent, PermissionStatus};

#[swift_bridge::bridge]
mod ffi {
    extern "Rust" {
        type SessionCallback;
        fn on_fix(&self, latitude: f64, longitude: f64);
        fn on_error(&self, message: String);
        fn on_authorization(&self, state: u8);
    }

    extern "Swift" {
        fn start_location_session(callback: SessionCallback) -> u64;
        fn stop_location_session(session: u64);
    }
}

/// Receives CoreLocation delegate calls for one session.
pub struct SessionCallback {
    sink: EventSink,
}

impl SessionCallback {
    fn on_fix(&self, latitude: f64, longitude: f64) {
        self.sink
            .deliver(LocationEvent::Fix(Coordinate { latitude, longitude }));
    }

    fn on_error(&self, message: String) {
        self.sink.deliver(LocationEvent::Failed(message));
    }

    fn on_authorization(&self, state: u8) {
        let status = match state {
            1 => PermissionStatus::Restricted,
            2 => PermissionStatus::Denied,
            3 => PermissionStatus::Granted,
            _ => PermissionStatus::NotDetermined,
        };
        self.sink.deliver(LocationEvent::AuthorizationChanged(status));
    }
}

/// CoreLocation backend.
#[derive(Debug, Default)]
pub struct SystemBackend {
    session: Mutex<Option<u64>>,
}

impl SystemBackend {
    fn session(&self) -> MutexGuard<'_, Option<u64>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocationBackend for SystemBackend {
    fn start_updates(&self, sink: EventSink) -> Result<(), FetchError> {
        let session = ffi::start_location_session(SessionCallback { sink });
        *self.session() = Some(session);
        Ok(())
    }

    /// Blocks until the session's run loop has exited.
    fn stop_updates(&self) {
        if let Some(session) = self.session().take() {
            ffi::stop_location_session(session);
        }
    }
}
