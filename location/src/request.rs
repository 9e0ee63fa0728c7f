//! Per-request outcome slot.
//!
//! A fetch has three producers racing for one result: the backend's fix,
//! the backend's error, and the timer. They all write through an
//! [`EventSink`] into a single-assignment slot holding a oneshot sender.
//! Whoever takes the sender first decides the outcome; everybody after that
//! finds the slot empty and is dropped.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::channel::oneshot;
use log::{debug, warn};

use crate::{Coordinate, FetchError, PermissionStatus};

pub(crate) type Outcome = Result<Coordinate, FetchError>;

type Slot = Option<oneshot::Sender<Outcome>>;

/// An event reported by a location backend.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    /// The OS delivered a fix.
    Fix(Coordinate),
    /// The OS reported it cannot determine the location.
    Failed(String),
    /// The OS authorization for this process changed.
    AuthorizationChanged(PermissionStatus),
}

/// Handle a backend uses to report events for one fetch.
///
/// Cheap to clone and safe to call from any thread. Events after the fetch
/// has an outcome, or after it has returned, are ignored.
#[derive(Clone)]
pub struct EventSink {
    slot: Arc<Mutex<Slot>>,
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Creates the sink for a new request and the receiver its outcome lands in.
pub(crate) fn channel() -> (EventSink, oneshot::Receiver<Outcome>) {
    let (sender, receiver) = oneshot::channel();
    let sink = EventSink {
        slot: Arc::new(Mutex::new(Some(sender))),
    };
    (sink, receiver)
}

impl EventSink {
    /// Reports an event. Returns true if it decided the outcome.
    ///
    /// Fixes outside the valid coordinate range are ignored. Authorization
    /// changes only end the request when access is refused.
    pub fn deliver(&self, event: LocationEvent) -> bool {
        let outcome = match event {
            LocationEvent::Fix(coordinate) if coordinate.is_valid() => Ok(coordinate),
            LocationEvent::Fix(coordinate) => {
                warn!("ignoring invalid fix {coordinate:?}");
                return false;
            }
            LocationEvent::Failed(reason) => {
                debug!("location backend failed: {reason}");
                Err(FetchError::LocationUnavailable)
            }
            LocationEvent::AuthorizationChanged(status) if status.is_refused() => {
                Err(FetchError::NotAuthorized)
            }
            LocationEvent::AuthorizationChanged(status) => {
                debug!("location authorization changed to {status:?}");
                return false;
            }
        };
        self.resolve(outcome)
    }

    /// Whether the request already has an outcome or has returned.
    ///
    /// Backends may use this to stop work early.
    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }

    /// Writes `outcome` if the slot is still empty.
    pub(crate) fn resolve(&self, outcome: Outcome) -> bool {
        let Some(sender) = self.lock().take() else {
            debug!("dropping late location outcome {outcome:?}");
            return false;
        };
        sender.send(outcome).is_ok()
    }

    /// Refuses every later event.
    pub(crate) fn close(&self) {
        self.lock().take();
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn first_event_wins() {
        let (sink, mut receiver) = channel();

        assert!(sink.deliver(LocationEvent::Fix(Coordinate::new(1.0, 2.0))));
        assert!(!sink.deliver(LocationEvent::Failed("late".into())));
        assert!(!sink.resolve(Err(FetchError::Timeout)));

        assert_eq!(
            receiver.try_recv().unwrap(),
            Some(Ok(Coordinate::new(1.0, 2.0)))
        );
        assert!(sink.is_closed());
    }

    #[test]
    fn invalid_fix_keeps_request_open() {
        let (sink, receiver) = channel();

        assert!(!sink.deliver(LocationEvent::Fix(Coordinate::new(f64::NAN, 0.0))));
        assert!(!sink.is_closed());
        assert!(sink.deliver(LocationEvent::Fix(Coordinate::new(0.0, 0.0))));

        assert_eq!(receiver.now_or_never(), Some(Ok(Ok(Coordinate::new(0.0, 0.0)))));
    }

    #[test]
    fn authorization_changes_end_only_on_refusal() {
        let (sink, receiver) = channel();

        assert!(!sink.deliver(LocationEvent::AuthorizationChanged(PermissionStatus::Granted)));
        assert!(!sink.deliver(LocationEvent::AuthorizationChanged(
            PermissionStatus::NotDetermined
        )));
        assert!(sink.deliver(LocationEvent::AuthorizationChanged(
            PermissionStatus::Restricted
        )));

        assert_eq!(receiver.now_or_never(), Some(Ok(Err(FetchError::NotAuthorized))));
    }

    #[test]
    fn backend_failure_reads_as_unavailable() {
        let (sink, receiver) = channel();
        assert!(sink.deliver(LocationEvent::Failed("no signal".into())));
        assert_eq!(
            receiver.now_or_never(),
            Some(Ok(Err(FetchError::LocationUnavailable)))
        );
    }

    #[test]
    fn closed_sink_drops_events_from_other_threads() {
        let (sink, _receiver) = channel();
        sink.close();

        let late = sink.clone();
        let delivered = std::thread::spawn(move || {
            late.deliver(LocationEvent::Fix(Coordinate::new(10.0, 10.0)))
        })
        .join()
        .unwrap();

        assert!(!delivered);
        assert!(sink.is_closed());
    }
}
