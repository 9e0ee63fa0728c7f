use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::channel::oneshot;
use futures::future::{self, Either};
use futures::lock::Mutex;
use futures_timer::Delay;
use log::{debug, warn};

use crate::request::{self, EventSink, Outcome};
use crate::{AuthorizationGate, AuthorizationSource, Coordinate, FetchError, PermissionError};

/// The operating system's location service, seen as a command sink.
///
/// Events travel the other way, through the [`EventSink`] handed to
/// [`start_updates`](Self::start_updates), from whatever thread or queue the
/// OS delivers on.
pub trait LocationBackend: Send + Sync {
    /// Start the update stream for one request.
    ///
    /// A backend may report events into `sink` before this returns, for
    /// example a cached fix. On error the stream counts as not started and
    /// [`stop_updates`](Self::stop_updates) is not called.
    ///
    /// # Errors
    /// Returns an error if the stream cannot be started.
    fn start_updates(&self, sink: EventSink) -> Result<(), FetchError>;

    /// Stop the stream started by the last successful `start_updates`.
    ///
    /// Called exactly once per started stream, after the request has its
    /// outcome. Must not return while the OS may still deliver for it.
    fn stop_updates(&self);
}

/// Fetches one location fix per call, bounded by a timeout.
///
/// Calls on one fetcher are serialized: a second caller waits until the
/// first one has its outcome and its stream stopped.
pub struct LocationFetcher<B, A> {
    backend: B,
    gate: Arc<AuthorizationGate<A>>,
    serial: Mutex<()>,
}

impl<B, A: AuthorizationSource> fmt::Debug for LocationFetcher<B, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationFetcher")
            .field("prompted", &self.gate.prompted())
            .finish_non_exhaustive()
    }
}

impl<B: LocationBackend, A: AuthorizationSource> LocationFetcher<B, A> {
    /// Creates a fetcher over `backend`, gated by `gate`.
    pub fn new(backend: B, gate: Arc<AuthorizationGate<A>>) -> Self {
        Self {
            backend,
            gate,
            serial: Mutex::new(()),
        }
    }

    /// Returns the backend.
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the authorization gate.
    pub fn gate(&self) -> &AuthorizationGate<A> {
        &self.gate
    }

    /// Whether the system-wide location service is switched on.
    pub fn services_enabled(&self) -> bool {
        self.gate.services_enabled()
    }

    /// Blocks the calling thread until a fix, an error, or `timeout`.
    ///
    /// # Errors
    /// See [`fetch_async`](Self::fetch_async).
    pub fn fetch(&self, timeout: Duration) -> Result<Coordinate, FetchError> {
        pollster::block_on(self.fetch_async(timeout))
    }

    /// Requests one fix and waits at most `timeout` for it.
    ///
    /// Prompts for authorization if this process has not yet been asked.
    /// A zero timeout accepts only a fix the backend reports while starting.
    /// Dropping the future stops the update stream.
    ///
    /// # Errors
    /// - [`FetchError::NotAuthorized`] before starting anything if access
    ///   is refused, or while waiting if the user refuses the prompt.
    /// - [`FetchError::LocationUnavailable`] if the backend reports failure.
    /// - [`FetchError::Timeout`] if nothing arrives in time.
    /// - [`FetchError::PlatformUnsupported`] without a location service.
    pub async fn fetch_async(&self, timeout: Duration) -> Result<Coordinate, FetchError> {
        let _serial = self.serial.lock().await;
        self.authorize()?;

        let (sink, outcome) = request::channel();
        let stream = UpdateStream::start(&self.backend, sink)?;
        let result = race(&stream.sink, outcome, timeout).await;
        drop(stream);
        result
    }

    fn authorize(&self) -> Result<(), FetchError> {
        match self.gate.request() {
            Ok(status) if status.is_refused() => {
                debug!("location authorization refused: {status:?}");
                Err(FetchError::NotAuthorized)
            }
            Ok(_) => Ok(()),
            Err(PermissionError::NotSupported) => Err(FetchError::PlatformUnsupported),
            Err(err) => {
                warn!("cannot read location authorization, refusing: {err}");
                Err(FetchError::NotAuthorized)
            }
        }
    }
}

/// Waits for the first of the backend's outcome and the timer.
///
/// The timer writes through the same slot as the backend, so an event that
/// lands between the timer firing and the timeout being written still wins.
async fn race(
    sink: &EventSink,
    outcome: oneshot::Receiver<Outcome>,
    timeout: Duration,
) -> Outcome {
    let pending = if timeout.is_zero() {
        sink.resolve(Err(FetchError::Timeout));
        outcome
    } else {
        match future::select(outcome, Delay::new(timeout)).await {
            Either::Left((settled, _timer)) => {
                return settled.unwrap_or(Err(FetchError::LocationUnavailable));
            }
            Either::Right(((), pending)) => {
                sink.resolve(Err(FetchError::Timeout));
                pending
            }
        }
    };
    pending.await.unwrap_or(Err(FetchError::LocationUnavailable))
}

/// A started update stream. Closes the request and stops the stream when
/// dropped, which also covers a cancelled `fetch_async`.
struct UpdateStream<'a, B: LocationBackend> {
    backend: &'a B,
    sink: EventSink,
}

impl<'a, B: LocationBackend> UpdateStream<'a, B> {
    fn start(backend: &'a B, sink: EventSink) -> Result<Self, FetchError> {
        backend.start_updates(sink.clone())?;
        debug!("location updates started");
        Ok(Self { backend, sink })
    }
}

impl<B: LocationBackend> Drop for UpdateStream<'_, B> {
    fn drop(&mut self) {
        self.sink.close();
        self.backend.stop_updates();
        debug!("location updates stopped");
    }
}
