//! Linux location backend using the GeoClue2 D-Bus service.
//!
//! Each request gets its own GeoClue client, driven on a dedicated thread:
//! the client is created and started there, its `LocationUpdated` signals
//! are turned into fixes, and it is stopped and deleted once the request
//! is over. A stop request interrupts the worker at any await, connecting
//! and client setup included, so `stop_updates` returns promptly.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use futures::StreamExt;
use futures::channel::oneshot;
use futures::future::{self, Either};
use log::{debug, warn};
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};
use zbus::{Connection, MatchRule, MessageStream, message};

use crate::{Coordinate, EventSink, FetchError, LocationBackend, LocationEvent, PermissionStatus};

const GEOCLUE_BUS: &str = "org.freedesktop.GeoClue2";
const MANAGER_PATH: &str = "/org/freedesktop/GeoClue2/Manager";
const MANAGER_IFACE: &str = "org.freedesktop.GeoClue2.Manager";
const CLIENT_IFACE: &str = "org.freedesktop.GeoClue2.Client";
const LOCATION_IFACE: &str = "org.freedesktop.GeoClue2.Location";
const PROPERTIES_IFACE: &str = "org.freedesktop.DBus.Properties";
const ACCESS_DENIED: &str = "org.freedesktop.DBus.Error.AccessDenied";

const DESKTOP_ID: &str = "geokit";
// GCLUE_ACCURACY_LEVEL_EXACT
const ACCURACY_LEVEL_EXACT: u32 = 8;

/// GeoClue2 location backend.
#[derive(Debug, Default)]
pub struct SystemBackend {
    session: Mutex<Option<Session>>,
}

#[derive(Debug)]
struct Session {
    stop: oneshot::Sender<()>,
    worker: JoinHandle<()>,
}

impl SystemBackend {
    fn session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocationBackend for SystemBackend {
    fn start_updates(&self, sink: EventSink) -> Result<(), FetchError> {
        let (stop, stopped) = oneshot::channel();
        let worker = thread::Builder::new()
            .name("geokit-geoclue".into())
            .spawn(move || futures::executor::block_on(run_client(sink, stopped)))
            .map_err(|e| {
                warn!("failed to spawn GeoClue worker: {e}");
                FetchError::LocationUnavailable
            })?;

        *self.session() = Some(Session { stop, worker });
        Ok(())
    }

    fn stop_updates(&self) {
        let Some(session) = self.session().take() else {
            return;
        };
        // The worker may already be gone after delivering its outcome.
        let _ = session.stop.send(());
        if session.worker.join().is_err() {
            warn!("GeoClue worker panicked");
        }
    }
}

async fn run_client(sink: EventSink, mut stopped: oneshot::Receiver<()>) {
    let mut opened = None;
    let Some(outcome) = until_stopped(serve(&sink, &mut opened), &mut stopped).await else {
        // GeoClue reaps the clients of a dropped connection.
        return;
    };
    if let Err(e) = outcome {
        sink.deliver(event_for(&e));
    }

    if let Some((connection, client)) = opened {
        until_stopped(release_client(&connection, &client), &mut stopped).await;
    }
}

/// Runs `work` until it completes or `stopped` fires, whichever is first.
///
/// Every await of the client lifecycle sits inside `work`: D-Bus calls
/// have no timeout, and `stop_updates` joins this thread.
async fn until_stopped<F: Future>(
    work: F,
    stopped: &mut oneshot::Receiver<()>,
) -> Option<F::Output> {
    futures::pin_mut!(work);
    match future::select(work, stopped).await {
        Either::Left((output, _)) => Some(output),
        Either::Right(_) => None,
    }
}

/// Connects, creates a client and streams its fixes. The client is parked
/// in `opened` as soon as it exists.
async fn serve(
    sink: &EventSink,
    opened: &mut Option<(Connection, OwnedObjectPath)>,
) -> zbus::Result<()> {
    let connection = Connection::system().await?;
    let client = get_client(&connection).await?;
    let (connection, client) = &*opened.insert((connection, client));

    // GeoClue refuses to start clients without a desktop ID.
    set_client_property(connection, client, "DesktopId", Value::from(DESKTOP_ID)).await?;
    set_client_property(
        connection,
        client,
        "RequestedAccuracyLevel",
        Value::from(ACCURACY_LEVEL_EXACT),
    )
    .await?;

    stream_fixes(connection, client, sink).await
}

async fn get_client(connection: &Connection) -> zbus::Result<OwnedObjectPath> {
    let (client,): (OwnedObjectPath,) = connection
        .call_method(
            Some(GEOCLUE_BUS),
            MANAGER_PATH,
            Some(MANAGER_IFACE),
            "GetClient",
            &(),
        )
        .await?
        .body()
        .deserialize()?;
    Ok(client)
}

async fn set_client_property(
    connection: &Connection,
    client: &OwnedObjectPath,
    name: &str,
    value: Value<'_>,
) -> zbus::Result<()> {
    connection
        .call_method(
            Some(GEOCLUE_BUS),
            client.as_str(),
            Some(PROPERTIES_IFACE),
            "Set",
            &(CLIENT_IFACE, name, value),
        )
        .await?;
    Ok(())
}

/// Starts the client and reports fixes until one is accepted.
async fn stream_fixes(
    connection: &Connection,
    client: &OwnedObjectPath,
    sink: &EventSink,
) -> zbus::Result<()> {
    let rule = MatchRule::builder()
        .msg_type(message::Type::Signal)
        .sender(GEOCLUE_BUS)?
        .path(client.as_str())?
        .interface(CLIENT_IFACE)?
        .member("LocationUpdated")?
        .build();
    // Subscribe before starting so the first update is not missed.
    let mut updates = MessageStream::for_match_rule(rule, connection, None).await?;

    connection
        .call_method(
            Some(GEOCLUE_BUS),
            client.as_str(),
            Some(CLIENT_IFACE),
            "Start",
            &(),
        )
        .await?;

    while let Some(message) = updates.next().await {
        let (_old, new): (OwnedObjectPath, OwnedObjectPath) = message?.body().deserialize()?;
        let coordinate = Coordinate {
            latitude: location_property(connection, &new, "Latitude").await?,
            longitude: location_property(connection, &new, "Longitude").await?,
        };
        if sink.deliver(LocationEvent::Fix(coordinate)) || sink.is_closed() {
            break;
        }
    }
    Ok(())
}

async fn location_property(
    connection: &Connection,
    location: &OwnedObjectPath,
    name: &str,
) -> zbus::Result<f64> {
    let value: OwnedValue = connection
        .call_method(
            Some(GEOCLUE_BUS),
            location.as_str(),
            Some(PROPERTIES_IFACE),
            "Get",
            &(LOCATION_IFACE, name),
        )
        .await?
        .body()
        .deserialize()?;
    Ok(f64::try_from(value)?)
}

async fn release_client(connection: &Connection, client: &OwnedObjectPath) {
    if let Err(e) = connection
        .call_method(
            Some(GEOCLUE_BUS),
            client.as_str(),
            Some(CLIENT_IFACE),
            "Stop",
            &(),
        )
        .await
    {
        debug!("failed to stop GeoClue client: {e}");
    }

    if let Err(e) = connection
        .call_method(
            Some(GEOCLUE_BUS),
            MANAGER_PATH,
            Some(MANAGER_IFACE),
            "DeleteClient",
            client,
        )
        .await
    {
        debug!("failed to delete GeoClue client: {e}");
    }
}

/// GeoClue's agent refuses clients with `AccessDenied`; anything else
/// means no location.
fn event_for(err: &zbus::Error) -> LocationEvent {
    match err {
        zbus::Error::MethodError(name, _, _) if name.as_str() == ACCESS_DENIED => {
            LocationEvent::AuthorizationChanged(PermissionStatus::Denied)
        }
        _ => LocationEvent::Failed(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use pretty_assertions::assert_eq;
    use zbus::message::Message;
    use zbus::names::ErrorName;

    use super::*;

    #[test]
    fn access_denied_reads_as_refusal() {
        let call = Message::method_call("/org/freedesktop/GeoClue2/Client/1", "Start")
            .unwrap()
            .build(&())
            .unwrap();
        let err = zbus::Error::MethodError(
            ErrorName::try_from(ACCESS_DENIED).unwrap().into(),
            Some("Geolocation disabled for UID 1000".to_owned()),
            call,
        );

        assert_eq!(
            event_for(&err),
            LocationEvent::AuthorizationChanged(PermissionStatus::Denied)
        );
    }

    #[test]
    fn other_errors_read_as_failures() {
        let err = zbus::Error::Failure("no such service".to_owned());
        assert!(matches!(event_for(&err), LocationEvent::Failed(_)));
    }

    #[test]
    fn stop_interrupts_work_that_never_finishes() {
        let (stop, mut stopped) = oneshot::channel();
        let worker = thread::spawn(move || {
            futures::executor::block_on(until_stopped(future::pending::<()>(), &mut stopped))
        });

        thread::sleep(Duration::from_millis(20));
        let asked = Instant::now();
        stop.send(()).unwrap();

        assert_eq!(worker.join().unwrap(), None);
        assert!(asked.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn finished_work_returns_its_output() {
        let (_stop, mut stopped) = oneshot::channel::<()>();
        let output = futures::executor::block_on(until_stopped(future::ready(7), &mut stopped));
        assert_eq!(output, Some(7));
    }
}
