//! Windows location backend using WinRT Geolocator events.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::debug;
use windows::Devices::Geolocation::{
    Geolocator, PositionChangedEventArgs, PositionStatus, StatusChangedEventArgs,
};
use windows::Foundation::TypedEventHandler;
use windows::core::Ref;

use crate::{Coordinate, EventSink, FetchError, LocationBackend, LocationEvent, PermissionStatus};

/// WinRT `Geolocator` backend.
#[derive(Debug, Default)]
pub struct SystemBackend {
    session: Mutex<Option<Session>>,
}

#[derive(Debug)]
struct Session {
    geolocator: Geolocator,
    position_token: i64,
    status_token: i64,
}

fn unavailable(err: &windows::core::Error) -> FetchError {
    debug!("Geolocator error: {}", err.message());
    FetchError::LocationUnavailable
}

impl SystemBackend {
    fn session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocationBackend for SystemBackend {
    fn start_updates(&self, sink: EventSink) -> Result<(), FetchError> {
        let geolocator = Geolocator::new().map_err(|e| unavailable(&e))?;

        let fixes = sink.clone();
        let position_token = geolocator
            .PositionChanged(&TypedEventHandler::new(
                move |_, args: Ref<PositionChangedEventArgs>| {
                    let point = args.ok()?.Position()?.Coordinate()?.Point()?.Position()?;
                    fixes.deliver(LocationEvent::Fix(Coordinate {
                        latitude: point.Latitude,
                        longitude: point.Longitude,
                    }));
                    Ok(())
                },
            ))
            .map_err(|e| unavailable(&e))?;

        let status_token = geolocator
            .StatusChanged(&TypedEventHandler::new(
                move |_, args: Ref<StatusChangedEventArgs>| {
                    match args.ok()?.Status()? {
                        PositionStatus::Disabled => {
                            sink.deliver(LocationEvent::AuthorizationChanged(
                                PermissionStatus::Denied,
                            ));
                        }
                        PositionStatus::NotAvailable => {
                            sink.deliver(LocationEvent::Failed("position not available".into()));
                        }
                        _ => {}
                    }
                    Ok(())
                },
            ))
            .map_err(|e| unavailable(&e));

        let status_token = match status_token {
            Ok(token) => token,
            Err(err) => {
                remove_handlers(&geolocator, position_token, None);
                return Err(err);
            }
        };

        *self.session() = Some(Session {
            geolocator,
            position_token,
            status_token,
        });
        Ok(())
    }

    fn stop_updates(&self) {
        let Some(session) = self.session().take() else {
            return;
        };
        remove_handlers(
            &session.geolocator,
            session.position_token,
            Some(session.status_token),
        );
    }
}

fn remove_handlers(geolocator: &Geolocator, position_token: i64, status_token: Option<i64>) {
    if let Err(e) = geolocator.RemovePositionChanged(position_token) {
        debug!("failed to remove PositionChanged handler: {}", e.message());
    }
    if let Some(token) = status_token
        && let Err(e) = geolocator.RemoveStatusChanged(token)
    {
        debug!("failed to remove StatusChanged handler: {}", e.message());
    }
}
