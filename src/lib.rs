//! # Geokit
//!
//! Bounded, permission-aware device location.
//!
//! Geokit turns the callback-driven location services of macOS, iOS, Linux
//! (GeoClue2) and Windows into two plain calls: one that tells you whether
//! location services are on, and one that returns a single fix or fails
//! within the timeout you give it.
//!
//! ## Features
//!
//! - `permission`: the authorization gate (services enabled, authorization
//!   status, one-time prompting).
//! - `location`: the bounded location fetcher. Enabled by default.
//! - `resolve`: manual / city / device / IP-geolocation resolution chain.
//!
//! Use the `full` feature to enable everything.
//!
//! ## Example
//!
//! ```toml
//! [dependencies]
//! geokit = { version = "0.1", features = ["location"] }
//! ```
//!
//! ```no_run
//! use geokit::location;
//!
//! if location::services_enabled() {
//!     match location::get_current_location(5.0) {
//!         Ok(fix) => println!("Latitude: {}, Longitude: {}", fix.latitude, fix.longitude),
//!         Err(e) => eprintln!("no fix: {e}"),
//!     }
//! }
//! ```

#[cfg(feature = "location")]
pub use geokit_location as location;

#[cfg(feature = "permission")]
pub use geokit_permission as permission;

#[cfg(feature = "resolve")]
pub use geokit_resolve as resolve;
