//! Shared build utilities for geokit crates.
//!
//! The platform crates talk to CoreLocation through small Swift helpers.
//! This crate generates the swift-bridge glue for them and compiles the
//! helpers into a static library the Rust crate links against.
//!
//! # Usage
//!
//! In your `build.rs`:
//!
//! ```ignore
//! use geokit_build::{SwiftLibrary, compile_swift};
//!
//! fn main() {
//!     let library = SwiftLibrary::new(env!("CARGO_PKG_NAME"), "LocationHelper")
//!         .swift_source("src/sys/apple/LocationSession.swift")
//!         .framework("CoreLocation");
//!     compile_swift("src/sys/apple/mod.rs", &library);
//! }
//! ```
//!
//! Every entry point is a no-op unless the crate is being built for iOS or
//! macOS, so build scripts can call them unconditionally.

#![warn(missing_docs)]

mod apple;

pub use apple::{SwiftLibrary, compile_swift, is_apple_target};
