//! Build script for geokit-permission.
//!
//! On Apple targets the authorization queries are answered by a small
//! Swift helper, compiled and linked here.

use geokit_build::{SwiftLibrary, compile_swift};

fn main() {
    let library = SwiftLibrary::new(env!("CARGO_PKG_NAME"), "LocationAuthorization")
        .swift_source("src/sys/apple/LocationAuthorization.swift")
        .framework("CoreLocation");

    compile_swift("src/sys/apple/mod.rs", &library);
}
