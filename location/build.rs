//! Build script for geokit-location.

use geokit_build::{SwiftLibrary, compile_swift};

fn main() {
    let library = SwiftLibrary::new(env!("CARGO_PKG_NAME"), "LocationSession")
        .swift_source("src/sys/apple/LocationSession.swift")
        .framework("CoreLocation");

    compile_swift("src/sys/apple/mod.rs", &library);
}
