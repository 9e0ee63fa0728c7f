//! Manual test binary for geokit-location.
//!
//! Run with: cargo run -p geokit-location-test -- [timeout-seconds]

use geokit_location::FetchError;

fn main() {
    env_logger::init();

    let timeout: f64 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(10.0);

    println!("=== Geokit Location Test ===\n");

    println!("Location services enabled: {}", geokit_location::services_enabled());
    println!("Authorization: {:?}\n", geokit_permission::check());

    println!("Getting current location (timeout {timeout}s)...");
    match geokit_location::get_current_location(timeout) {
        Ok(fix) => {
            println!("✓ Location retrieved successfully!");
            println!("  Latitude:  {:.6}°", fix.latitude);
            println!("  Longitude: {:.6}°", fix.longitude);
        }
        Err(FetchError::NotAuthorized) => {
            println!("✗ Not authorized. Enable location access for this terminal in system settings.");
        }
        Err(e) => println!("✗ Failed to get location: {e}"),
    }

    println!("\nPrompted this run: {}", geokit_permission::prompted());
}
