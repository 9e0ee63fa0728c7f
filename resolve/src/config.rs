use std::time::Duration;

use geokit_location::Coordinate;
use serde::Deserialize;

/// Default wait for a device fix.
pub const DEFAULT_DEVICE_TIMEOUT: Duration = Duration::from_secs(10);
/// Default IP geolocation endpoint.
pub const DEFAULT_IP_ENDPOINT: &str = "http://ip-api.com/json/";
/// Default IP geolocation request timeout.
pub const DEFAULT_IP_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolver settings.
///
/// Every field is optional when deserializing; durations are written the
/// humantime way (`"10s"`, `"1m 30s"`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolveConfig {
    /// Fixed coordinate; wins over everything else.
    pub coordinate: Option<Coordinate>,
    /// City name to geocode when no coordinate is set.
    pub city: Option<String>,
    /// How long to wait for a device fix before falling back to IP.
    #[serde(with = "humantime_serde")]
    pub device_timeout: Duration,
    /// IP geolocation endpoint, answering in the ip-api.com JSON format.
    pub ip_endpoint: String,
    /// Timeout of the IP geolocation request.
    #[serde(with = "humantime_serde")]
    pub ip_timeout: Duration,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            coordinate: None,
            city: None,
            device_timeout: DEFAULT_DEVICE_TIMEOUT,
            ip_endpoint: DEFAULT_IP_ENDPOINT.to_owned(),
            ip_timeout: DEFAULT_IP_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: ResolveConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ResolveConfig::default());
        assert_eq!(config.device_timeout, Duration::from_secs(10));
        assert_eq!(config.ip_timeout, Duration::from_secs(5));
        assert_eq!(config.ip_endpoint, "http://ip-api.com/json/");
    }

    #[test]
    fn durations_and_coordinate_deserialize() {
        let config: ResolveConfig = serde_json::from_str(
            r#"{
                "coordinate": { "latitude": 48.85, "longitude": 2.35 },
                "city": "Paris",
                "device_timeout": "2s 500ms",
                "ip_timeout": "1m"
            }"#,
        )
        .unwrap();

        assert_eq!(
            config,
            ResolveConfig {
                coordinate: Some(Coordinate::new(48.85, 2.35)),
                city: Some("Paris".to_owned()),
                device_timeout: Duration::from_millis(2500),
                ip_timeout: Duration::from_secs(60),
                ..ResolveConfig::default()
            }
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_str::<ResolveConfig>(r#"{ "timeout": "10s" }"#);
        assert!(result.is_err());
    }
}
