use httpmock::prelude::*;
use orgmap::adapters::ip_locator::IpApiLocator;
use orgmap::adapters::sensor::{FixedSensor, NoSensor};
use orgmap::domain::model::{Coordinate, LocationSource, NotificationKind};
use orgmap::{LocationDetector, LocationProvider, ToastBoard};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn locator(server: &MockServer) -> IpApiLocator {
    IpApiLocator::new(server.url("/json/"), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_ip_fallback_without_sensor() {
    let server = MockServer::start();
    let ip_mock = server.mock(|when, then| {
        when.method(GET).path("/json/");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({
                "ip": "203.0.113.7",
                "city": "Berlin",
                "country_name": "Germany",
                "latitude": 52.52,
                "longitude": 13.405
            }));
    });

    let notifier = Arc::new(ToastBoard::new());
    let provider = LocationProvider::new();
    let detector =
        LocationDetector::new(NoSensor, locator(&server), notifier.clone(), provider.clone());

    let location = detector.detect().await.unwrap();
    ip_mock.assert();

    assert_eq!(location.coordinate, Coordinate::new(52.52, 13.405));
    assert_eq!(location.source, LocationSource::IpLookup);
    assert_eq!(provider.current(), Some(location));

    let toast = notifier.get("location-ip").unwrap();
    assert_eq!(toast.kind, NotificationKind::Success);
    assert_eq!(toast.message, "Location detected via IP: Berlin, Germany");
    assert!(notifier.get("location-sensor").is_none());
}

#[tokio::test]
async fn test_ip_failure_leaves_location_absent() {
    let server = MockServer::start();
    let ip_mock = server.mock(|when, then| {
        when.method(GET).path("/json/");
        then.status(429).body("Too Many Requests");
    });

    let notifier = Arc::new(ToastBoard::new());
    let provider = LocationProvider::new();
    let detector =
        LocationDetector::new(NoSensor, locator(&server), notifier.clone(), provider.clone());

    assert!(detector.detect().await.is_none());
    // 只嘗試一次
    assert!(detector.detect().await.is_none());
    assert_eq!(ip_mock.hits(), 1);

    assert!(provider.current().is_none());
    let toast = notifier.get("location-ip").unwrap();
    assert_eq!(toast.kind, NotificationKind::Error);
    assert_eq!(toast.message, "Failed to detect location");
}

#[tokio::test]
async fn test_ip_response_without_coordinates_is_a_failure() {
    let server = MockServer::start();
    let ip_mock = server.mock(|when, then| {
        when.method(GET).path("/json/");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({ "error": true, "reason": "RateLimited" }));
    });

    let notifier = Arc::new(ToastBoard::new());
    let provider = LocationProvider::new();
    let detector =
        LocationDetector::new(NoSensor, locator(&server), notifier.clone(), provider.clone());

    assert!(detector.detect().await.is_none());
    ip_mock.assert();
    assert!(provider.current().is_none());
    assert_eq!(
        notifier.get("location-ip").unwrap().kind,
        NotificationKind::Error
    );
}

#[tokio::test]
async fn test_sensor_fix_skips_ip_lookup() {
    let server = MockServer::start();
    let ip_mock = server.mock(|when, then| {
        when.method(GET).path("/json/");
        then.status(200).json_body(json!({}));
    });

    let notifier = Arc::new(ToastBoard::new());
    let provider = LocationProvider::new();
    let fix = Coordinate::new(40.7306, -73.9352);
    let detector = LocationDetector::new(
        FixedSensor::new(fix),
        locator(&server),
        notifier.clone(),
        provider.clone(),
    );

    let location = detector.detect().await.unwrap();
    assert_eq!(location.coordinate, fix);
    assert_eq!(location.source, LocationSource::Sensor);
    assert_eq!(ip_mock.hits(), 0);
    assert_eq!(
        notifier.get("location-sensor").unwrap().message,
        "Location detected successfully!"
    );
}
