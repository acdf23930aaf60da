use super::*;
use crate::dispatch::Status;
use crate::fixtures::{build_failing_manager, build_manager, build_seeded_manager};
use chrono::{SecondsFormat, Utc};
use serde_json::json;

fn envelope(body: &[u8]) -> Envelope {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn test_rest_ping() {
    // prepare
    let manager = build_manager();
    let routes = routes(&manager);

    // execute
    let res = warp::test::request().path("/ping").reply(&routes).await;

    // validate
    assert_eq!(200, res.status());
    assert_eq!(Envelope::success(), envelope(res.body()));
}

#[tokio::test]
async fn test_rest_submit_light() {
    // prepare
    let manager = build_seeded_manager().await;
    let routes = routes(&manager);

    // execute
    let res = warp::test::request()
        .method("PUT")
        .path("/submitLight")
        .json(&json!({"ID": "S1", "POSITION": "P1", "LUMINOSITY": 42.0, "TIME": 1700000000}))
        .reply(&routes)
        .await;

    // validate
    assert_eq!(200, res.status());
    assert_eq!(Status::Success, envelope(res.body()).status);
}

#[tokio::test]
async fn test_rest_inconsistent_position() {
    let manager = build_seeded_manager().await;
    let routes = routes(&manager);

    let res = warp::test::request()
        .method("PUT")
        .path("/submitTemperature")
        .json(&json!({"ID": "S1", "POSITION": "P2", "TEMPERATURE": 21.5, "TIME": 1700000000}))
        .reply(&routes)
        .await;

    assert_eq!(400, res.status());
    assert_eq!(
        Envelope::failure("Sensor S1 is registered at position P1. Got position P2"),
        envelope(res.body())
    );
}

#[tokio::test]
async fn test_rest_missing_field() {
    let manager = build_seeded_manager().await;
    let routes = routes(&manager);

    let res = warp::test::request()
        .method("PUT")
        .path("/submitLight")
        .json(&json!({"ID": "S1", "POSITION": "P1", "LUMINOSITY": 42.0}))
        .reply(&routes)
        .await;

    assert_eq!(400, res.status());
    assert_eq!(
        Envelope::failure("missing input field: TIME"),
        envelope(res.body())
    );
}

#[tokio::test]
async fn test_rest_invalid_json() {
    let manager = build_manager();
    let routes = routes(&manager);

    let res = warp::test::request()
        .method("POST")
        .path("/newPosition")
        .body("{ID: P1")
        .reply(&routes)
        .await;

    assert_eq!(400, res.status());
    assert_eq!(Status::Failure, envelope(res.body()).status);
}

#[tokio::test]
async fn test_rest_wrong_method() {
    let manager = build_manager();
    let routes = routes(&manager);

    let res = warp::test::request()
        .method("POST")
        .path("/deleteSensor")
        .json(&json!({"ID": "S1"}))
        .reply(&routes)
        .await;

    assert_eq!(405, res.status());
}

#[tokio::test]
async fn test_rest_topology_lifecycle() {
    // prepare
    let manager = build_manager();
    let routes = routes(&manager);
    let position = json!({"ID": "P1", "NAME": "Kitchen", "DESCRIPTION": "north window"});

    // execute
    let created = warp::test::request()
        .method("POST")
        .path("/newPosition")
        .json(&position)
        .reply(&routes)
        .await;
    let duplicate = warp::test::request()
        .method("POST")
        .path("/newPosition")
        .json(&position)
        .reply(&routes)
        .await;
    let sensor = warp::test::request()
        .method("POST")
        .path("/newSensor")
        .json(&json!({"ID": "S1", "POSITION": "P1", "IP": "10.0.0.1"}))
        .reply(&routes)
        .await;
    let moved = warp::test::request()
        .method("PATCH")
        .path("/updateSensorPosition")
        .json(&json!({"ID": "S1", "POSITION": "P9"}))
        .reply(&routes)
        .await;
    let deleted = warp::test::request()
        .method("DELETE")
        .path("/deletePlant")
        .json(&json!({"ID": "PL1"}))
        .reply(&routes)
        .await;

    // validate
    assert_eq!(200, created.status());
    assert_eq!(400, duplicate.status());
    assert_eq!(200, sensor.status());
    assert_eq!(400, moved.status());
    assert_eq!(200, deleted.status());
}

#[tokio::test]
async fn test_rest_store_failure() {
    let manager = build_failing_manager();
    let routes = routes(&manager);

    let res = warp::test::request()
        .method("DELETE")
        .path("/deleteSensor")
        .json(&json!({"ID": "S1"}))
        .reply(&routes)
        .await;

    assert_eq!(500, res.status());
    assert_eq!(Status::Failure, envelope(res.body()).status);
}

#[tokio::test]
async fn test_rest_get_sensors() {
    // prepare
    let manager = build_seeded_manager().await;
    let routes = routes(&manager);

    // execute
    let all = warp::test::request().path("/sensors").reply(&routes).await;
    let single = warp::test::request().path("/sensors?id=S1").reply(&routes).await;
    let unknown = warp::test::request().path("/sensors?id=S9").reply(&routes).await;

    // validate
    assert_eq!(200, all.status());
    let sensors: Vec<serde_json::Value> = serde_json::from_slice(all.body()).unwrap();
    assert_eq!(1, sensors.len());
    assert_eq!("P1", sensors[0]["position"]);
    let single: Vec<serde_json::Value> = serde_json::from_slice(single.body()).unwrap();
    assert_eq!("10.0.0.1", single[0]["ip"]);
    assert_eq!(b"[]", &unknown.body()[..]);
}

#[tokio::test]
async fn test_rest_get_positions_and_plants() {
    let manager = build_seeded_manager().await;
    let routes = routes(&manager);

    let positions = warp::test::request().path("/positions").reply(&routes).await;
    let plants = warp::test::request().path("/plants").reply(&routes).await;

    assert_eq!(200, positions.status());
    let positions: Vec<serde_json::Value> = serde_json::from_slice(positions.body()).unwrap();
    assert_eq!("Kitchen", positions[0]["name"]);
    assert_eq!(200, plants.status());
    assert_eq!(b"[]", &plants.body()[..]);
}

#[tokio::test]
async fn test_rest_get_readings() {
    // prepare
    let manager = build_seeded_manager().await;
    for value in [1.0, 2.0] {
        manager
            .submit_light_data("S1", "P1", value, Utc::now() - chrono::Duration::hours(1))
            .await
            .unwrap();
    }
    let routes = routes(&manager);
    let from = (Utc::now() - chrono::Duration::days(1)).to_rfc3339_opts(SecondsFormat::Secs, true);
    let until = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    // execute
    let light = warp::test::request()
        .path(&format!("/lightData?id=S1&from={}&until={}", from, until))
        .reply(&routes)
        .await;
    let temperature = warp::test::request()
        .path(&format!("/temperatureData?id=S1&from={}&until={}", from, until))
        .reply(&routes)
        .await;

    // validate
    assert_eq!(200, light.status());
    let readings: Vec<serde_json::Value> = serde_json::from_slice(light.body()).unwrap();
    assert_eq!(2, readings.len());
    assert_eq!("light", readings[0]["kind"]);
    assert_eq!(200, temperature.status());
    assert_eq!(b"[]", &temperature.body()[..]);
}

#[tokio::test]
async fn test_rest_invalid_reading_ranges() {
    let manager = build_seeded_manager().await;
    let routes = routes(&manager);

    let reversed = warp::test::request()
        .path("/lightData?id=S1&from=2024-01-02T00:00:00Z&until=2024-01-01T00:00:00Z")
        .reply(&routes)
        .await;
    let too_long = warp::test::request()
        .path("/lightData?id=S1&from=2024-01-01T00:00:00Z&until=2024-03-01T00:00:00Z")
        .reply(&routes)
        .await;
    let unknown = warp::test::request()
        .path("/lightData?id=S9&from=2024-01-01T00:00:00Z&until=2024-01-02T00:00:00Z")
        .reply(&routes)
        .await;

    assert_eq!(400, reversed.status());
    assert_eq!(400, too_long.status());
    assert_eq!(400, unknown.status());
    assert_eq!(
        Envelope::failure("Sensor S9 not found in db"),
        envelope(unknown.body())
    );
}

#[tokio::test]
async fn test_rest_body_limit() {
    // prepare
    let manager = build_seeded_manager().await;
    let routes = routes(&manager);
    let description = "x".repeat(8192);

    // execute
    let oversized = warp::test::request()
        .method("POST")
        .path("/newPosition")
        .json(&json!({"ID": "P2", "NAME": "Hall", "DESCRIPTION": description}))
        .reply(&routes)
        .await;
    let empty = warp::test::request()
        .method("DELETE")
        .path("/deleteSensor")
        .header("content-length", "0")
        .reply(&routes)
        .await;

    // validate
    assert_eq!(413, oversized.status());
    assert_eq!(400, empty.status());
    assert_eq!(Status::Failure, envelope(empty.body()).status);
}
