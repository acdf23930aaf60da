use super::*;
use chrono::{Duration, TimeZone};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

#[tokio::test]
async fn test_latest_wins_per_key() {
    // prepare
    let store = MemoryStore::new();
    store
        .write(Point::new("device", at(10)).tag("deviceId", "S1").field("ip", "1"))
        .await
        .unwrap();
    store
        .write(Point::new("device", at(20)).tag("deviceId", "S1").field("ip", "2"))
        .await
        .unwrap();
    store
        .write(Point::new("device", at(5)).tag("deviceId", "S2").field("ip", "3"))
        .await
        .unwrap();

    // execute
    let all = store.latest("device", "deviceId", None).await.unwrap();
    let single = store.latest("device", "deviceId", Some("S1")).await.unwrap();

    // validate
    assert_eq!(2, all.len());
    assert_eq!(1, single.len());
    assert_eq!(Some("2"), single[0].text("ip"));
}

#[tokio::test]
async fn test_latest_tie_resolved_by_write_order() {
    let store = MemoryStore::new();
    for ip in ["first", "second"] {
        store
            .write(Point::new("device", at(10)).tag("deviceId", "S1").field("ip", ip))
            .await
            .unwrap();
    }

    let latest = store.latest("device", "deviceId", Some("S1")).await.unwrap();
    assert_eq!(Some("second"), latest[0].text("ip"));
}

#[tokio::test]
async fn test_latest_unknown_measurement() {
    let store = MemoryStore::new();
    let res = store.latest("plant", "plantId", Some("PL1")).await.unwrap();
    assert!(res.is_empty());
}

#[tokio::test]
async fn test_range_is_half_open_and_sorted() {
    // prepare
    let store = MemoryStore::new();
    for secs in [30, 10, 20, 40] {
        store
            .write(
                Point::new("Light_data", at(secs))
                    .tag("device", "S1")
                    .field("light", secs as f64),
            )
            .await
            .unwrap();
    }
    store
        .write(Point::new("Light_data", at(15)).tag("device", "S2").field("light", 1.0))
        .await
        .unwrap();

    // execute
    let res = store
        .range("Light_data", "device", "S1", at(10), at(10) + Duration::seconds(30))
        .await
        .unwrap();

    // validate
    let values: Vec<f64> = res.iter().filter_map(|p| p.float("light")).collect();
    assert_eq!(vec![10.0, 20.0, 30.0], values);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let store = MemoryStore::new();
    store
        .write(Point::new("position", at(1)).tag("positionId", "P1"))
        .await
        .unwrap();
    store
        .write(Point::new("position", at(2)).tag("positionId", "P2"))
        .await
        .unwrap();

    for _ in 0..2 {
        store.delete("position", "positionId", "P1").await.unwrap();
    }
    store.delete("plant", "plantId", "never").await.unwrap();

    assert_eq!(1, store.len("position"));
    assert!(store
        .latest("position", "positionId", Some("P1"))
        .await
        .unwrap()
        .is_empty());
}
