use super::{EntityStore, Point};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// In-process store, keeps every written point per measurement
#[derive(Default)]
pub struct MemoryStore {
    series: RwLock<HashMap<String, Vec<Point>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self, measurement: &str) -> usize {
        self.series
            .read()
            .get(measurement)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.series.read().values().all(Vec::is_empty)
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn write(&self, point: Point) -> Result<(), StoreError> {
        self.series
            .write()
            .entry(point.measurement.clone())
            .or_default()
            .push(point);
        Ok(())
    }

    async fn latest(
        &self,
        measurement: &str,
        key_tag: &str,
        key: Option<&str>,
    ) -> Result<Vec<Point>, StoreError> {
        let series = self.series.read();
        let points = match series.get(measurement) {
            Some(points) => points,
            None => return Ok(Vec::new()),
        };

        // later writes win ties, as points are kept in write order
        let mut latest: BTreeMap<&str, &Point> = BTreeMap::new();
        for point in points {
            let id = match point.tag_value(key_tag) {
                Some(id) => id,
                None => continue,
            };
            if key.map_or(false, |key| key != id) {
                continue;
            }
            match latest.get(id) {
                Some(current) if current.time > point.time => {}
                _ => {
                    latest.insert(id, point);
                }
            }
        }
        Ok(latest.into_values().cloned().collect())
    }

    async fn range(
        &self,
        measurement: &str,
        key_tag: &str,
        key: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Point>, StoreError> {
        let series = self.series.read();
        let mut matched: Vec<Point> = series
            .get(measurement)
            .map(|points| {
                points
                    .iter()
                    .filter(|p| p.tag_value(key_tag) == Some(key))
                    .filter(|p| p.time >= from && p.time < until)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        matched.sort_by_key(|p| p.time);
        Ok(matched)
    }

    async fn delete(&self, measurement: &str, key_tag: &str, key: &str) -> Result<(), StoreError> {
        if let Some(points) = self.series.write().get_mut(measurement) {
            points.retain(|p| p.tag_value(key_tag) != Some(key));
        }
        Ok(())
    }
}
