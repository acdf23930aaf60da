//! Store doubles shared by the test suites of this workspace

use crate::error::StoreError;
use crate::store::{EntityStore, Point};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Store that rejects every operation as unreachable
pub struct FailingStore;

fn unreachable() -> StoreError {
    StoreError::Unreachable("connection refused".to_owned())
}

#[async_trait]
impl EntityStore for FailingStore {
    async fn write(&self, _point: Point) -> Result<(), StoreError> {
        Err(unreachable())
    }

    async fn latest(
        &self,
        _measurement: &str,
        _key_tag: &str,
        _key: Option<&str>,
    ) -> Result<Vec<Point>, StoreError> {
        Err(unreachable())
    }

    async fn range(
        &self,
        _measurement: &str,
        _key_tag: &str,
        _key: &str,
        _from: DateTime<Utc>,
        _until: DateTime<Utc>,
    ) -> Result<Vec<Point>, StoreError> {
        Err(unreachable())
    }

    async fn delete(&self, _measurement: &str, _key_tag: &str, _key: &str) -> Result<(), StoreError> {
        Err(unreachable())
    }
}
