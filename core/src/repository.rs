use crate::error::StoreError;
use crate::reading::{Reading, ReadingKind, SENSOR_TAG};
use crate::store::EntityStore;
use crate::topology::Entity;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Typed get/create/update/delete over the entity store
#[derive(Clone)]
pub struct TopologyRepository {
    store: Arc<dyn EntityStore>,
}

impl TopologyRepository {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        TopologyRepository { store }
    }

    /// Latest record of `id`, or every latest record if `id` is `None`
    pub async fn get<E: Entity>(&self, id: Option<&str>) -> Result<Vec<E>, StoreError> {
        let points = self
            .store
            .latest(E::MEASUREMENT, E::KEY_TAG, id)
            .await?;
        points.iter().map(E::from_point).collect()
    }

    pub async fn find<E: Entity>(&self, id: &str) -> Result<Option<E>, StoreError> {
        Ok(self.get::<E>(Some(id)).await?.pop())
    }

    pub async fn exists<E: Entity>(&self, id: &str) -> Result<bool, StoreError> {
        Ok(!self.get::<E>(Some(id)).await?.is_empty())
    }

    pub async fn create<E: Entity>(&self, entity: &E) -> Result<(), StoreError> {
        self.store.write(entity.to_point(Utc::now())).await
    }

    /// Full overwrite, identical to `create`
    pub async fn update<E: Entity>(&self, entity: &E) -> Result<(), StoreError> {
        self.create(entity).await
    }

    pub async fn delete<E: Entity>(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(E::MEASUREMENT, E::KEY_TAG, id).await
    }

    pub async fn append_reading(&self, reading: &Reading) -> Result<(), StoreError> {
        self.store.write(reading.to_point()).await
    }

    pub async fn readings(
        &self,
        kind: ReadingKind,
        sensor_id: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Reading>, StoreError> {
        let points = self
            .store
            .range(kind.measurement(), SENSOR_TAG, sensor_id, from, until)
            .await?;
        points
            .iter()
            .map(|point| Reading::from_point(kind, point))
            .collect()
    }
}
