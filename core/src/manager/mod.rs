use crate::command::Command;
use crate::error::CommandError;
use crate::reading::{Reading, ReadingKind};
use crate::repository::TopologyRepository;
use crate::store::EntityStore;
use crate::topology::{Entity, EntityKind, Plant, Position, Sensor};
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, info};


/// Validates and executes topology commands.
///
/// Every operation checks all of its preconditions before the first
/// write, so a failed command leaves no trace in the store. There are
/// no cross-operation transactions: a concurrent delete between check
/// and write is only noticed by the store itself.
pub struct CommandManager {
    topology: TopologyRepository,
}

impl Debug for CommandManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandManager").finish()
    }
}

impl CommandManager {
    pub fn new(store: Arc<dyn EntityStore>) -> Arc<Self> {
        Arc::new(CommandManager {
            topology: TopologyRepository::new(store),
        })
    }

    /// Single entry point for every transport
    pub async fn execute(&self, command: Command) -> Result<(), CommandError> {
        match command {
            Command::SubmitLight(reading) | Command::SubmitTemperature(reading) => {
                self.submit_reading(reading).await
            }
            Command::NewSensor(sensor) => self.new_sensor(sensor).await,
            Command::UpdateSensorPosition { id, position } => {
                self.update_sensor_position(&id, &position).await
            }
            Command::DeleteSensor { id } => self.delete_sensor(&id).await,
            Command::NewPosition(position) => self.new_position(position).await,
            Command::UpdatePositionData(position) => self.update_position_data(position).await,
            Command::DeletePosition { id } => self.delete_position(&id).await,
            Command::NewPlant(plant) => self.new_plant(plant).await,
            Command::UpdatePlant(plant) => self.update_plant(plant).await,
            Command::DeletePlant { id } => self.delete_plant(&id).await,
        }
    }

    pub async fn submit_light_data(
        &self,
        id: &str,
        position: &str,
        luminosity: f64,
        time: DateTime<Utc>,
    ) -> Result<(), CommandError> {
        self.submit_reading(Reading::light(id, position, luminosity, time))
            .await
    }

    pub async fn submit_temperature_data(
        &self,
        id: &str,
        position: &str,
        temperature: f64,
        time: DateTime<Utc>,
    ) -> Result<(), CommandError> {
        self.submit_reading(Reading::temperature(id, position, temperature, time))
            .await
    }

    #[tracing::instrument(skip(self, reading), fields(sensor_id = %reading.sensor_id, kind = ?reading.kind))]
    async fn submit_reading(&self, reading: Reading) -> Result<(), CommandError> {
        let sensor = self
            .topology
            .find::<Sensor>(&reading.sensor_id)
            .await?
            .ok_or_else(|| CommandError::not_found(EntityKind::Sensor, &reading.sensor_id))?;

        if sensor.position != reading.position {
            return Err(CommandError::InconsistentPosition {
                sensor: sensor.id,
                registered: sensor.position,
                claimed: reading.position,
            });
        }

        self.topology.append_reading(&reading).await?;
        debug!("Stored reading");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn new_sensor(&self, sensor: Sensor) -> Result<(), CommandError> {
        self.ensure_absent::<Sensor>(&sensor.id).await?;
        self.ensure_present::<Position>(&sensor.position).await?;

        self.topology.create(&sensor).await?;
        info!(sensor_id = %sensor.id, "Registered new sensor");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_sensor_position(&self, id: &str, position: &str) -> Result<(), CommandError> {
        let sensor = self
            .topology
            .find::<Sensor>(id)
            .await?
            .ok_or_else(|| CommandError::not_found(EntityKind::Sensor, id))?;
        self.ensure_present::<Position>(position).await?;

        let moved = Sensor {
            position: position.to_owned(),
            ..sensor
        };
        self.topology.update(&moved).await?;
        info!(sensor_id = %id, "Moved sensor");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_sensor(&self, id: &str) -> Result<(), CommandError> {
        self.topology.delete::<Sensor>(id).await?;
        info!(sensor_id = %id, "Removed sensor");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn new_position(&self, position: Position) -> Result<(), CommandError> {
        self.ensure_absent::<Position>(&position.id).await?;

        self.topology.create(&position).await?;
        info!(position_id = %position.id, "Registered new position");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_position_data(&self, position: Position) -> Result<(), CommandError> {
        self.ensure_present::<Position>(&position.id).await?;

        self.topology.update(&position).await?;
        info!(position_id = %position.id, "Updated position");
        Ok(())
    }

    /// Sensors still referencing the position are left untouched
    #[tracing::instrument(skip(self))]
    pub async fn delete_position(&self, id: &str) -> Result<(), CommandError> {
        self.topology.delete::<Position>(id).await?;
        info!(position_id = %id, "Removed position");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn new_plant(&self, plant: Plant) -> Result<(), CommandError> {
        self.ensure_absent::<Plant>(&plant.id).await?;

        self.topology.create(&plant).await?;
        info!(plant_id = %plant.id, "Registered new plant");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_plant(&self, plant: Plant) -> Result<(), CommandError> {
        self.ensure_present::<Plant>(&plant.id).await?;

        self.topology.update(&plant).await?;
        info!(plant_id = %plant.id, "Updated plant");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_plant(&self, id: &str) -> Result<(), CommandError> {
        self.topology.delete::<Plant>(id).await?;
        info!(plant_id = %id, "Removed plant");
        Ok(())
    }

    /*
     * Queries
     */

    pub async fn sensors(&self, id: Option<&str>) -> Result<Vec<Sensor>, CommandError> {
        Ok(self.topology.get(id).await?)
    }

    pub async fn positions(&self, id: Option<&str>) -> Result<Vec<Position>, CommandError> {
        Ok(self.topology.get(id).await?)
    }

    pub async fn plants(&self, id: Option<&str>) -> Result<Vec<Plant>, CommandError> {
        Ok(self.topology.get(id).await?)
    }

    /// Readings of a currently registered sensor within `[from, until)`
    pub async fn readings(
        &self,
        kind: ReadingKind,
        sensor_id: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Reading>, CommandError> {
        self.ensure_present::<Sensor>(sensor_id).await?;
        Ok(self
            .topology
            .readings(kind, sensor_id, from, until)
            .await?)
    }

    /*
     * Helpers
     */

    async fn ensure_absent<E: Entity>(&self, id: &str) -> Result<(), CommandError> {
        if self.topology.exists::<E>(id).await? {
            return Err(CommandError::already_present(E::KIND, id));
        }
        Ok(())
    }

    async fn ensure_present<E: Entity>(&self, id: &str) -> Result<(), CommandError> {
        if !self.topology.exists::<E>(id).await? {
            return Err(CommandError::not_found(E::KIND, id));
        }
        Ok(())
    }
}
