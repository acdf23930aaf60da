use crate::error::StoreError;
use crate::store::Point;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Sensor,
    Position,
    Plant,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EntityKind::Sensor => write!(f, "Sensor"),
            EntityKind::Position => write!(f, "Position"),
            EntityKind::Plant => write!(f, "Plant"),
        }
    }
}

/// A latest-value record of the topology model.
///
/// Every kind lives in its own measurement and is keyed by a single tag,
/// all remaining attributes are stored as string fields.
pub trait Entity: Sized + Send + Sync {
    const KIND: EntityKind;
    const MEASUREMENT: &'static str;
    const KEY_TAG: &'static str;

    fn id(&self) -> &str;

    fn to_point(&self, time: DateTime<Utc>) -> Point;

    fn from_point(point: &Point) -> Result<Self, StoreError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: String,
    pub position: String,
    pub ip: String,
}

impl Entity for Sensor {
    const KIND: EntityKind = EntityKind::Sensor;
    const MEASUREMENT: &'static str = "device";
    const KEY_TAG: &'static str = "deviceId";

    fn id(&self) -> &str {
        &self.id
    }

    fn to_point(&self, time: DateTime<Utc>) -> Point {
        Point::new(Self::MEASUREMENT, time)
            .tag(Self::KEY_TAG, &self.id)
            .field("ip", self.ip.as_str())
            .field("position", self.position.as_str())
    }

    fn from_point(point: &Point) -> Result<Self, StoreError> {
        Ok(Sensor {
            id: point.required(Self::KEY_TAG)?,
            position: point.required("position")?,
            ip: point.required("ip")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl Entity for Position {
    const KIND: EntityKind = EntityKind::Position;
    const MEASUREMENT: &'static str = "position";
    const KEY_TAG: &'static str = "positionId";

    fn id(&self) -> &str {
        &self.id
    }

    fn to_point(&self, time: DateTime<Utc>) -> Point {
        Point::new(Self::MEASUREMENT, time)
            .tag(Self::KEY_TAG, &self.id)
            .field("name", self.name.as_str())
            .field("description", self.description.as_str())
    }

    fn from_point(point: &Point) -> Result<Self, StoreError> {
        Ok(Position {
            id: point.required(Self::KEY_TAG)?,
            name: point.required("name")?,
            description: point.required("description")?,
        })
    }
}

/// `sensor` is a loose reference, nothing checks it against the sensors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sensor: String,
}

impl Entity for Plant {
    const KIND: EntityKind = EntityKind::Plant;
    const MEASUREMENT: &'static str = "plant";
    const KEY_TAG: &'static str = "plantId";

    fn id(&self) -> &str {
        &self.id
    }

    fn to_point(&self, time: DateTime<Utc>) -> Point {
        Point::new(Self::MEASUREMENT, time)
            .tag(Self::KEY_TAG, &self.id)
            .field("name", self.name.as_str())
            .field("description", self.description.as_str())
            .field("sensor", self.sensor.as_str())
            .field("type", self.kind.as_str())
    }

    fn from_point(point: &Point) -> Result<Self, StoreError> {
        Ok(Plant {
            id: point.required(Self::KEY_TAG)?,
            name: point.required("name")?,
            description: point.required("description")?,
            kind: point.required("type")?,
            sensor: point.required("sensor")?,
        })
    }
}
