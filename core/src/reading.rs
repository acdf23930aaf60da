use crate::error::StoreError;
use crate::store::Point;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const SENSOR_TAG: &str = "device";
pub const POSITION_TAG: &str = "position";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingKind {
    Light,
    Temperature,
}

impl ReadingKind {
    pub fn measurement(&self) -> &'static str {
        match self {
            ReadingKind::Light => "Light_data",
            ReadingKind::Temperature => "Temperature_data",
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            ReadingKind::Light => "light",
            ReadingKind::Temperature => "temperature",
        }
    }
}

/// Timestamped measurement of a sensor at its claimed position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub kind: ReadingKind,
    pub sensor_id: String,
    pub position: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

impl Reading {
    pub fn light(sensor_id: &str, position: &str, luminosity: f64, timestamp: DateTime<Utc>) -> Self {
        Reading {
            kind: ReadingKind::Light,
            sensor_id: sensor_id.to_owned(),
            position: position.to_owned(),
            value: luminosity,
            timestamp,
        }
    }

    pub fn temperature(
        sensor_id: &str,
        position: &str,
        temperature: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Reading {
            kind: ReadingKind::Temperature,
            sensor_id: sensor_id.to_owned(),
            position: position.to_owned(),
            value: temperature,
            timestamp,
        }
    }

    pub fn to_point(&self) -> Point {
        Point::new(self.kind.measurement(), self.timestamp)
            .tag(SENSOR_TAG, &self.sensor_id)
            .tag(POSITION_TAG, &self.position)
            .field(self.kind.field(), self.value)
    }

    pub fn from_point(kind: ReadingKind, point: &Point) -> Result<Self, StoreError> {
        let value = point
            .float(kind.field())
            .ok_or_else(|| StoreError::Malformed {
                measurement: point.measurement.clone(),
                reason: format!("missing numeric {}", kind.field()),
            })?;
        Ok(Reading {
            kind,
            sensor_id: point.required(SENSOR_TAG)?,
            position: point.required(POSITION_TAG)?,
            value,
            timestamp: point.time,
        })
    }
}
