use crate::error::ValidationError;
use crate::reading::Reading;
use crate::topology::{Plant, Position, Sensor};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

/*
 * Transport visible field names
 */

pub const ID: &str = "ID";
pub const POSITION: &str = "POSITION";
pub const LUMINOSITY: &str = "LUMINOSITY";
pub const TEMPERATURE: &str = "TEMPERATURE";
pub const TIME: &str = "TIME";
pub const IP: &str = "IP";
pub const NAME: &str = "NAME";
pub const DESCRIPTION: &str = "DESCRIPTION";
pub const SENSOR: &str = "SENSOR";
pub const TYPE: &str = "TYPE";

// ~ year 2255, keeps the nanosecond conversion inside i64
const MAX_EPOCH_SECS: f64 = 9_000_000_000.0;

/// Request verb every transport maps its methods onto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Put,
    Post,
    Patch,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    SubmitLight,
    SubmitTemperature,
    NewSensor,
    UpdateSensorPosition,
    DeleteSensor,
    NewPosition,
    UpdatePositionData,
    DeletePosition,
    NewPlant,
    UpdatePlant,
    DeletePlant,
}

impl CommandKind {
    pub const ALL: [CommandKind; 11] = [
        CommandKind::SubmitLight,
        CommandKind::SubmitTemperature,
        CommandKind::NewSensor,
        CommandKind::UpdateSensorPosition,
        CommandKind::DeleteSensor,
        CommandKind::NewPosition,
        CommandKind::UpdatePositionData,
        CommandKind::DeletePosition,
        CommandKind::NewPlant,
        CommandKind::UpdatePlant,
        CommandKind::DeletePlant,
    ];

    /// Canonical name, also used as MQTT topic
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::SubmitLight => "submit_light_data",
            CommandKind::SubmitTemperature => "submit_temperature_data",
            CommandKind::NewSensor => "new_sensor",
            CommandKind::UpdateSensorPosition => "update_sensor_position",
            CommandKind::DeleteSensor => "delete_sensor",
            CommandKind::NewPosition => "new_position",
            CommandKind::UpdatePositionData => "update_position_data",
            CommandKind::DeletePosition => "delete_position",
            CommandKind::NewPlant => "new_plant",
            CommandKind::UpdatePlant => "update_plant",
            CommandKind::DeletePlant => "delete_plant",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    pub fn verb(&self) -> Verb {
        match self {
            CommandKind::SubmitLight | CommandKind::SubmitTemperature => Verb::Put,
            CommandKind::NewSensor | CommandKind::NewPosition | CommandKind::NewPlant => Verb::Post,
            CommandKind::UpdateSensorPosition
            | CommandKind::UpdatePositionData
            | CommandKind::UpdatePlant => Verb::Patch,
            CommandKind::DeleteSensor | CommandKind::DeletePosition | CommandKind::DeletePlant => {
                Verb::Delete
            }
        }
    }

    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            CommandKind::SubmitLight => &[ID, POSITION, LUMINOSITY, TIME],
            CommandKind::SubmitTemperature => &[ID, POSITION, TEMPERATURE, TIME],
            CommandKind::NewSensor => &[ID, POSITION, IP],
            CommandKind::UpdateSensorPosition => &[ID, POSITION],
            CommandKind::NewPosition | CommandKind::UpdatePositionData => &[ID, NAME, DESCRIPTION],
            CommandKind::NewPlant | CommandKind::UpdatePlant => {
                &[ID, NAME, DESCRIPTION, SENSOR, TYPE]
            }
            CommandKind::DeleteSensor | CommandKind::DeletePosition | CommandKind::DeletePlant => {
                &[ID]
            }
        }
    }

    /// Presence-checks and converts a decoded payload into a typed command
    pub fn decode(&self, payload: &Value) -> Result<Command, ValidationError> {
        let fields = payload.as_object().ok_or(ValidationError::NotAnObject)?;

        let missing: Vec<&'static str> = self
            .required_fields()
            .iter()
            .copied()
            .filter(|name| !fields.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::Missing(missing));
        }

        let command = match self {
            CommandKind::SubmitLight => Command::SubmitLight(Reading::light(
                key(fields, ID)?,
                key(fields, POSITION)?,
                number(fields, LUMINOSITY)?,
                timestamp(fields, TIME)?,
            )),
            CommandKind::SubmitTemperature => Command::SubmitTemperature(Reading::temperature(
                key(fields, ID)?,
                key(fields, POSITION)?,
                number(fields, TEMPERATURE)?,
                timestamp(fields, TIME)?,
            )),
            CommandKind::NewSensor => Command::NewSensor(Sensor {
                id: key(fields, ID)?.to_owned(),
                position: key(fields, POSITION)?.to_owned(),
                ip: text(fields, IP)?.to_owned(),
            }),
            CommandKind::UpdateSensorPosition => Command::UpdateSensorPosition {
                id: key(fields, ID)?.to_owned(),
                position: key(fields, POSITION)?.to_owned(),
            },
            CommandKind::DeleteSensor => Command::DeleteSensor {
                id: key(fields, ID)?.to_owned(),
            },
            CommandKind::NewPosition => Command::NewPosition(position(fields)?),
            CommandKind::UpdatePositionData => Command::UpdatePositionData(position(fields)?),
            CommandKind::DeletePosition => Command::DeletePosition {
                id: key(fields, ID)?.to_owned(),
            },
            CommandKind::NewPlant => Command::NewPlant(plant(fields)?),
            CommandKind::UpdatePlant => Command::UpdatePlant(plant(fields)?),
            CommandKind::DeletePlant => Command::DeletePlant {
                id: key(fields, ID)?.to_owned(),
            },
        };
        Ok(command)
    }
}

/// Canonical, transport independent command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SubmitLight(Reading),
    SubmitTemperature(Reading),
    NewSensor(Sensor),
    UpdateSensorPosition { id: String, position: String },
    DeleteSensor { id: String },
    NewPosition(Position),
    UpdatePositionData(Position),
    DeletePosition { id: String },
    NewPlant(Plant),
    UpdatePlant(Plant),
    DeletePlant { id: String },
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::SubmitLight(_) => CommandKind::SubmitLight,
            Command::SubmitTemperature(_) => CommandKind::SubmitTemperature,
            Command::NewSensor(_) => CommandKind::NewSensor,
            Command::UpdateSensorPosition { .. } => CommandKind::UpdateSensorPosition,
            Command::DeleteSensor { .. } => CommandKind::DeleteSensor,
            Command::NewPosition(_) => CommandKind::NewPosition,
            Command::UpdatePositionData(_) => CommandKind::UpdatePositionData,
            Command::DeletePosition { .. } => CommandKind::DeletePosition,
            Command::NewPlant(_) => CommandKind::NewPlant,
            Command::UpdatePlant(_) => CommandKind::UpdatePlant,
            Command::DeletePlant { .. } => CommandKind::DeletePlant,
        }
    }
}

/*
 * Helpers
 */

fn text<'a>(fields: &'a Map<String, Value>, name: &'static str) -> Result<&'a str, ValidationError> {
    let value = fields
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::Malformed {
            field: name,
            reason: "expected a string".to_owned(),
        })?;
    if value.contains(['\n', '\r']) {
        return Err(ValidationError::Malformed {
            field: name,
            reason: "must not contain line breaks".to_owned(),
        });
    }
    Ok(value)
}

/// Identifier fields, they end up as store tags and must be non-empty
fn key<'a>(fields: &'a Map<String, Value>, name: &'static str) -> Result<&'a str, ValidationError> {
    let value = text(fields, name)?;
    if value.is_empty() {
        return Err(ValidationError::Malformed {
            field: name,
            reason: "must not be empty".to_owned(),
        });
    }
    Ok(value)
}

fn number(fields: &Map<String, Value>, name: &'static str) -> Result<f64, ValidationError> {
    fields
        .get(name)
        .and_then(Value::as_f64)
        .ok_or_else(|| ValidationError::Malformed {
            field: name,
            reason: "expected a number".to_owned(),
        })
}

/// Epoch seconds, fractions allowed
fn timestamp(fields: &Map<String, Value>, name: &'static str) -> Result<DateTime<Utc>, ValidationError> {
    let secs = number(fields, name)?;
    if !secs.is_finite() || secs.abs() > MAX_EPOCH_SECS {
        return Err(ValidationError::Malformed {
            field: name,
            reason: format!("timestamp {} out of range", secs),
        });
    }
    Ok(Utc.timestamp_nanos((secs * 1e9).round() as i64))
}

fn position(fields: &Map<String, Value>) -> Result<Position, ValidationError> {
    Ok(Position {
        id: key(fields, ID)?.to_owned(),
        name: text(fields, NAME)?.to_owned(),
        description: text(fields, DESCRIPTION)?.to_owned(),
    })
}

fn plant(fields: &Map<String, Value>) -> Result<Plant, ValidationError> {
    Ok(Plant {
        id: key(fields, ID)?.to_owned(),
        name: text(fields, NAME)?.to_owned(),
        description: text(fields, DESCRIPTION)?.to_owned(),
        kind: text(fields, TYPE)?.to_owned(),
        sensor: key(fields, SENSOR)?.to_owned(),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_names_round_trip() {
        for kind in CommandKind::ALL {
            assert_eq!(Some(kind), CommandKind::from_name(kind.name()));
        }
        assert_eq!(None, CommandKind::from_name("submit_humidity_data"));
    }

    #[test]
    fn test_decode_light_reading() {
        let payload = json!({"ID": "S1", "POSITION": "P1", "LUMINOSITY": 42.0, "TIME": 1000.5});

        let command = CommandKind::SubmitLight.decode(&payload).unwrap();

        match command {
            Command::SubmitLight(reading) => {
                assert_eq!("S1", reading.sensor_id);
                assert_eq!("P1", reading.position);
                assert_eq!(42.0, reading.value);
                assert_eq!(1000, reading.timestamp.timestamp());
                assert_eq!(500, reading.timestamp.timestamp_subsec_millis());
            }
            other => panic!("Unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_decode_integer_values() {
        let payload = json!({"ID": "S1", "POSITION": "P1", "TEMPERATURE": 21, "TIME": 1000});
        assert!(CommandKind::SubmitTemperature.decode(&payload).is_ok());
    }

    #[test]
    fn test_decode_reports_all_missing_fields() {
        let payload = json!({"ID": "PL1", "NAME": "Fern"});

        let err = CommandKind::NewPlant.decode(&payload).unwrap_err();

        assert_eq!(
            ValidationError::Missing(vec![DESCRIPTION, SENSOR, TYPE]),
            err
        );
    }

    #[test]
    fn test_decode_field_names_are_case_sensitive() {
        let payload = json!({"id": "S1"});
        assert_eq!(
            Err(ValidationError::Missing(vec![ID])),
            CommandKind::DeleteSensor.decode(&payload)
        );
    }

    #[test]
    fn test_decode_rejects_non_object() {
        let payload = json!(["ID", "S1"]);
        assert_eq!(
            Err(ValidationError::NotAnObject),
            CommandKind::DeletePlant.decode(&payload)
        );
    }

    #[test]
    fn test_decode_rejects_wrong_types() {
        let payload = json!({"ID": 7, "POSITION": "P1", "IP": "10.0.0.1"});
        assert!(matches!(
            CommandKind::NewSensor.decode(&payload),
            Err(ValidationError::Malformed { field: ID, .. })
        ));

        let payload = json!({"ID": "S1", "POSITION": "P1", "LUMINOSITY": "bright", "TIME": 1});
        assert!(matches!(
            CommandKind::SubmitLight.decode(&payload),
            Err(ValidationError::Malformed { field: LUMINOSITY, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_empty_identifiers() {
        let payload = json!({"ID": "", "NAME": "Room1", "DESCRIPTION": "d"});
        assert!(matches!(
            CommandKind::NewPosition.decode(&payload),
            Err(ValidationError::Malformed { field: ID, .. })
        ));

        let payload = json!({"ID": "S1", "POSITION": ""});
        assert!(matches!(
            CommandKind::UpdateSensorPosition.decode(&payload),
            Err(ValidationError::Malformed { field: POSITION, .. })
        ));

        let payload = json!({"ID": "PL1", "NAME": "Fern", "DESCRIPTION": "", "SENSOR": "", "TYPE": "shade"});
        assert!(matches!(
            CommandKind::NewPlant.decode(&payload),
            Err(ValidationError::Malformed { field: SENSOR, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_line_breaks() {
        let payload = json!({"ID": "P1", "NAME": "Room1", "DESCRIPTION": "first\nsecond"});
        assert!(matches!(
            CommandKind::UpdatePositionData.decode(&payload),
            Err(ValidationError::Malformed { field: DESCRIPTION, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_out_of_range_time() {
        let payload = json!({"ID": "S1", "POSITION": "P1", "LUMINOSITY": 1.0, "TIME": 1e300});
        assert!(matches!(
            CommandKind::SubmitLight.decode(&payload),
            Err(ValidationError::Malformed { field: TIME, .. })
        ));
    }

    #[test]
    fn test_decode_ignores_extra_fields() {
        let payload = json!({"ID": "P1", "NAME": "Room1", "DESCRIPTION": "d", "FLOOR": 2});
        let command = CommandKind::NewPosition.decode(&payload).unwrap();
        assert_eq!(CommandKind::NewPosition, command.kind());
    }
}
