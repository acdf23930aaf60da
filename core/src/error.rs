use crate::topology::EntityKind;
use thiserror::Error;

/// Failures of the underlying entity store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unreachable: {0}")]
    Unreachable(String),
    #[error("Store rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("Malformed {measurement} record: {reason}")]
    Malformed {
        measurement: String,
        reason: String,
    },
}

/// Rejections raised before a command reaches the manager
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("missing input field: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("malformed input field {field}: {reason}")]
    Malformed { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{kind} {id} not found in db")]
    NotFound { kind: EntityKind, id: String },
    #[error("{kind} {id} already present in db")]
    AlreadyPresent { kind: EntityKind, id: String },
    #[error("Sensor {sensor} is registered at position {registered}. Got position {claimed}")]
    InconsistentPosition {
        sensor: String,
        registered: String,
        claimed: String,
    },
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl CommandError {
    pub fn not_found(kind: EntityKind, id: &str) -> Self {
        CommandError::NotFound {
            kind,
            id: id.to_owned(),
        }
    }

    pub fn already_present(kind: EntityKind, id: &str) -> Self {
        CommandError::AlreadyPresent {
            kind,
            id: id.to_owned(),
        }
    }

    /// Domain errors are answered with a failure envelope,
    /// everything else is a transport fault
    pub fn is_domain(&self) -> bool {
        !matches!(self, CommandError::Storage(_))
    }
}
