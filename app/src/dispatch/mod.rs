use serde::{Deserialize, Serialize};
use sprout_core::{CommandError, CommandKind, CommandManager};
use std::sync::Arc;
use tracing::{error, warn};


/// Result of one command, before any transport framing
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success,
    /// Payload was rejected before reaching the manager
    BadRequest(String),
    /// The manager refused the command
    Failure(String),
    /// The store failed, nothing can be said about the command
    Fault(String),
}

impl Outcome {
    pub fn envelope(&self) -> Envelope {
        match self {
            Outcome::Success => Envelope::success(),
            Outcome::BadRequest(msg) | Outcome::Failure(msg) | Outcome::Fault(msg) => {
                Envelope::failure(msg)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl Envelope {
    pub fn success() -> Self {
        Envelope {
            status: Status::Success,
            msg: None,
        }
    }

    pub fn failure(msg: &str) -> Self {
        Envelope {
            status: Status::Failure,
            msg: Some(msg.to_owned()),
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }
}

/// Decodes a raw payload, runs it through the manager and classifies
/// the result. Every transport funnels its commands through here.
pub async fn handle(manager: &Arc<CommandManager>, kind: CommandKind, payload: &[u8]) -> Outcome {
    let json: serde_json::Value = match serde_json::from_slice(payload) {
        Ok(json) => json,
        Err(e) => {
            warn!(command = kind.name(), "Invalid JSON: {}", e);
            return Outcome::BadRequest(format!("invalid JSON: {}", e));
        }
    };

    let command = match kind.decode(&json) {
        Ok(command) => command,
        Err(e) => {
            warn!(command = kind.name(), "{}", e);
            return Outcome::BadRequest(e.to_string());
        }
    };

    match manager.execute(command).await {
        Ok(()) => Outcome::Success,
        Err(e) => classify(kind, e),
    }
}

fn classify(kind: CommandKind, err: CommandError) -> Outcome {
    if err.is_domain() {
        warn!(command = kind.name(), "{}", err);
        Outcome::Failure(err.to_string())
    } else {
        error!(command = kind.name(), "{}", err);
        Outcome::Fault(err.to_string())
    }
}
