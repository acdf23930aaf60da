use sprout_core::error::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
    #[error("No MQTT-Brokers provided")]
    NoBroker,
}

#[derive(Debug, Error)]
pub enum MQTTError {
    #[error("Invalid Path: {0}")]
    Path(std::string::String),
    #[error("Send Failed: {0}")]
    Send(#[from] rumqttc::ClientError),
}

#[derive(Debug, Error)]
pub enum CoapError {
    #[error("Malformed packet: {0}")]
    Packet(std::string::String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<coap_lite::error::MessageError> for CoapError {
    fn from(err: coap_lite::error::MessageError) -> Self {
        CoapError::Packet(format!("{:?}", err))
    }
}

/// Failures talking to the InfluxDB HTTP API, folded into `StoreError`
#[derive(Debug, Error)]
pub enum InfluxError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("InfluxDB answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Unreadable CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Unreadable {column} value: {value}")]
    Column { column: String, value: String },
}

impl From<InfluxError> for StoreError {
    fn from(err: InfluxError) -> Self {
        match err {
            InfluxError::Http(e) => StoreError::Unreachable(e.to_string()),
            InfluxError::Status { status, body } => StoreError::Rejected { status, body },
            InfluxError::Csv(e) => StoreError::Malformed {
                measurement: "query".to_owned(),
                reason: e.to_string(),
            },
            InfluxError::Column { column, value } => StoreError::Malformed {
                measurement: "query".to_owned(),
                reason: format!("unreadable {} value: {}", column, value),
            },
        }
    }
}
