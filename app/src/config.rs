use crate::error::ConfigError;
use parking_lot::RwLock;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;


#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    Influx(InfluxConfig),
    Memory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfluxConfig {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
    pub timeout_ms: u64,
}

pub struct Config {
    inner: RwLock<InnerConfig>,
}

struct InnerConfig {
    store: StoreBackend,
    server_port: u16,
    mqtt_brokers: Vec<(String, u16)>,
    mqtt_index: usize,
    mqtt_client_id: String,
    mqtt_reconnect_ms: u64,
    coap_bind: SocketAddr,
}

impl Config {
    /// Reads the process environment, after loading `.env` if present
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_vars(|name| env::var(name).ok())
    }

    pub fn from_vars<F: Fn(&str) -> Option<String>>(var: F) -> Result<Self, ConfigError> {
        let store = match var("STORE_BACKEND").as_deref() {
            None | Some("influx") => StoreBackend::Influx(InfluxConfig {
                url: required(&var, "INFLUXDB_URL")?,
                token: required(&var, "INFLUXDB_TOKEN")?,
                org: required(&var, "INFLUXDB_ORG")?,
                bucket: required(&var, "INFLUXDB_BUCKET")?,
                timeout_ms: parsed(&var, "INFLUXDB_TIMEOUT_MS", 5000)?,
            }),
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "STORE_BACKEND",
                    value: other.to_owned(),
                })
            }
        };

        let mqtt_brokers = var("MQTT_BROKERS")
            .unwrap_or_else(|| "localhost:1883".to_owned())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_broker)
            .collect::<Result<Vec<_>, _>>()?;
        if mqtt_brokers.is_empty() {
            return Err(ConfigError::NoBroker);
        }

        let mqtt_client_id = var("MQTT_CLIENT_ID")
            .unwrap_or_else(|| format!("sprout-{}", uuid::Uuid::new_v4().simple()));

        Ok(Config {
            inner: RwLock::new(InnerConfig {
                store,
                server_port: parsed(&var, "SERVER_PORT", 5000)?,
                mqtt_brokers,
                mqtt_index: 0,
                mqtt_client_id,
                mqtt_reconnect_ms: parsed(&var, "MQTT_RECONNECT_MS", 3000)?,
                coap_bind: parsed(&var, "COAP_BIND", SocketAddr::from(([0, 0, 0, 0], 5683)))?,
            }),
        })
    }

    pub fn store(&self) -> StoreBackend {
        self.inner.read().store.clone()
    }

    pub fn server_port(&self) -> u16 {
        self.inner.read().server_port
    }

    pub fn current_mqtt_broker(&self) -> (String, u16) {
        let inner = self.inner.read();
        inner.mqtt_brokers[inner.mqtt_index].clone()
    }

    pub fn next_mqtt_broker(&self) -> (String, u16) {
        let mut inner = self.inner.write();
        inner.mqtt_index = (inner.mqtt_index + 1) % inner.mqtt_brokers.len();

        inner.mqtt_brokers[inner.mqtt_index].clone()
    }

    pub fn mqtt_client_id(&self) -> String {
        self.inner.read().mqtt_client_id.clone()
    }

    pub fn mqtt_reconnect_ms(&self) -> u64 {
        self.inner.read().mqtt_reconnect_ms
    }

    pub fn coap_bind(&self) -> SocketAddr {
        self.inner.read().coap_bind
    }
}

/*
 * Helpers
 */

fn required<F: Fn(&str) -> Option<String>>(var: &F, name: &'static str) -> Result<String, ConfigError> {
    var(name)
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parsed<F, T>(var: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match var(name) {
        None => Ok(default),
        Some(value) => match value.trim().parse() {
            Ok(parsed) => Ok(parsed),
            Err(_) => Err(ConfigError::Invalid { name, value }),
        },
    }
}

fn parse_broker(broker: &str) -> Result<(String, u16), ConfigError> {
    let invalid = || ConfigError::Invalid {
        name: "MQTT_BROKERS",
        value: broker.to_owned(),
    };
    let (host, port) = broker.rsplit_once(':').ok_or_else(invalid)?;
    if host.is_empty() {
        return Err(invalid());
    }
    let port = port.parse().map_err(|_| invalid())?;
    Ok((host.to_owned(), port))
}
