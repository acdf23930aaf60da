mod coap;
mod config;
mod dispatch;
mod error;
mod influx;
mod logging;
mod mqtt;
mod rest;

#[cfg(test)]
mod fixtures;

use config::{Config, StoreBackend};
use sprout_core::store::{EntityStore, MemoryStore};
use sprout_core::CommandManager;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
pub async fn main() {
    logging::init();

    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let store: Arc<dyn EntityStore> = match config.store() {
        StoreBackend::Influx(influx) => match influx::InfluxStore::new(influx) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                error!("Failed creating InfluxDB client: {}", e);
                std::process::exit(1);
            }
        },
        StoreBackend::Memory => {
            warn!("Using in-memory store, nothing is persisted");
            Arc::new(MemoryStore::new())
        }
    };
    let manager = CommandManager::new(store);
    info!(version = sprout_core::CORE_VERSION, "Starting sprout");

    let server_daemon = rest::dispatch_server(manager.clone(), config.server_port());
    let mqtt_loop = mqtt::dispatch_mqtt_loop(manager.clone(), config.clone());
    let coap_server = coap::dispatch_coap_server(manager.clone(), config.coap_bind());

    tokio::select! {
        _ = async { tokio::join!(server_daemon, mqtt_loop, coap_server) } => {}
        _ = tokio::signal::ctrl_c() => info!("Received SIGINT, shutting down"),
    }
}
