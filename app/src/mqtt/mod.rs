use crate::config::Config;
use crate::dispatch::{self, Outcome};
use crate::error::MQTTError;
use crate::logging;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, Publish, QoS, SubscribeFilter};
use sprout_core::{CommandKind, CommandManager};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn, Instrument};


const QOS: QoS = QoS::AtLeastOnce;
const RESPONSE_SUFFIX: &str = "response";

/// Connects to the current broker and feeds every command message
/// through the dispatcher. On connection errors the next configured
/// broker is tried. Never returns.
pub async fn dispatch_mqtt_loop(manager: Arc<CommandManager>, config: Arc<Config>) {
    let mut broker = config.current_mqtt_broker();
    loop {
        let (client, mut eventloop) = build_client(&config, &broker);
        info!(host = %broker.0, port = broker.1, "Connecting to MQTT broker");

        if let Err(e) = run_eventloop(&manager, &client, &mut eventloop).await {
            warn!(host = %broker.0, "MQTT connection failed: {}", e);
        }

        tokio::time::sleep(Duration::from_millis(config.mqtt_reconnect_ms())).await;
        broker = config.next_mqtt_broker();
    }
}

/// Decodes a message on a command topic and runs it
pub async fn on_command_message(
    manager: &Arc<CommandManager>,
    topic: &str,
    payload: &[u8],
) -> Result<Outcome, MQTTError> {
    let kind = CommandKind::from_name(topic)
        .ok_or_else(|| MQTTError::Path(format!("Unknown topic: {}", topic)))?;
    Ok(dispatch::handle(manager, kind, payload).await)
}

/// Topic and body of the reply, faults are not answered
pub fn build_response(topic: &str, outcome: &Outcome) -> Option<(String, Vec<u8>)> {
    match outcome {
        Outcome::Fault(_) => None,
        _ => Some((
            format!("{}/{}", topic, RESPONSE_SUFFIX),
            outcome.envelope().to_vec(),
        )),
    }
}

pub fn command_topics() -> Vec<SubscribeFilter> {
    CommandKind::ALL
        .iter()
        .map(|kind| SubscribeFilter::new(kind.name().to_owned(), QOS))
        .collect()
}

/*
 * Helpers
 */

fn build_client(config: &Config, broker: &(String, u16)) -> (AsyncClient, EventLoop) {
    let mut options = MqttOptions::new(config.mqtt_client_id(), broker.0.clone(), broker.1);
    options.set_keep_alive(Duration::from_secs(5));
    options.set_clean_session(true);
    AsyncClient::new(options, 64)
}

async fn run_eventloop(
    manager: &Arc<CommandManager>,
    client: &AsyncClient,
    eventloop: &mut EventLoop,
) -> Result<(), rumqttc::ConnectionError> {
    loop {
        match eventloop.poll().await? {
            Event::Incoming(Packet::ConnAck(_)) => {
                // sessions are clean, subscriptions are renewed on every connect
                match client.subscribe_many(command_topics()).await {
                    Ok(()) => info!("Subscribed command topics"),
                    Err(e) => error!("{}", MQTTError::from(e)),
                }
            }
            Event::Incoming(Packet::Publish(publish)) => {
                let span = logging::request_span("mqtt", &publish.topic);
                tokio::spawn(on_publish(manager.clone(), client.clone(), publish).instrument(span));
            }
            _ => {}
        }
    }
}

async fn on_publish(manager: Arc<CommandManager>, client: AsyncClient, publish: Publish) {
    debug!(topic = %publish.topic, "Received message");
    let outcome = match on_command_message(&manager, &publish.topic, &publish.payload).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("Received message threw error: {}", e);
            return;
        }
    };

    let (topic, body) = match build_response(&publish.topic, &outcome) {
        Some(response) => response,
        None => {
            error!(topic = %publish.topic, "Dropped message after store failure");
            return;
        }
    };
    if let Err(e) = client.publish(topic, QOS, false, body).await {
        error!("{}", MQTTError::from(e));
    }
}
