use crate::dispatch::{self, Envelope, Outcome};
use crate::error::CoapError;
use crate::logging;
use coap_lite::{CoapRequest, ContentFormat, Packet, RequestType, ResponseType};
use sprout_core::{CommandKind, CommandManager, Verb};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{debug, error, info, warn, Instrument};


// largest UDP payload
const MAX_DATAGRAM: usize = 65_535;
const PING: &str = "ping";

/// Receives datagrams until the process ends, each one is handled
/// in its own task
pub async fn dispatch_coap_server(manager: Arc<CommandManager>, bind: SocketAddr) {
    let socket = match bind_socket(bind).await {
        Ok(socket) => socket,
        Err(e) => {
            error!(%bind, "Failed starting CoAP server: {}", e);
            return;
        }
    };
    info!(%bind, "Starting CoAP server");
    serve(manager, Arc::new(socket)).await
}

async fn serve(manager: Arc<CommandManager>, socket: Arc<UdpSocket>) {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        let (len, src) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                warn!("Failed receiving datagram: {}", e);
                continue;
            }
        };

        let datagram = buf[..len].to_vec();
        let socket = socket.clone();
        let manager = manager.clone();
        let span = logging::request_span("coap", "datagram");
        tokio::spawn(
            async move {
                match handle_datagram(&manager, &datagram, src).await {
                    Ok(Some(reply)) => {
                        if let Err(e) = socket.send_to(&reply, src).await {
                            error!(%src, "Failed sending reply: {}", e);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!(%src, "Dropped datagram: {}", e),
                }
            }
            .instrument(span),
        );
    }
}

/// Answers a single request datagram. Returns `None` for messages
/// that must not be answered, like acknowledgements and resets.
pub async fn handle_datagram(
    manager: &Arc<CommandManager>,
    datagram: &[u8],
    src: SocketAddr,
) -> Result<Option<Vec<u8>>, CoapError> {
    let packet = Packet::from_bytes(datagram)?;
    let mut request = CoapRequest::from_packet(packet, src);
    let path = request.get_path();
    let method = request.get_method().clone();
    debug!(%path, ?method, "Received request");

    let (status, envelope) = match resource(&path) {
        Resource::Ping if method == RequestType::Get => (ResponseType::Content, Some(Envelope::success())),
        Resource::Command(kind) if method == request_type(kind.verb()) => {
            let outcome = dispatch::handle(manager, kind, &request.message.payload).await;
            (response_type(&outcome), Some(outcome.envelope()))
        }
        Resource::Ping | Resource::Command(_) => (ResponseType::MethodNotAllowed, None),
        Resource::Unknown => (ResponseType::NotFound, None),
    };

    let response = match request.response.as_mut() {
        Some(response) => response,
        None => return Ok(None),
    };
    response.set_status(status);
    if let Some(envelope) = envelope {
        response.message.payload = envelope.to_vec();
        response.message.set_content_format(ContentFormat::ApplicationJSON);
    }
    Ok(Some(response.message.to_bytes()?))
}

/// CoAP resource of a command
pub fn resource_path(kind: CommandKind) -> &'static str {
    match kind {
        CommandKind::SubmitLight => "lightData",
        CommandKind::SubmitTemperature => "temperatureData",
        CommandKind::NewSensor => "newSensor",
        CommandKind::UpdateSensorPosition => "updateSensorPosition",
        CommandKind::DeleteSensor => "deleteSensor",
        CommandKind::NewPosition => "newPosition",
        CommandKind::UpdatePositionData => "updatePositionData",
        CommandKind::DeletePosition => "deletePosition",
        CommandKind::NewPlant => "newPlant",
        CommandKind::UpdatePlant => "updatePlant",
        CommandKind::DeletePlant => "deletePlant",
    }
}

/*
 * Helpers
 */

enum Resource {
    Ping,
    Command(CommandKind),
    Unknown,
}

fn resource(path: &str) -> Resource {
    let path = path.trim_matches('/');
    if path == PING {
        return Resource::Ping;
    }
    CommandKind::ALL
        .iter()
        .copied()
        .find(|kind| resource_path(*kind) == path)
        .map_or(Resource::Unknown, Resource::Command)
}

fn request_type(verb: Verb) -> RequestType {
    match verb {
        Verb::Put => RequestType::Put,
        Verb::Post => RequestType::Post,
        Verb::Patch => RequestType::Patch,
        Verb::Delete => RequestType::Delete,
    }
}

fn response_type(outcome: &Outcome) -> ResponseType {
    match outcome {
        Outcome::Success => ResponseType::Content,
        Outcome::BadRequest(_) | Outcome::Failure(_) => ResponseType::BadRequest,
        Outcome::Fault(_) => ResponseType::InternalServerError,
    }
}

async fn bind_socket(bind: SocketAddr) -> Result<UdpSocket, CoapError> {
    Ok(UdpSocket::bind(bind).await?)
}
