use super::{build_outcome_response, envelope_response};
use crate::dispatch::{self, Envelope};
use sprout_core::{CommandKind, CommandManager, Verb};
use std::sync::Arc;
use warp::filters::BoxedFilter;
use warp::http::StatusCode;
use warp::Filter;

const MAX_BODY_BYTES: u64 = 4096;

pub fn routes(
    manager: &Arc<CommandManager>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    ping()
        .or(command(manager.clone(), CommandKind::SubmitLight))
        .or(command(manager.clone(), CommandKind::SubmitTemperature))
        .or(command(manager.clone(), CommandKind::NewSensor))
        .or(command(manager.clone(), CommandKind::UpdateSensorPosition))
        .or(command(manager.clone(), CommandKind::DeleteSensor))
        .or(command(manager.clone(), CommandKind::NewPosition))
        .or(command(manager.clone(), CommandKind::UpdatePositionData))
        .or(command(manager.clone(), CommandKind::DeletePosition))
        .or(command(manager.clone(), CommandKind::NewPlant))
        .or(command(manager.clone(), CommandKind::UpdatePlant))
        .or(command(manager.clone(), CommandKind::DeletePlant))
}

/// HTTP resource of a command
pub fn http_path(kind: CommandKind) -> &'static str {
    match kind {
        CommandKind::SubmitLight => "submitLight",
        CommandKind::SubmitTemperature => "submitTemperature",
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

/// GET /ping
///
/// Liveness check, answers with the success envelope
fn ping() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::get()
        .and(warp::path!("ping"))
        .map(|| envelope_response(&Envelope::success(), StatusCode::OK))
        .boxed()
}

/// PUT|POST|PATCH|DELETE /:command
///
/// Runs the JSON body as the given command
///
/// Returns 200 with the success envelope, 400 if the command was
/// rejected and 500 if the store failed. Bodies above 4 KiB are
/// refused with 413.
fn command(
    manager: Arc<CommandManager>,
    kind: CommandKind,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || manager.clone())
        .and(method(kind.verb()))
        .and(warp::path(http_path(kind)))
        .and(warp::path::end())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::bytes())
        .and_then(move |manager: Arc<CommandManager>, body: bytes::Bytes| async move {
            let outcome = dispatch::handle(&manager, kind, &body).await;
            build_outcome_response(outcome)
        })
        .boxed()
}

fn method(verb: Verb) -> BoxedFilter<()> {
    match verb {
        Verb::Put => warp::put().boxed(),
        Verb::Post => warp::post().boxed(),
        Verb::Patch => warp::patch().boxed(),
        Verb::Delete => warp::delete().boxed(),
    }
}
