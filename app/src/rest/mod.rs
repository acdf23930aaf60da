use crate::dispatch::{Envelope, Outcome};
use crate::logging;
use sprout_core::{CommandError, CommandManager};
use std::sync::Arc;
use tracing::{error, info, warn};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Reply};

mod command_routes;
mod query;
mod topology_routes;

#[cfg(test)]
mod test;

pub fn routes(
    manager: &Arc<CommandManager>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    command_routes::routes(manager).or(topology_routes::routes(manager))
}

pub async fn dispatch_server(manager: Arc<CommandManager>, port: u16) {
    let routes = routes(&manager).with(warp::trace(|info| logging::request_span("http", info.path())));

    info!(port, "Starting webserver");
    warp::serve(routes).run(([0, 0, 0, 0], port)).await;
}

/*
 * Helpers
 */

fn build_response<T: serde::Serialize>(resp: Result<T, CommandError>) -> Result<Response, warp::Rejection> {
    match resp {
        Ok(data) => Ok(warp::reply::json(&data).into_response()),
        Err(err) if err.is_domain() => {
            warn!("{}", err);
            Ok(envelope_response(&Envelope::failure(&err.to_string()), StatusCode::BAD_REQUEST))
        }
        Err(err) => {
            error!("{}", err);
            Ok(envelope_response(
                &Envelope::failure(&err.to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

fn build_outcome_response(outcome: Outcome) -> Result<Response, warp::Rejection> {
    let status = match outcome {
        Outcome::Success => StatusCode::OK,
        Outcome::BadRequest(_) | Outcome::Failure(_) => StatusCode::BAD_REQUEST,
        Outcome::Fault(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    Ok(envelope_response(&outcome.envelope(), status))
}

fn envelope_response(envelope: &Envelope, status: StatusCode) -> Response {
    warp::reply::with_status(warp::reply::json(envelope), status).into_response()
}
