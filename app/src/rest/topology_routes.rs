use super::query::{IdQuery, ReadingQuery};
use super::{build_response, envelope_response};
use crate::dispatch::Envelope;
use sprout_core::{CommandManager, ReadingKind};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::Filter;

const MAX_READING_DAYS: i64 = 31;

pub fn routes(
    manager: &Arc<CommandManager>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    get_sensors(manager.clone())
        .or(get_positions(manager.clone()))
        .or(get_plants(manager.clone()))
        .or(get_readings(manager.clone(), ReadingKind::Light))
        .or(get_readings(manager.clone(), ReadingKind::Temperature))
}

/// GET /sensors?id=
///
/// Returns the latest record of every sensor, or only of `id`
fn get_sensors(
    manager: Arc<CommandManager>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || manager.clone())
        .and(warp::get())
        .and(warp::path!("sensors"))
        .and(warp::query::<IdQuery>())
        .and_then(|manager: Arc<CommandManager>, query: IdQuery| async move {
            let resp = manager.sensors(query.id()).await;
            build_response(resp)
        })
        .boxed()
}

/// GET /positions?id=
fn get_positions(
    manager: Arc<CommandManager>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || manager.clone())
        .and(warp::get())
        .and(warp::path!("positions"))
        .and(warp::query::<IdQuery>())
        .and_then(|manager: Arc<CommandManager>, query: IdQuery| async move {
            let resp = manager.positions(query.id()).await;
            build_response(resp)
        })
        .boxed()
}

/// GET /plants?id=
fn get_plants(
    manager: Arc<CommandManager>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || manager.clone())
        .and(warp::get())
        .and(warp::path!("plants"))
        .and(warp::query::<IdQuery>())
        .and_then(|manager: Arc<CommandManager>, query: IdQuery| async move {
            let resp = manager.plants(query.id()).await;
            build_response(resp)
        })
        .boxed()
}

/// GET /lightData?id=&from=&until=
/// GET /temperatureData?id=&from=&until=
///
/// Readings of one sensor within `[from, until)`, limited to 31 days
fn get_readings(
    manager: Arc<CommandManager>,
    kind: ReadingKind,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let path = match kind {
        ReadingKind::Light => "lightData",
        ReadingKind::Temperature => "temperatureData",
    };
    warp::any()
        .map(move || manager.clone())
        .and(warp::get())
        .and(warp::path(path))
        .and(warp::path::end())
        .and(warp::query::<ReadingQuery>())
        .and_then(move |manager: Arc<CommandManager>, query: ReadingQuery| async move {
            if !query.is_valid() {
                let envelope = Envelope::failure("from must be before until");
                return Ok(envelope_response(&envelope, StatusCode::BAD_REQUEST));
            }
            if query.is_larger_than(chrono::Duration::days(MAX_READING_DAYS)) {
                let envelope =
                    Envelope::failure(&format!("range exceeds {} days", MAX_READING_DAYS));
                return Ok(envelope_response(&envelope, StatusCode::BAD_REQUEST));
            }

            let resp = manager
                .readings(kind, query.id(), query.from(), query.until())
                .await;
            build_response(resp)
        })
        .boxed()
}
