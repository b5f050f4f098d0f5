use serde_json::json;
use std::convert::Infallible;
use warp::{Filter, Reply};

use crate::collage::Compositor;
use crate::warp_helpers::with_compositor;

pub async fn health_check() -> Result<impl Reply, Infallible> {
    Ok(warp::reply::json(&json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

pub async fn ready_check(compositor: Compositor) -> Result<impl Reply, Infallible> {
    Ok(warp::reply::json(&json!({
        "status": "ready",
        "year": compositor.default_year(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

pub fn build_health_routes(
    compositor: Compositor,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let health = warp::path("health").and(warp::get()).and_then(health_check);

    let ready = warp::path("ready")
        .and(warp::get())
        .and(with_compositor(compositor))
        .and_then(ready_check);

    health.or(ready)
}
