use log::{error, info};
use warp::{reject, Filter, Rejection, Reply};

use crate::collage::{CollageRequest, Compositor};
use crate::wall;
use crate::warp_helpers::{with_compositor, CompositionFailed, ValidationError};

/// Render a collage and return it as a downloadable PNG
pub async fn create_collage(
    request: CollageRequest,
    compositor: Compositor,
) -> Result<impl Reply, Rejection> {
    if request.share_url.trim().is_empty() {
        return Err(reject::custom(ValidationError {
            message: "shareUrl is required".to_string(),
        }));
    }

    info!(
        "Collage requested for '{}' with {} memories",
        request.host_label,
        request.memories.len()
    );

    let year = request.year.unwrap_or(compositor.default_year());
    let collage = match compositor.compose_request(&request).await {
        Ok(collage) => collage,
        Err(e) => {
            error!("Failed to compose collage: {}", e);
            return Err(reject::custom(CompositionFailed));
        }
    };

    let disposition = format!(
        "attachment; filename=\"{}\"",
        wall::download_filename(year)
    );
    let reply = warp::reply::with_header(collage.png, "content-type", "image/png");
    let reply = warp::reply::with_header(reply, "content-disposition", disposition);
    let reply = warp::reply::with_header(reply, "cache-control", "no-store");

    Ok(reply)
}

/// Build collage routes
pub fn build_collage_routes(
    compositor: Compositor,
    max_body_kb: u64,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("api" / "collage")
        .and(warp::post())
        .and(warp::body::content_length_limit(max_body_kb * 1024))
        .and(warp::body::json::<CollageRequest>())
        .and(with_compositor(compositor))
        .and_then(create_collage)
}
