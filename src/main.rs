use log::{error, info};
use std::net::{IpAddr, TcpListener};
use std::sync::Arc;
use warp::Filter;

use friendship_wrapped::collage::{Compositor, DefaultFetcher, FontError, Typeface};
use friendship_wrapped::config::{Config, FontConfig};
use friendship_wrapped::handlers_collage::build_collage_routes;
use friendship_wrapped::handlers_health::build_health_routes;
use friendship_wrapped::handlers_wall::build_wall_routes;
use friendship_wrapped::warp_helpers::{cors, handle_rejection};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = Config::from_env()?;
    let port = config.port;
    let host: IpAddr = config.host.parse()?;

    info!("Starting friendship-wrapped server on {}:{}", config.host, port);
    info!("Public URL: {}", config.public_url);
    info!("Program year: {}", config.year);

    // Check if port is available BEFORE initializing services
    if !is_port_available(host, port) {
        error!(
            "Port {} is already in use. Please stop any existing instance or use a different port.",
            port
        );
        return Err(format!("Port {} is already in use", port).into());
    }

    let typeface = load_typeface(&config.fonts).map_err(|e| {
        error!("Failed to load collage fonts: {}", e);
        e
    })?;
    let compositor = Compositor::new(Arc::new(DefaultFetcher::default()), typeface, config.year);

    let health_routes = build_health_routes(compositor.clone());
    let collage_routes = build_collage_routes(compositor, config.max_body_kb);
    let wall_routes = build_wall_routes(config.public_url.clone(), config.year);

    let routes = health_routes
        .or(collage_routes)
        .or(wall_routes)
        .with(cors())
        .with(warp::log("friendship_wrapped"))
        .recover(handle_rejection);

    info!(
        "Server started successfully, listening on http://localhost:{}",
        port
    );

    warp::serve(routes).run((host, port)).await;

    Ok(())
}

fn is_port_available(host: IpAddr, port: u16) -> bool {
    TcpListener::bind((host, port)).is_ok()
}

/// Bundled DejaVu Sans unless `WRAPPED_FONT_*` points at other TTFs
fn load_typeface(fonts: &FontConfig) -> Result<Typeface, FontError> {
    let typeface =
        Typeface::with_overrides(fonts.regular_path.as_deref(), fonts.bold_path.as_deref())?;

    match (&fonts.regular_path, &fonts.bold_path) {
        (None, None) => info!("Using bundled collage fonts"),
        (regular, bold) => info!("Using collage font overrides {:?} / {:?}", regular, bold),
    }

    Ok(typeface)
}
