use anyhow::{bail, Context, Result};
use log::{debug, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use friendship_wrapped::collage::{Compositor, DefaultFetcher, MemoryRef, Typeface};
use friendship_wrapped::config::Config;
use friendship_wrapped::wall;

const USAGE: &str = "usage: render_collage [--host NAME] [--url SHARE_URL] [--out FILE] PHOTO...";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let mut host_label = String::new();
    let mut share_url: Option<String> = None;
    let mut out: Option<PathBuf> = None;
    let mut memories = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--host" => host_label = args.next().context(USAGE)?,
            "--url" => share_url = Some(args.next().context(USAGE)?),
            "--out" => out = Some(PathBuf::from(args.next().context(USAGE)?)),
            "-h" | "--help" => {
                println!("{}", USAGE);
                return Ok(());
            }
            flag if flag.starts_with("--") => bail!("unknown option {}\n{}", flag, USAGE),
            source => memories.push(MemoryRef::new(source)),
        }
    }

    let share_url = share_url.unwrap_or_else(|| {
        let slug = wall::generate_slug(&host_label, config.year);
        wall::share_url(&config.public_url, &slug)
    });
    let out = out.unwrap_or_else(|| PathBuf::from(wall::download_filename(config.year)));

    let typeface = Typeface::with_overrides(
        config.fonts.regular_path.as_deref(),
        config.fonts.bold_path.as_deref(),
    )
    .context("Failed to load fonts")?;
    if config.fonts.regular_path.is_none() && config.fonts.bold_path.is_none() {
        debug!("Rendering with bundled fonts");
    } else {
        info!(
            "Rendering with font overrides {:?} / {:?}",
            config.fonts.regular_path, config.fonts.bold_path
        );
    }

    let compositor = Compositor::new(Arc::new(DefaultFetcher::default()), typeface, config.year);

    let started = Instant::now();
    let collage = compositor
        .compose(&memories, &host_label, &share_url)
        .await
        .context("Failed to compose collage")?;

    std::fs::write(&out, &collage.png)
        .with_context(|| format!("Failed to write {}", out.display()))?;

    println!(
        "Wrote {} ({} photos, {} placeholders, grid {:?}) in {:.2?}",
        out.display(),
        collage.photo_count,
        collage.placeholder_count,
        collage.grid.map(|g| (g.columns, g.rows)),
        started.elapsed()
    );

    Ok(())
}
