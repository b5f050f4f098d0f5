use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use warp::{reject, Filter, Rejection, Reply};

use crate::wall::{self, WrappedTheme};
use crate::warp_helpers::{with_public_url, ValidationError};

const MAX_TAGLINES: usize = 20;

#[derive(Debug, Deserialize)]
pub struct TaglineQuery {
    pub count: Option<usize>,
    pub duplicates: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SlugQuery {
    pub host: String,
    pub year: Option<i32>,
}

pub async fn list_themes() -> Result<impl Reply, Infallible> {
    let themes: Vec<_> = WrappedTheme::ALL
        .iter()
        .map(|theme| json!({ "value": theme, "label": theme.label() }))
        .collect();

    Ok(warp::reply::json(&themes))
}

pub async fn get_taglines(query: TaglineQuery) -> Result<impl Reply, Infallible> {
    let count = query.count.unwrap_or(1).min(MAX_TAGLINES);
    let taglines = wall::random_taglines(count, query.duplicates.unwrap_or(false));

    Ok(warp::reply::json(&json!({ "taglines": taglines })))
}

pub async fn preview_slug(
    query: SlugQuery,
    public_url: String,
    default_year: i32,
) -> Result<impl Reply, Rejection> {
    let year = query.year.unwrap_or(default_year);
    let slug = wall::generate_slug(&query.host, year);

    if query.host.trim().is_empty() || slug.is_empty() {
        return Err(reject::custom(ValidationError {
            message: "host is required".to_string(),
        }));
    }

    Ok(warp::reply::json(&json!({
        "slug": slug,
        "shareUrl": wall::share_url(&public_url, &slug),
        "filename": wall::download_filename(year),
    })))
}

/// Build wall configuration routes
pub fn build_wall_routes(
    public_url: String,
    default_year: i32,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let themes = warp::path!("api" / "themes")
        .and(warp::get())
        .and_then(list_themes);

    let taglines = warp::path!("api" / "taglines")
        .and(warp::get())
        .and(warp::query::<TaglineQuery>())
        .and_then(get_taglines);

    let slug = warp::path!("api" / "slug")
        .and(warp::get())
        .and(warp::query::<SlugQuery>())
        .and(with_public_url(public_url))
        .and_then(move |query: SlugQuery, public_url: String| {
            preview_slug(query, public_url, default_year)
        });

    themes.or(taglines).or(slug)
}
