//! Static configuration around a wrapped wall: themes, invite taglines,
//! slugs and the links/filenames derived from them.

use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MAX_SLUG_LEN: usize = 50;

/// Visual theme a host picks for their wall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WrappedTheme {
    #[default]
    Sparkly,
    Film,
    Minimal,
    Y2k,
    Chaotic,
    Soft,
}

impl WrappedTheme {
    pub const ALL: [WrappedTheme; 6] = [
        WrappedTheme::Sparkly,
        WrappedTheme::Film,
        WrappedTheme::Minimal,
        WrappedTheme::Y2k,
        WrappedTheme::Chaotic,
        WrappedTheme::Soft,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WrappedTheme::Sparkly => "SPARKLY",
            WrappedTheme::Film => "FILM",
            WrappedTheme::Minimal => "MINIMAL",
            WrappedTheme::Y2k => "Y2K",
            WrappedTheme::Chaotic => "CHAOTIC",
            WrappedTheme::Soft => "SOFT",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WrappedTheme::Sparkly => "Sparkly",
            WrappedTheme::Film => "Film",
            WrappedTheme::Minimal => "Minimal",
            WrappedTheme::Y2k => "Y2K",
            WrappedTheme::Chaotic => "Chaotic",
            WrappedTheme::Soft => "Soft",
        }
    }
}

impl FromStr for WrappedTheme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WrappedTheme::ALL
            .into_iter()
            .find(|theme| theme.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

impl fmt::Display for WrappedTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Prompts shown to invitees when they add a memory
pub const MEMORY_TAGLINES: &[&str] = &[
    "The moment you knew this friendship was forever",
    "Our most chaotic day of the year",
    "A photo that still makes you laugh",
    "The best meal we shared",
    "Where we were when everything went wrong (and right)",
    "The trip we will never stop talking about",
    "A memory you would relive tomorrow",
    "The night that got out of hand",
    "Proof we actually touched grass",
    "The inside joke, explained in one picture",
];

pub fn random_tagline() -> &'static str {
    MEMORY_TAGLINES
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(MEMORY_TAGLINES[0])
}

/// Pick `count` taglines. Without duplicates the result is capped at the pool size.
pub fn random_taglines(count: usize, allow_duplicates: bool) -> Vec<&'static str> {
    if count == 0 {
        return Vec::new();
    }

    if allow_duplicates {
        return (0..count).map(|_| random_tagline()).collect();
    }

    let mut pool: Vec<&'static str> = MEMORY_TAGLINES.to_vec();
    pool.shuffle(&mut rand::rng());
    pool.truncate(count.min(MEMORY_TAGLINES.len()));
    pool
}

/// URL-safe slug for a host's wall, e.g. `"Sam O'Neil", 2025` -> `sam-o-neil-2025`
pub fn generate_slug(host_name: &str, year: i32) -> String {
    let base = format!("{}-{}", host_name, year).to_lowercase();

    let mut slug = String::with_capacity(base.len());
    let mut pending_dash = false;
    for ch in base.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }

    slug.truncate(MAX_SLUG_LEN);
    slug
}

/// First free variant of `base`: `base`, `base-1`, `base-2`, ...
pub fn unique_slug<F>(base: &str, mut is_taken: F) -> String
where
    F: FnMut(&str) -> bool,
{
    if !is_taken(base) {
        return base.to_string();
    }

    let mut counter = 1;
    loop {
        let candidate = format!("{}-{}", base, counter);
        if !is_taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Public link to a wall
pub fn share_url(base_url: &str, slug: &str) -> String {
    format!("{}/w/{}", base_url.trim_end_matches('/'), slug)
}

/// Suggested filename when offering a collage download
pub fn download_filename(year: i32) -> String {
    format!("friendship-wrapped-{}.png", year)
}
