use std::env;
use std::path::PathBuf;

/// Optional TTFs replacing the bundled fonts
#[derive(Debug, Clone, Default)]
pub struct FontConfig {
    pub regular_path: Option<PathBuf>,
    pub bold_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: String,
    pub public_url: String,
    pub year: i32,
    pub fonts: FontConfig,
    pub max_body_kb: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let port: u16 = env::var("WRAPPED_PORT")
            .unwrap_or_else(|_| "18474".to_string())
            .parse()?;

        Ok(Config {
            port,
            host: env::var("WRAPPED_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            public_url: env::var("WRAPPED_PUBLIC_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", port)),
            year: env::var("WRAPPED_YEAR")
                .unwrap_or_else(|_| "2025".to_string())
                .parse()?,
            fonts: FontConfig {
                regular_path: font_override(env::var("WRAPPED_FONT_REGULAR").ok()),
                bold_path: font_override(env::var("WRAPPED_FONT_BOLD").ok()),
            },
            max_body_kb: env::var("WRAPPED_MAX_BODY_KB")
                .unwrap_or_else(|_| "256".to_string())
                .parse()?,
        })
    }
}

fn font_override(configured: Option<String>) -> Option<PathBuf> {
    configured
        .map(|path| path.trim().to_string())
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
}
