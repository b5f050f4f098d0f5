pub mod collage;
pub mod config;
pub mod handlers_collage;
pub mod handlers_health;
pub mod handlers_wall;
pub mod wall;
pub mod warp_helpers;
