// Presentation layer - HTTP adapters over the published dashboard
pub mod app_state;
pub mod handlers;
