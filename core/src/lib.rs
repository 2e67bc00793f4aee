pub mod api;
pub mod config;
pub mod error;
pub mod experiment;
pub mod naming;
pub mod params;
pub mod pipeline;
pub mod scrape;
pub mod stage;
pub mod util;
