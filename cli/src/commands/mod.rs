pub mod cli;
pub mod params;
pub mod run;
pub mod scrape;
