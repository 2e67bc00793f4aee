use thiserror::Error;

use super::pipeline::PipelineError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("pipeline failed: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("scrape failed: {0}")]
    Scrape(#[from] ScrapeError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("unknown experiment '{name}' (known: {known})")]
    UnknownExperiment { name: String, known: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("invalid metric pattern for '{metric}': {source}")]
    InvalidPattern {
        metric: String,
        source: regex::Error,
    },
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("params error: {0}")]
    Params(#[from] super::params::ParamsError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
