#[allow(clippy::module_inception)]
pub mod error;
pub mod params;
pub mod pipeline;

pub use error::{CliError, ScrapeError};
pub use params::{NamingError, ParamsError};
pub use pipeline::{ExecutionError, GraphError, PipelineError, StageError, WaitError};
