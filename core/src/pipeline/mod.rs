//! Running a stage graph.
//!
//! ```text
//! StageGraph + root
//!   ↓
//! append post-processing stage (optional)
//!   ↓
//! validate_names() → rename / reject duplicates
//!   ↓
//! topological_levels() → execution order
//!   ↓
//! run_stage() → skip if complete, else script → ExecutionBackend
//! ```

mod backend;
mod output;
mod progress;
mod runner;

pub use backend::{ExecutionBackend, JobOutcome, StageJob};
pub use progress::ProgressMonitor;
pub use runner::{
    validate_names, wait_for_stage, PipelineReport, PipelineRunner, RunnerOptions, StageStatus,
    POST_PROCESS_STAGE,
};
