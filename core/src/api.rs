//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `expgrid_core::api` instead of reaching into internal modules.

pub use crate::config::{
    apply_env_overrides, load_default, load_from, AppConfig, JvmConfig, LoggingConfig,
    MetricRuleConfig, Occurrence, PathsConfig, QueueConfig, RunnerConfig, ScrapeConfig,
};
pub use crate::error::{
    CliError, ExecutionError, GraphError, NamingError, ParamsError, PipelineError, ScrapeError,
    StageError, WaitError,
};
pub use crate::experiment::{
    resource_hints, EvalModel, EvaluationRun, Hprof, JvmCommand, ModelInput, ScrapeRun,
    TrainingRun, THREADS_KEY, TIMEOUT_KEY, WORK_MEM_KEY,
};
pub use crate::naming::{
    canonical_name, check_unique_names, clean_name, shorten_names, NameSequence, NAME_SEPARATOR,
};
pub use crate::params::{merge, ParameterSet, Value};
pub use crate::pipeline::{
    wait_for_stage, ExecutionBackend, JobOutcome, PipelineReport, PipelineRunner, RunnerOptions,
    StageJob, StageStatus, POST_PROCESS_STAGE,
};
pub use crate::scrape::{ResultRow, ResultScraper, ResultsTable};
pub use crate::stage::sentinel::{wait_for_sentinel, WaitPolicy};
pub use crate::stage::{ResourceHints, Stage, StageGraph, StageId, StageKind};
pub use crate::util::create_numbered_dir;
