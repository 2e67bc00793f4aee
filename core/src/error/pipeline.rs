use std::time::Duration;

use thiserror::Error;

use super::params::ParamsError;

/// Errors raised while wiring the stage graph.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("stage '{0}' cannot depend on itself")]
    SelfDependency(String),

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("unknown stage id {0}")]
    UnknownStage(usize),
}

/// Errors raised while producing a stage's script.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("stage '{stage}' has no working directory assigned")]
    NoWorkdir { stage: String },

    #[error("stage '{stage}' needs a prerequisite: {reason}")]
    MissingPrerequisite { stage: String, reason: String },

    #[error("root marker stages produce no script")]
    RootMarker,
}

/// Errors raised by an execution backend.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("spawn failed for '{stage}': {source}")]
    Spawn {
        stage: String,
        source: std::io::Error,
    },

    #[error("stage '{stage}' exited with code {code}")]
    NonZeroExit { stage: String, code: i32 },

    #[error("queue submission failed for '{stage}': {reason}")]
    Submit { stage: String, reason: String },

    #[error("backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum WaitError {
    #[error("timed out after {0:?} waiting for {1}")]
    Timeout(Duration, String),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Duplicate stage name: {0}")]
    DuplicateStage(String),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("stage error: {0}")]
    Stage(#[from] StageError),

    #[error("execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("params error: {0}")]
    Params(#[from] ParamsError),

    #[error("wait error: {0}")]
    Wait(#[from] WaitError),

    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}
