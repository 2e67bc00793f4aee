//! Stages and the dependency graph that links them.
//!
//! # Architecture
//!
//! ```text
//! StageGraph::add_stage() / add_root()
//!   ↓
//! StageGraph::add_prerequisite()   → bidirectional edge, cycles rejected
//!   ↓
//! StageGraph::reachable_from(root) → DFS over dependents
//!   ↓
//! StageGraph::topological_levels() → Vec<Vec<StageId>>
//!   ↓
//! PipelineRunner::run_stage()      → ScriptProducing::script_body() → backend
//! ```

mod graph;
mod kind;
pub mod script;
pub mod sentinel;

use std::path::{Path, PathBuf};

use crate::params::ParameterSet;

pub use graph::StageGraph;
pub use kind::{PrerequisiteInfo, ScriptContext, ScriptProducing, StageKind};

pub const DEFAULT_SENTINEL: &str = "DONE";

/// Index of a stage inside its [`StageGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StageId(pub(crate) usize);

impl StageId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Scheduler hints copied into queue submission flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceHints {
    pub threads: Option<u32>,
    pub memory_mb: Option<u64>,
    pub minutes: Option<u64>,
}

/// One unit of work in the dependency graph.
#[derive(Debug, Clone)]
pub struct Stage {
    name: String,
    /// Name given at construction; other stages may still refer to it.
    declared_name: String,
    kind: StageKind,
    pub(crate) prerequisites: Vec<StageId>,
    pub(crate) dependents: Vec<StageId>,
    sentinel: String,
    workdir: Option<PathBuf>,
    resources: ResourceHints,
}

impl Stage {
    pub fn new(name: impl Into<String>, kind: StageKind) -> Self {
        let name = name.into();
        Self {
            declared_name: name.clone(),
            name,
            kind,
            prerequisites: Vec::new(),
            dependents: Vec::new(),
            sentinel: DEFAULT_SENTINEL.to_string(),
            workdir: None,
            resources: ResourceHints::default(),
        }
    }

    /// A stage that runs a literal shell snippet.
    pub fn script(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, StageKind::Script(text.into()))
    }

    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    pub fn with_resources(mut self, resources: ResourceHints) -> Self {
        self.resources = resources;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn declared_name(&self) -> &str {
        &self.declared_name
    }

    pub fn kind(&self) -> &StageKind {
        &self.kind
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind, StageKind::RootMarker)
    }

    /// Parameters of experiment stages, persisted next to their script.
    pub fn params(&self) -> Option<&ParameterSet> {
        self.kind.params()
    }

    pub fn prerequisites(&self) -> &[StageId] {
        &self.prerequisites
    }

    pub fn dependents(&self) -> &[StageId] {
        &self.dependents
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }

    pub fn set_workdir(&mut self, dir: impl Into<PathBuf>) {
        self.workdir = Some(dir.into());
    }

    pub fn sentinel_path(&self) -> Option<PathBuf> {
        self.workdir.as_ref().map(|d| d.join(&self.sentinel))
    }

    pub fn resources(&self) -> ResourceHints {
        self.resources
    }
}
