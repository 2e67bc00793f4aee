use std::path::Path;

use crate::error::StageError;
use crate::experiment::{EvaluationRun, ScrapeRun, TrainingRun};
use crate::params::ParameterSet;

use super::script::checked_command;

/// A prerequisite as seen from a dependent stage's script.
#[derive(Debug, Clone)]
pub struct PrerequisiteInfo<'a> {
    pub name: &'a str,
    /// Name before validation renamed the stage, if it did.
    pub declared_name: &'a str,
    pub workdir: Option<&'a Path>,
}

#[derive(Debug, Clone)]
pub struct ScriptContext<'a> {
    pub stage_name: &'a str,
    pub workdir: Option<&'a Path>,
    pub top_dir: &'a Path,
    pub prerequisites: Vec<PrerequisiteInfo<'a>>,
}

impl<'a> ScriptContext<'a> {
    pub fn workdir(&self) -> Result<&'a Path, StageError> {
        self.workdir.ok_or_else(|| StageError::NoWorkdir {
            stage: self.stage_name.to_string(),
        })
    }

    /// Working directory of the named prerequisite, looked up by its current
    /// or declared name.
    pub fn prerequisite_dir(&self, name: &str) -> Result<&'a Path, StageError> {
        self.prerequisites
            .iter()
            .find(|p| p.name == name)
            .or_else(|| self.prerequisites.iter().find(|p| p.declared_name == name))
            .and_then(|p| p.workdir)
            .ok_or_else(|| StageError::MissingPrerequisite {
                stage: self.stage_name.to_string(),
                reason: format!("no prerequisite '{name}' with a working directory"),
            })
    }
}

/// Anything that can produce the body of a stage script.
pub trait ScriptProducing {
    fn script_body(&self, ctx: &ScriptContext<'_>) -> Result<String, StageError>;
}

/// What a stage does when it runs.
#[derive(Debug, Clone)]
pub enum StageKind {
    /// Join point with no behaviour.
    RootMarker,
    /// Literal shell text.
    Script(String),
    Training(TrainingRun),
    Evaluation(EvaluationRun),
    Scrape(ScrapeRun),
}

impl StageKind {
    pub fn params(&self) -> Option<&ParameterSet> {
        match self {
            StageKind::Training(t) => Some(t.params()),
            StageKind::Evaluation(e) => Some(e.params()),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StageKind::RootMarker => "root",
            StageKind::Script(_) => "script",
            StageKind::Training(_) => "training",
            StageKind::Evaluation(_) => "evaluation",
            StageKind::Scrape(_) => "scrape",
        }
    }
}

impl ScriptProducing for StageKind {
    fn script_body(&self, ctx: &ScriptContext<'_>) -> Result<String, StageError> {
        match self {
            StageKind::RootMarker => Err(StageError::RootMarker),
            StageKind::Script(text) => Ok(checked_command(text)),
            StageKind::Training(t) => t.script_body(ctx),
            StageKind::Evaluation(e) => e.script_body(ctx),
            StageKind::Scrape(s) => s.script_body(ctx),
        }
    }
}
