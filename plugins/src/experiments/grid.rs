//! Shared pieces for building experiment grids.

use std::path::Path;

use expgrid_core::api::{
    check_unique_names, merge, resource_hints, shorten_names, AppConfig, CliError, EvalModel,
    EvaluationRun, JvmCommand, ModelInput, ParameterSet, PipelineError, Stage, StageGraph,
    StageId, StageKind, TrainingRun, THREADS_KEY, TIMEOUT_KEY, WORK_MEM_KEY,
};

use super::ExperimentOptions;

/// Key naming the model family; it always leads a stage name.
pub const MODEL_KEY: &str = "model";
pub const TRAIN_KEY: &str = "train";
pub const DEV_KEY: &str = "dev";
pub const TEST_KEY: &str = "test";
pub const MODEL_OUT_ARG: &str = "modelOut";
pub const MODEL_IN_ARG: &str = "modelIn";

const SEED_KEY: &str = "seed";

/// A stage graph hanging off a single root marker.
pub struct ExperimentPlan {
    pub graph: StageGraph,
    pub root: StageId,
}

impl ExperimentPlan {
    pub fn new() -> Self {
        let mut graph = StageGraph::new();
        let root = graph.add_root();
        Self { graph, root }
    }

    /// Add `stage` after `prerequisites`, or directly under the root.
    pub fn add(&mut self, stage: Stage, prerequisites: &[StageId]) -> Result<StageId, CliError> {
        let id = self.graph.add_stage(stage);
        let link = |graph: &mut StageGraph, prereq| {
            graph
                .add_prerequisite(id, prereq)
                .map_err(|e| CliError::Pipeline(PipelineError::from(e)))
        };
        if prerequisites.is_empty() {
            link(&mut self.graph, self.root)?;
        }
        for p in prerequisites {
            link(&mut self.graph, *p)?;
        }
        Ok(id)
    }

    /// Stages other than the root.
    pub fn stage_count(&self) -> usize {
        self.graph.len().saturating_sub(1)
    }
}

impl Default for ExperimentPlan {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration and options every grid is built from.
pub struct GridContext<'a> {
    pub cfg: &'a AppConfig,
    pub opts: &'a ExperimentOptions,
    jvm: JvmCommand,
}

impl<'a> GridContext<'a> {
    pub fn new(cfg: &'a AppConfig, opts: &'a ExperimentOptions) -> Self {
        Self {
            cfg,
            opts,
            jvm: JvmCommand::from_config(&cfg.jvm, opts.hprof),
        }
    }

    pub fn jvm(&self) -> &JvmCommand {
        &self.jvm
    }

    /// Runner keys and the random seed, none of which show up in names.
    pub fn defaults(&self) -> ParameterSet {
        let mut p = ParameterSet::new();
        p.set(THREADS_KEY, 2, false, true);
        p.set(WORK_MEM_KEY, 4000, false, false);
        p.set(TIMEOUT_KEY, 48 * 3600, false, false);
        p.set(SEED_KEY, 123456789, false, true);
        p
    }

    /// Small sentence caps, one thread and a short timeout.
    pub fn fast_overrides(&self) -> ParameterSet {
        let mut p = ParameterSet::new();
        for key in ["trainMaxSentences", "devMaxSentences", "testMaxSentences"] {
            p.set(key, 100, false, true);
        }
        p.set(THREADS_KEY, 1, false, true);
        p.set(WORK_MEM_KEY, 1000, false, false);
        p.set(TIMEOUT_KEY, 10 * 60, false, false);
        p
    }

    /// Path of a configured dataset; it must exist on disk.
    pub fn dataset(&self, name: &str) -> Result<String, CliError> {
        let raw = self
            .cfg
            .datasets
            .get(name)
            .ok_or_else(|| CliError::Config(format!("dataset '{name}' is not configured")))?;
        let path = shellexpand::tilde(raw).into_owned();
        if !Path::new(&path).exists() {
            return Err(CliError::Config(format!(
                "dataset '{name}' points at missing path {path}"
            )));
        }
        Ok(path)
    }

    /// Train, dev and test paths, passed as arguments but kept out of names.
    pub fn data(&self, prefix: &str) -> Result<ParameterSet, CliError> {
        let mut p = ParameterSet::new();
        for key in [TRAIN_KEY, DEV_KEY, TEST_KEY] {
            p.set_hidden(key, self.dataset(&format!("{prefix}-{key}"))?);
        }
        Ok(p)
    }

    /// defaults + data + grid point + fast overrides, in that order.
    pub fn compose(&self, data: &ParameterSet, point: &ParameterSet) -> ParameterSet {
        let mut p = merge(&merge(&self.defaults(), data), point);
        if self.opts.fast {
            p.update(&self.fast_overrides());
        }
        p
    }

    pub fn training_stage(&self, params: ParameterSet, inputs: Vec<ModelInput>) -> Stage {
        let mut params = params;
        params.set_hidden(MODEL_OUT_ARG, self.cfg.jvm.model_file.as_str());
        let name = params.name();
        let resources = resource_hints(&params, &self.cfg.queue);
        let run = inputs.into_iter().fold(
            TrainingRun::new(params, self.jvm.clone(), self.cfg.jvm.main_class.as_str()),
            TrainingRun::with_input,
        );
        Stage::new(name, StageKind::Training(run))
            .with_sentinel(self.cfg.runner.sentinel.as_str())
            .with_resources(resources)
    }

    /// Evaluate the model of training stage `train_stage` on the test set.
    pub fn evaluation_stage(
        &self,
        name: String,
        train_params: &ParameterSet,
        train_stage: &str,
    ) -> Stage {
        let model = EvalModel::Prerequisite(ModelInput::new(
            MODEL_IN_ARG,
            train_stage,
            self.cfg.jvm.model_file.as_str(),
        ));
        self.evaluation(name, evaluation_params(train_params), model)
    }

    /// Evaluate a model already on disk.
    pub fn evaluation_of(&self, name: String, params: &ParameterSet, model_path: &Path) -> Stage {
        let model = EvalModel::Path {
            arg: MODEL_IN_ARG.to_string(),
            path: model_path.to_path_buf(),
        };
        self.evaluation(name, evaluation_params(params), model)
    }

    fn evaluation(&self, name: String, params: ParameterSet, model: EvalModel) -> Stage {
        let resources = resource_hints(&params, &self.cfg.queue);
        let eval_class = self.cfg.jvm.eval_class.as_str();
        let run =
            EvaluationRun::new(params, self.jvm.clone(), eval_class, model).with_gold_key(TEST_KEY);
        Stage::new(name, StageKind::Evaluation(run))
            .with_sentinel(self.cfg.runner.sentinel.as_str())
            .with_resources(resources)
    }
}

fn evaluation_params(params: &ParameterSet) -> ParameterSet {
    let mut p = params.clone();
    p.remove(TRAIN_KEY);
    p.remove(MODEL_OUT_ARG);
    p
}

/// Grid point naming the model family first.
pub fn point(model: &str) -> ParameterSet {
    let mut p = ParameterSet::new().with_initial_keys([MODEL_KEY]);
    p.set(MODEL_KEY, model, true, false);
    p
}

pub fn cartesian<A: Clone, B: Clone>(a: &[A], b: &[B]) -> Vec<(A, B)> {
    a.iter()
        .flat_map(|x| b.iter().map(move |y| (x.clone(), y.clone())))
        .collect()
}

/// Shorten names across the batch, then refuse duplicates.
pub fn finalize(batch: &mut [ParameterSet]) -> Result<(), CliError> {
    shorten_names(batch);
    check_unique_names(batch).map_err(|e| CliError::Config(e.to_string()))
}
