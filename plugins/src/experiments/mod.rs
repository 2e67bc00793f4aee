//! Named experiment grids selectable with `--expname`.

mod dependency;
mod grid;
mod relation;
mod srl;

use std::path::{Path, PathBuf};

use expgrid_core::api::{clean_name, AppConfig, CliError, Hprof, ParameterSet};

pub use dependency::{DependencyGrid, DependencyPruning};
pub use grid::{ExperimentPlan, GridContext};
pub use relation::RelationGrid;
pub use srl::SrlGrid;

#[derive(Debug, Clone, Default)]
pub struct ExperimentOptions {
    /// Shrink the workload for a quick end-to-end check.
    pub fast: bool,
    pub hprof: Option<Hprof>,
    /// Evaluate models found here instead of training a grid.
    pub eval_dir: Option<PathBuf>,
}

pub trait Experiment: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn build(&self, ctx: &GridContext<'_>) -> Result<ExperimentPlan, CliError>;
}

pub fn catalog() -> Vec<Box<dyn Experiment>> {
    vec![
        Box::new(DependencyGrid),
        Box::new(DependencyPruning),
        Box::new(SrlGrid),
        Box::new(RelationGrid),
    ]
}

pub fn find_experiment(name: &str) -> Result<Box<dyn Experiment>, CliError> {
    let mut all = catalog();
    match all.iter().position(|e| e.name() == name) {
        Some(idx) => Ok(all.swap_remove(idx)),
        None => Err(CliError::UnknownExperiment {
            name: name.to_string(),
            known: all.iter().map(|e| e.name()).collect::<Vec<_>>().join(", "),
        }),
    }
}

/// Build the stage graph for `name`, or for evaluating `opts.eval_dir`.
pub fn build_experiment(
    name: &str,
    cfg: &AppConfig,
    opts: &ExperimentOptions,
) -> Result<ExperimentPlan, CliError> {
    let experiment = find_experiment(name)?;
    let ctx = GridContext::new(cfg, opts);
    let plan = match &opts.eval_dir {
        Some(dir) => build_evaluation(&ctx, dir)?,
        None => experiment.build(&ctx)?,
    };
    tracing::info!("experiment {} has {} stage(s)", name, plan.stage_count());
    Ok(plan)
}

/// One evaluation stage per directory under `dir` that holds saved
/// parameters and a trained model.
fn build_evaluation(ctx: &GridContext<'_>, dir: &Path) -> Result<ExperimentPlan, CliError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| CliError::Config(format!("cannot read {}: {}", dir.display(), e)))?;
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();

    let mut plan = ExperimentPlan::new();
    for stage_dir in dirs {
        let params_path = stage_dir.join(&ctx.cfg.runner.params_file);
        let model_path = stage_dir.join(&ctx.cfg.jvm.model_file);
        if !params_path.is_file() || !model_path.is_file() {
            tracing::debug!("skipping {}: no parameters or model", stage_dir.display());
            continue;
        }
        let params = ParameterSet::load(&params_path)
            .map_err(|e| CliError::Config(format!("{}: {}", params_path.display(), e)))?;
        let source = stage_dir
            .file_name()
            .map(|n| clean_name(&n.to_string_lossy()))
            .unwrap_or_default();
        let stage = ctx.evaluation_of(format!("eval_{source}"), &params, &model_path);
        plan.add(stage, &[])?;
    }

    if plan.stage_count() == 0 {
        return Err(CliError::Config(format!(
            "no trained models found under {}",
            dir.display()
        )));
    }
    Ok(plan)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use expgrid_core::api::StageKind;
    use tempfile::TempDir;

    /// Config whose `<prefix>-{train,dev,test}` datasets exist on disk.
    pub fn configured(prefix: &str) -> (TempDir, AppConfig) {
        let tmp = tempfile::tempdir().unwrap();
        let mut cfg = AppConfig::default();
        for split in ["train", "dev", "test"] {
            let path = tmp.path().join(format!("{prefix}.{split}.conll"));
            std::fs::write(&path, "").unwrap();
            cfg.datasets
                .insert(format!("{prefix}-{split}"), path.display().to_string());
        }
        (tmp, cfg)
    }

    #[test]
    fn unknown_experiment_lists_known_names() {
        let err = find_experiment("nope").err().unwrap();
        match err {
            CliError::UnknownExperiment { name, known } => {
                assert_eq!(name, "nope");
                assert!(known.contains("dp-grid"));
                assert!(known.contains("re-grid"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn every_catalog_grid_builds_with_configured_data() {
        for exp in catalog() {
            let prefix = exp.name().split('-').next().unwrap().to_string();
            let (_tmp, cfg) = configured(&prefix);
            let opts = ExperimentOptions {
                fast: true,
                ..Default::default()
            };
            let plan = build_experiment(exp.name(), &cfg, &opts).unwrap();
            assert!(plan.stage_count() > 1, "{} built nothing", exp.name());
        }
    }

    #[test]
    fn missing_dataset_fails_before_building() {
        let cfg = AppConfig::default();
        let err = build_experiment("srl-grid", &cfg, &ExperimentOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn eval_dir_yields_one_stage_per_trained_model() {
        let (_tmp, cfg) = configured("dp");
        let runs = tempfile::tempdir().unwrap();
        for (name, with_model) in [("dp1_basic", true), ("dp1_coarse", true), ("broken", false)] {
            let dir = runs.path().join(name);
            std::fs::create_dir_all(&dir).unwrap();
            ParameterSet::new()
                .with("feats", "basic")
                .with_hidden("train", "/data/train")
                .save(&dir.join("expparams.txt"))
                .unwrap();
            if with_model {
                std::fs::write(dir.join("model.binary.gz"), b"").unwrap();
            }
        }

        let opts = ExperimentOptions {
            eval_dir: Some(runs.path().to_path_buf()),
            ..Default::default()
        };
        let plan = build_experiment("dp-grid", &cfg, &opts).unwrap();
        assert_eq!(plan.stage_count(), 2);
        let id = plan.graph.find_by_name("eval_dp1_basic").unwrap();
        let stage = plan.graph.stage(id).unwrap();
        assert!(matches!(stage.kind(), StageKind::Evaluation(_)));
        assert!(!stage.params().unwrap().contains("train"));
    }
}
