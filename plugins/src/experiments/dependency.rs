//! Dependency parsing grids.

use expgrid_core::api::{CliError, ModelInput, NameSequence, ParameterSet};

use super::grid::{cartesian, finalize, point, ExperimentPlan, GridContext};
use super::Experiment;

const L2_VARIANCES: [f64; 3] = [100.0, 1000.0, 10000.0];

/// First-order parser over regularisation × feature set, each model
/// evaluated on the test set.
pub struct DependencyGrid;

impl Experiment for DependencyGrid {
    fn name(&self) -> &'static str {
        "dp-grid"
    }

    fn description(&self) -> &'static str {
        "first-order dependency parser: l2variance x feats, with evaluation"
    }

    fn build(&self, ctx: &GridContext<'_>) -> Result<ExperimentPlan, CliError> {
        let data = ctx.data("dp")?;
        let mut batch: Vec<ParameterSet> = cartesian(&L2_VARIANCES, &["basic", "coarse"])
            .into_iter()
            .map(|(var, feats)| {
                let point = point("dp1")
                    .with("l2variance", var)
                    .with("feats", feats);
                ctx.compose(&data, &point)
            })
            .collect();
        finalize(&mut batch)?;

        let mut plan = ExperimentPlan::new();
        let mut evals = NameSequence::new("eval");
        for params in batch {
            let train = ctx.training_stage(params.clone(), Vec::new());
            let train_name = train.name().to_string();
            let train_id = plan.add(train, &[])?;
            let eval = ctx.evaluation_stage(evals.next_name(), &params, &train_name);
            plan.add(eval, &[train_id])?;
        }
        Ok(plan)
    }
}

/// A first-order pruning model feeding second-order parsers.
pub struct DependencyPruning;

impl Experiment for DependencyPruning {
    fn name(&self) -> &'static str {
        "dp-pruning"
    }

    fn description(&self) -> &'static str {
        "first-order pruning model feeding second-order parsers"
    }

    fn build(&self, ctx: &GridContext<'_>) -> Result<ExperimentPlan, CliError> {
        let data = ctx.data("dp")?;

        let prune_params = ctx.compose(
            &data,
            &point("prune").with("l2variance", 1000).with("feats", "basic"),
        );

        let mut second: Vec<ParameterSet> = cartesian(&["basic", "full"], &[1000.0, 10000.0])
            .into_iter()
            .map(|(feats, var)| {
                let mut point = point("dp2").with("feats", feats).with("l2variance", var);
                point.set_hidden("secondOrder", true);
                ctx.compose(&data, &point)
            })
            .collect();
        finalize(&mut second)?;

        let mut all = vec![prune_params.clone()];
        all.extend(second.iter().cloned());
        check_names(&all)?;

        let mut plan = ExperimentPlan::new();
        let prune = ctx.training_stage(prune_params, Vec::new());
        let prune_name = prune.name().to_string();
        let prune_id = plan.add(prune, &[])?;

        for params in second {
            let input = ModelInput::new("pruneModel", &prune_name, ctx.cfg.jvm.model_file.as_str());
            plan.add(ctx.training_stage(params, vec![input]), &[prune_id])?;
        }
        Ok(plan)
    }
}

// The pruning stage is named on its own; only check it against the rest.
fn check_names(all: &[ParameterSet]) -> Result<(), CliError> {
    expgrid_core::api::check_unique_names(all).map_err(|e| CliError::Config(e.to_string()))
}
