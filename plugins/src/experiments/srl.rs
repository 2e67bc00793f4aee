//! Semantic role labelling grid.

use expgrid_core::api::{CliError, ParameterSet};

use super::grid::{cartesian, finalize, point, ExperimentPlan, GridContext};
use super::Experiment;

const ROLE_ID_FEATS: [&str; 3] = ["basic", "coarse", "full"];
const LEARNING_RATES: [f64; 2] = [0.1, 0.01];

pub struct SrlGrid;

impl Experiment for SrlGrid {
    fn name(&self) -> &'static str {
        "srl-grid"
    }

    fn description(&self) -> &'static str {
        "semantic role labelling: role-id feature templates x learning rate"
    }

    fn build(&self, ctx: &GridContext<'_>) -> Result<ExperimentPlan, CliError> {
        let data = ctx.data("srl")?;
        let mut batch: Vec<ParameterSet> = cartesian(&ROLE_ID_FEATS, &LEARNING_RATES)
            .into_iter()
            .map(|(feats, lr)| {
                let mut point = point("srl").with("roleIdFeats", feats).with("sgdInitialLr", lr);
                point.set_hidden("predictSense", true);
                ctx.compose(&data, &point)
            })
            .collect();
        finalize(&mut batch)?;

        let mut plan = ExperimentPlan::new();
        for params in batch {
            plan.add(ctx.training_stage(params, Vec::new()), &[])?;
        }
        Ok(plan)
    }
}
