//! Relation extraction grid.

use expgrid_core::api::{CliError, ParameterSet};

use super::grid::{cartesian, finalize, point, ExperimentPlan, GridContext};
use super::Experiment;

const EMBEDDING_DIMS: [u32; 3] = [50, 100, 200];
const L2_LAMBDAS: [f64; 2] = [0.0001, 0.001];

pub struct RelationGrid;

impl Experiment for RelationGrid {
    fn name(&self) -> &'static str {
        "re-grid"
    }

    fn description(&self) -> &'static str {
        "relation extraction: embedding dimension x L2 weight"
    }

    fn build(&self, ctx: &GridContext<'_>) -> Result<ExperimentPlan, CliError> {
        let data = ctx.data("re")?;
        let mut batch: Vec<ParameterSet> = cartesian(&EMBEDDING_DIMS, &L2_LAMBDAS)
            .into_iter()
            .map(|(dim, lambda)| {
                let point = point("re").with("embDim", dim).with("l2Lambda", lambda);
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
