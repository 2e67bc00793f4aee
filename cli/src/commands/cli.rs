use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use expgrid_core::api::Hprof;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HprofArg {
    Cpu,
    Heap,
}

impl From<HprofArg> for Hprof {
    fn from(v: HprofArg) -> Self {
        match v {
            HprofArg::Cpu => Hprof::Cpu,
            HprofArg::Heap => Hprof::Heap,
        }
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Tsv,
    Jsonl,
}

#[derive(Parser, Debug)]
#[command(name = "expgrid", version, about = "Build, run and scrape experiment grids")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Experiment from the catalog (see `expgrid list`).
    #[arg(short = 'e', long)]
    pub expname: String,

    /// Submit to this queue instead of running stages locally.
    #[arg(short = 'q', long)]
    pub queue: Option<String>,

    /// Shrink the workload for a quick end-to-end check.
    #[arg(short = 'f', long)]
    pub fast: bool,

    /// Write scripts but run nothing.
    #[arg(short = 'n', long = "dry_run", alias = "dry-run")]
    pub dry_run: bool,

    /// Attach the JVM profiler.
    #[arg(long, value_enum)]
    pub hprof: Option<HprofArg>,

    /// Evaluate the trained models found in this experiment directory.
    #[arg(long)]
    pub eval: Option<PathBuf>,

    /// After queue submission, block until every stage is done.
    #[arg(long)]
    pub wait: bool,

    /// Do not append the result-scraping stage.
    #[arg(long)]
    pub no_scrape: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ResumeArgs {
    /// Existing experiment directory to run into.
    pub dir: PathBuf,

    #[command(flatten)]
    pub run_args: RunArgs,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ScrapeArgs {
    /// Experiment directory whose stage directories are scraped.
    pub dir: PathBuf,

    /// Write here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Tsv)]
    pub format: OutputFormat,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ParamsArgs {
    /// A saved parameter file, e.g. `expparams.txt`.
    pub file: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build an experiment grid into a fresh numbered directory and run it.
    Run(RunArgs),
    /// Re-run an experiment into an existing directory, skipping finished stages.
    Resume(ResumeArgs),
    /// Collect parameters and metrics of every stage into one table.
    Scrape(ScrapeArgs),
    /// Print a saved parameter set with its derived name and arguments.
    Params(ParamsArgs),
    /// List the experiments in the catalog.
    List,
}
