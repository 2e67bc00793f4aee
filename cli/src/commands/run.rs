use std::io::Write;
use std::path::{Path, PathBuf};

use expgrid_core::api::{
    create_numbered_dir, wait_for_stage, AppConfig, CliError, PipelineReport, PipelineRunner,
    RunnerOptions, ScrapeRun, WaitPolicy,
};
use expgrid_plugins::experiments::{build_experiment, ExperimentOptions};
use expgrid_plugins::factory::{build_backend, BackendChoice};

use super::cli::RunArgs;

const RUN_LOG: &str = "runs.log";

/// Build the experiment named in `args` and run it.
///
/// With `existing` set the run goes into that directory, so finished
/// stages are skipped; otherwise a new numbered directory is created.
pub async fn run(
    args: &RunArgs,
    cfg: &AppConfig,
    existing: Option<&Path>,
) -> Result<i32, CliError> {
    let opts = ExperimentOptions {
        fast: args.fast,
        hprof: args.hprof.map(Into::into),
        eval_dir: args.eval.clone(),
    };
    // configuration problems surface here, before any directory is touched
    let mut plan = build_experiment(&args.expname, cfg, &opts)?;

    let top_dir = match existing {
        Some(dir) if dir.is_dir() => dir.to_path_buf(),
        Some(dir) => {
            return Err(CliError::Config(format!(
                "experiment directory {} does not exist",
                dir.display()
            )))
        }
        None => create_numbered_dir(&cfg.paths.exp_root_path(), &args.expname)?,
    };

    let backend = build_backend(
        cfg,
        &BackendChoice {
            dry_run: args.dry_run,
            queue: args.queue.clone(),
        },
    );
    let runner_opts = RunnerOptions {
        params_file: cfg.runner.params_file.clone(),
        stdout_file: cfg.runner.stdout_file.clone(),
        sentinel: cfg.runner.sentinel.clone(),
        post_process: (!args.no_scrape).then(|| ScrapeRun::new(scrape_command(cfg))),
        progress_bar: cfg.runner.progress_bar && atty::is(atty::Stream::Stderr),
    };
    let runner = PipelineRunner::new(backend, runner_opts);
    tracing::info!(
        "experiment {} -> {} ({} backend)",
        args.expname,
        top_dir.display(),
        runner.backend_name()
    );

    let report = runner
        .run_pipeline(&mut plan.graph, plan.root, &top_dir)
        .await?;
    append_run_log(&top_dir, &args.expname, runner.backend_name(), &report)?;

    if args.wait && !report.submitted.is_empty() {
        let policy = WaitPolicy::from_config(&cfg.runner);
        for name in &report.order {
            if let Some(id) = plan.graph.find_by_name(name) {
                tracing::info!("waiting for {}", name);
                wait_for_stage(&plan.graph, id, &policy).await?;
            }
        }
    }

    println!("{}", top_dir.display());
    Ok(0)
}

/// Command the scrape stage calls back into: configured, else this binary.
fn scrape_command(cfg: &AppConfig) -> String {
    cfg.runner
        .scrape_command
        .clone()
        .or_else(|| {
            std::env::current_exe()
                .ok()
                .map(|p: PathBuf| p.display().to_string())
        })
        .unwrap_or_else(|| "expgrid".to_string())
}

fn append_run_log(
    top_dir: &Path,
    expname: &str,
    backend: &str,
    report: &PipelineReport,
) -> Result<(), CliError> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(top_dir.join(RUN_LOG))?;
    writeln!(
        file,
        "{}\t{}\t{}\tstages={}\tskipped={}\tcompleted={}\tsubmitted={}\tdry_run={}",
        chrono::Local::now().to_rfc3339(),
        expname,
        backend,
        report.order.len(),
        report.skipped.len(),
        report.completed.len(),
        report.submitted.len(),
        report.dry_run.len()
    )?;
    Ok(())
}
