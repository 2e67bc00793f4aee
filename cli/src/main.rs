use clap::Parser;
mod commands;
use commands::cli;
use expgrid_core::error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, error::CliError> {
    let args = match cli::Args::try_parse() {
        Ok(args) => args,
        Err(e) => return Ok(usage_exit(&e)),
    };
    let cfg =
        expgrid_core::config::load_default().map_err(|e| error::CliError::Config(e.to_string()))?;
    init_tracing(&cfg.logging).map_err(error::CliError::Command)?;

    dispatch(args.command, &cfg).await
}

/// Help and version go to stdout with exit 0; anything else malformed prints
/// the error and usage to stdout and exits 1.
fn usage_exit(e: &clap::Error) -> i32 {
    use clap::error::ErrorKind;
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = e.print();
            0
        }
        _ => {
            println!("{}", e.render());
            1
        }
    }
}

fn exit_code_for_error(e: &error::CliError) -> i32 {
    // 0: success
    // 1: malformed invocation (handled before config is loaded)
    // 11: config error
    // 20: IO / execution error
    // 50: internal/uncategorized
    match e {
        error::CliError::Config(_) => 11,
        error::CliError::UnknownExperiment { .. } => 11,
        error::CliError::Pipeline(pe) => match pe {
            error::PipelineError::DuplicateStage(_) => 11,
            error::PipelineError::Graph(_) => 11,
            error::PipelineError::Params(_) => 11,
            error::PipelineError::Stage(_) => 50,
            error::PipelineError::Execution(_) => 20,
            error::PipelineError::Wait(_) => 20,
            error::PipelineError::Io { .. } => 20,
        },
        error::CliError::Scrape(se) => match se {
            error::ScrapeError::InvalidPattern { .. } => 11,
            error::ScrapeError::Params(_) => 11,
            _ => 20,
        },
        error::CliError::Io(_) => 20,
        error::CliError::Command(_) => 20,
        error::CliError::Anyhow(_) => 50,
    }
}

async fn dispatch(
    cmd: cli::Commands,
    cfg: &expgrid_core::config::AppConfig,
) -> Result<i32, error::CliError> {
    match cmd {
        cli::Commands::Run(run_args) => commands::run::run(&run_args, cfg, None).await,
        cli::Commands::Resume(resume_args) => {
            commands::run::run(&resume_args.run_args, cfg, Some(&resume_args.dir)).await
        }
        cli::Commands::Scrape(scrape_args) => commands::scrape::scrape(&scrape_args, cfg),
        cli::Commands::Params(params_args) => commands::params::params(&params_args),
        cli::Commands::List => commands::params::list(),
    }
}

fn init_tracing(logging: &expgrid_core::config::LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("expgrid"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("expgrid.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
