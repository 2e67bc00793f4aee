use std::fs::File;
use std::io::{BufWriter, Write};

use expgrid_core::api::{AppConfig, CliError, ResultScraper};

use super::cli::{OutputFormat, ScrapeArgs};

pub fn scrape(args: &ScrapeArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let scraper = ResultScraper::from_config(cfg)?;
    let table = scraper.scrape_dir(&args.dir)?;

    let mut out: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };
    match args.format {
        OutputFormat::Tsv => table.write_tsv(&mut out)?,
        OutputFormat::Jsonl => table.write_jsonl(&mut out)?,
    }
    out.flush()?;

    if let Some(path) = &args.out {
        tracing::info!("wrote {} row(s) to {}", table.rows().len(), path.display());
    }
    Ok(0)
}
