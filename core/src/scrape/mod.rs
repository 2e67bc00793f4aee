//! Scrape stage logs into a results table.
//!
//! Each stage directory that holds a saved parameter file becomes one row.
//! Metrics are pulled from the stage's captured stdout by regex; a metric
//! whose line never appeared is left empty so partial tables still come out.

mod extract;
mod table;

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::config::{AppConfig, MetricRuleConfig, Occurrence};
use crate::error::ScrapeError;
use crate::params::{ParameterSet, Value};
use crate::stage::sentinel::sentinel_exists;

pub use extract::{all_first_groups, first_group, following_literal};
pub use table::{ResultRow, ResultsTable};

#[derive(Debug, Clone)]
pub enum MetricPattern {
    /// First capture group of the matching line.
    Regex(Regex),
    /// Whatever follows the literal on the matching line.
    Literal(String),
}

#[derive(Debug, Clone)]
pub struct MetricRule {
    pub name: String,
    pub pattern: MetricPattern,
    pub occurrence: Occurrence,
}

impl MetricRule {
    pub fn compile(cfg: &MetricRuleConfig) -> Result<Self, ScrapeError> {
        let pattern = if cfg.literal {
            MetricPattern::Literal(cfg.pattern.clone())
        } else {
            let re = Regex::new(&cfg.pattern).map_err(|source| ScrapeError::InvalidPattern {
                metric: cfg.name.clone(),
                source,
            })?;
            MetricPattern::Regex(re)
        };
        Ok(Self {
            name: cfg.name.clone(),
            pattern,
            occurrence: cfg.occurrence,
        })
    }

    pub fn extract(&self, lines: &[&str]) -> Value {
        let raw = match &self.pattern {
            MetricPattern::Regex(re) => first_group(lines, re, self.occurrence),
            MetricPattern::Literal(text) => following_literal(lines, text, self.occurrence),
        };
        raw.map(Value::parse_record).unwrap_or(Value::None)
    }
}

#[derive(Debug, Clone)]
pub struct ResultScraper {
    rules: Vec<MetricRule>,
    params_file: String,
    stdout_file: String,
    sentinel: String,
}

impl ResultScraper {
    pub fn new(rules: Vec<MetricRule>) -> Self {
        Self {
            rules,
            params_file: "expparams.txt".to_string(),
            stdout_file: "stdout".to_string(),
            sentinel: crate::stage::DEFAULT_SENTINEL.to_string(),
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self, ScrapeError> {
        let rules = cfg
            .scrape
            .metrics
            .iter()
            .map(MetricRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            rules,
            params_file: cfg.runner.params_file.clone(),
            stdout_file: cfg.runner.stdout_file.clone(),
            sentinel: cfg.runner.sentinel.clone(),
        })
    }

    pub fn metric_names(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.name.clone()).collect()
    }

    /// Row for one stage directory, or `None` if it holds no parameter file.
    pub fn scrape_stage(&self, dir: &Path) -> Result<Option<ResultRow>, ScrapeError> {
        let params_path = dir.join(&self.params_file);
        if !params_path.is_file() {
            return Ok(None);
        }
        let params = ParameterSet::load(&params_path)?;

        let stdout_path = dir.join(&self.stdout_file);
        let stdout = match std::fs::read_to_string(&stdout_path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no {} in {}", self.stdout_file, dir.display());
                String::new()
            }
            Err(source) => {
                return Err(ScrapeError::Read {
                    path: stdout_path.display().to_string(),
                    source,
                })
            }
        };
        let lines: Vec<&str> = stdout.lines().collect();

        let metrics = self
            .rules
            .iter()
            .map(|rule| (rule.name.clone(), rule.extract(&lines)))
            .collect();

        let stage = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Some(ResultRow {
            stage,
            done: sentinel_exists(&dir.join(&self.sentinel)),
            params: params.values().clone(),
            metrics,
        }))
    }

    /// One row per stage directory directly under `top_dir`, sorted by name.
    pub fn scrape_dir(&self, top_dir: &Path) -> Result<ResultsTable, ScrapeError> {
        let mut table = ResultsTable::new(self.metric_names());
        for dir in stage_dirs(top_dir)? {
            if let Some(row) = self.scrape_stage(&dir)? {
                table.push(row);
            }
        }
        table.sort_by_stage();
        tracing::info!(
            "scraped {} stage(s) from {}",
            table.rows().len(),
            top_dir.display()
        );
        Ok(table)
    }
}

fn stage_dirs(top_dir: &Path) -> Result<Vec<PathBuf>, ScrapeError> {
    let entries = std::fs::read_dir(top_dir).map_err(|source| ScrapeError::Read {
        path: top_dir.display().to_string(),
        source,
    })?;
    let mut dirs = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_line_is_empty_not_error() {
        let rule = MetricRule::compile(&MetricRuleConfig {
            name: "acc".into(),
            pattern: r"Accuracy on test:\s*(\S+)".into(),
            occurrence: Occurrence::Last,
            literal: false,
        })
        .unwrap();
        assert_eq!(rule.extract(&["Accuracy on test: 0.9"]), Value::Number(0.9));
        assert_eq!(rule.extract(&["nothing here"]), Value::None);
    }

    #[test]
    fn literal_rule_takes_rest_of_line() {
        let rule = MetricRule::compile(&MetricRuleConfig {
            name: "loss".into(),
            pattern: "Final loss (avg):".into(),
            occurrence: Occurrence::First,
            literal: true,
        })
        .unwrap();
        let lines = ["Final loss (avg): 2.5", "Final loss (avg): 1.5"];
        assert_eq!(rule.extract(&lines), Value::Number(2.5));
        assert_eq!(rule.extract(&["Final loss (avg):"]), Value::None);
    }

    #[test]
    fn bad_pattern_is_reported() {
        let err = MetricRule::compile(&MetricRuleConfig {
            name: "broken".into(),
            pattern: "(".into(),
            occurrence: Occurrence::First,
            literal: false,
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::InvalidPattern { ref metric, .. } if metric == "broken"
        ));
    }
}
