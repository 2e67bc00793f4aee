use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub jvm: JvmConfig,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub runner: RunnerConfig,

    /// Dataset name -> file path, looked up by the experiment catalog.
    #[serde(default)]
    pub datasets: BTreeMap<String, String>,

    #[serde(default)]
    pub scrape: ScrapeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "expgrid_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root under which numbered experiment directories are created.
    #[serde(default = "default_exp_root")]
    pub exp_root: String,
}

fn default_exp_root() -> String {
    "./exp".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            exp_root: default_exp_root(),
        }
    }
}

impl PathsConfig {
    pub fn exp_root_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.exp_root).into_owned())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JvmConfig {
    #[serde(default = "default_java_bin")]
    pub java_bin: String,

    #[serde(default)]
    pub classpath: String,

    #[serde(default = "default_main_class")]
    pub main_class: String,

    #[serde(default = "default_main_class")]
    pub eval_class: String,

    /// Extra flags placed before the class name.
    #[serde(default = "default_jvm_extra_args")]
    pub extra_args: Vec<String>,

    /// File a training run leaves its model in, relative to the stage directory.
    #[serde(default = "default_model_file")]
    pub model_file: String,
}

fn default_java_bin() -> String {
    "java".to_string()
}

fn default_main_class() -> String {
    "edu.jhu.nlp.joint.JointNlpRunner".to_string()
}

fn default_jvm_extra_args() -> Vec<String> {
    vec!["-ea".to_string()]
}

fn default_model_file() -> String {
    "model.binary.gz".to_string()
}

impl Default for JvmConfig {
    fn default() -> Self {
        Self {
            java_bin: default_java_bin(),
            classpath: String::new(),
            main_class: default_main_class(),
            eval_class: default_main_class(),
            extra_args: default_jvm_extra_args(),
            model_file: default_model_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_qsub_bin")]
    pub qsub_bin: String,

    /// Queue used when `--queue` is not given on the command line.
    #[serde(default)]
    pub name: Option<String>,

    /// Added to the JVM heap when requesting memory from the scheduler.
    #[serde(default = "default_memory_overhead_mb")]
    pub memory_overhead_mb: u64,

    /// Runtime hint for stages that carry no timeout of their own.
    #[serde(default = "default_minutes")]
    pub default_minutes: u64,
}

fn default_qsub_bin() -> String {
    "qsub".to_string()
}

fn default_memory_overhead_mb() -> u64 {
    512
}

fn default_minutes() -> u64 {
    24 * 60
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            qsub_bin: default_qsub_bin(),
            name: None,
            memory_overhead_mb: default_memory_overhead_mb(),
            default_minutes: default_minutes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default = "default_sentinel")]
    pub sentinel: String,

    #[serde(default = "default_params_file")]
    pub params_file: String,

    #[serde(default = "default_stdout_file")]
    pub stdout_file: String,

    #[serde(default = "default_progress_bar")]
    pub progress_bar: bool,

    #[serde(default = "default_wait_initial_ms")]
    pub wait_initial_ms: u64,

    #[serde(default = "default_wait_max_ms")]
    pub wait_max_ms: u64,

    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,

    /// Command the generated scrape stage invokes; the running binary if unset.
    #[serde(default)]
    pub scrape_command: Option<String>,
}

fn default_sentinel() -> String {
    "DONE".to_string()
}

fn default_params_file() -> String {
    "expparams.txt".to_string()
}

fn default_stdout_file() -> String {
    "stdout".to_string()
}

fn default_progress_bar() -> bool {
    true
}

fn default_wait_initial_ms() -> u64 {
    2_000
}

fn default_wait_max_ms() -> u64 {
    120_000
}

fn default_wait_timeout_secs() -> u64 {
    3 * 24 * 3600
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            sentinel: default_sentinel(),
            params_file: default_params_file(),
            stdout_file: default_stdout_file(),
            progress_bar: default_progress_bar(),
            wait_initial_ms: default_wait_initial_ms(),
            wait_max_ms: default_wait_max_ms(),
            wait_timeout_secs: default_wait_timeout_secs(),
            scrape_command: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Occurrence {
    First,
    #[default]
    Last,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricRuleConfig {
    pub name: String,
    /// Regex whose first capture group is the metric value.
    pub pattern: String,
    #[serde(default)]
    pub occurrence: Occurrence,
    /// Match `pattern` as plain text and take the rest of the line.
    #[serde(default)]
    pub literal: bool,
}

impl MetricRuleConfig {
    fn last(name: &str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            occurrence: Occurrence::Last,
            literal: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    #[serde(default = "default_metrics")]
    pub metrics: Vec<MetricRuleConfig>,
}

fn default_metrics() -> Vec<MetricRuleConfig> {
    vec![
        MetricRuleConfig::last("dev_accuracy", r"Accuracy on dev:\s*(\S+)"),
        MetricRuleConfig::last("test_accuracy", r"Accuracy on test:\s*(\S+)"),
        MetricRuleConfig::last("test_f1", r"F1 on test:\s*(\S+)"),
        MetricRuleConfig::last("elapsed", r"^real\s+(\S+)"),
    ]
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            metrics: default_metrics(),
        }
    }
}
