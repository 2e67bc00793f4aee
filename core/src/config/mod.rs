mod load;
mod types;

pub use load::{apply_env_overrides, get_expgrid_data_dir, load_default, load_from};
pub use types::{
    AppConfig, JvmConfig, LoggingConfig, MetricRuleConfig, Occurrence, PathsConfig, QueueConfig,
    RunnerConfig, ScrapeConfig,
};
