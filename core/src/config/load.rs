use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default expgrid data directory: ~/.expgrid
pub fn get_expgrid_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".expgrid"))
}

pub fn load_from(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)?;
    Ok(toml::from_str::<AppConfig>(&s)?)
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.expgrid/config.toml
    let user_config = get_expgrid_data_dir()?.join("config.toml");

    // Priority 2: ./expgrid.toml (current directory)
    let local_config = Path::new("expgrid.toml");

    let mut cfg = if user_config.exists() {
        load_from(&user_config)?
    } else if local_config.exists() {
        load_from(local_config)?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Environment variable overrides (highest priority).
pub fn apply_env_overrides(cfg: &mut AppConfig) {
    if let Some(v) = non_empty_env("EXPGRID_EXP_ROOT") {
        cfg.paths.exp_root = v;
    }
    if let Some(v) = non_empty_env("EXPGRID_QUEUE") {
        cfg.queue.name = Some(v);
    }
    if let Some(v) = non_empty_env("EXPGRID_CLASSPATH") {
        cfg.jvm.classpath = v;
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
