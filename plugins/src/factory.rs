use std::sync::Arc;

use expgrid_core::api::{AppConfig, ExecutionBackend};

use crate::backend::{DryRunBackend, LocalBackend, QsubBackend};

/// Which backend a run should use.
#[derive(Debug, Clone, Default)]
pub struct BackendChoice {
    pub dry_run: bool,
    /// Queue given on the command line; falls back to `queue.name`.
    pub queue: Option<String>,
}

pub fn build_backend(cfg: &AppConfig, choice: &BackendChoice) -> Arc<dyn ExecutionBackend> {
    let queue = choice.queue.clone().or_else(|| cfg.queue.name.clone());
    let qsub = queue.map(|q| QsubBackend::new(cfg.queue.qsub_bin.clone(), Some(q)));

    match (choice.dry_run, qsub) {
        (true, Some(q)) => Arc::new(DryRunBackend::previewing(q)),
        (true, None) => Arc::new(DryRunBackend::new()),
        (false, Some(q)) => Arc::new(q),
        (false, None) => Arc::new(LocalBackend::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_run_overrides_queue() {
        let cfg = AppConfig::default();
        let choice = BackendChoice {
            dry_run: true,
            queue: Some("all.q".into()),
        };
        assert_eq!(build_backend(&cfg, &choice).name(), "dry-run");
    }

    #[test]
    fn queue_from_config_selects_qsub() {
        let mut cfg = AppConfig::default();
        assert_eq!(build_backend(&cfg, &BackendChoice::default()).name(), "local");
        cfg.queue.name = Some("all.q".into());
        assert_eq!(build_backend(&cfg, &BackendChoice::default()).name(), "qsub");
    }
}
