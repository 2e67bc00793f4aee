use indicatif::{ProgressBar, ProgressStyle};

/// Progress over the stages of one pipeline run.
pub struct ProgressMonitor {
    bar: ProgressBar,
    enabled: bool,
}

impl ProgressMonitor {
    /// # Arguments
    ///
    /// * `total_stages` - Number of stages that will be visited
    /// * `enabled` - Whether to draw anything at all
    pub fn new(total_stages: usize, enabled: bool) -> Self {
        if !enabled {
            return Self {
                bar: ProgressBar::hidden(),
                enabled: false,
            };
        }

        let bar = ProgressBar::new(total_stages as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} stages {msg}")
        {
            bar.set_style(style.progress_chars("█▓▒░  "));
        }
        bar.set_message("starting");

        Self { bar, enabled: true }
    }

    pub fn stage_started(&self, name: &str) {
        if self.enabled {
            self.bar.set_message(name.to_string());
        }
    }

    pub fn stage_finished(&self) {
        if self.enabled {
            self.bar.inc(1);
        }
    }

    pub fn finish(&self, summary: &str) {
        if self.enabled {
            self.bar.finish_with_message(summary.to_string());
        }
    }
}
