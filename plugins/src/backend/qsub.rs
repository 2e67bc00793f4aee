use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;

use expgrid_core::api::{ExecutionBackend, ExecutionError, JobOutcome, StageJob};
use expgrid_core::util::shell::quote;

/// Submits each stage to a Grid Engine style scheduler and returns as soon
/// as the submission command exits.
pub struct QsubBackend {
    qsub_bin: String,
    queue: Option<String>,
}

impl QsubBackend {
    pub fn new(qsub_bin: impl Into<String>, queue: Option<String>) -> Self {
        Self {
            qsub_bin: qsub_bin.into(),
            queue,
        }
    }

    pub fn program(&self) -> &str {
        &self.qsub_bin
    }

    /// Arguments passed to the submission command for `job`.
    pub fn build_args(&self, job: &StageJob) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(q) = &self.queue {
            args.push("-q".to_string());
            args.push(q.clone());
        }
        if let Some(threads) = job.resources.threads.filter(|t| *t > 1) {
            args.push("-pe".to_string());
            args.push("smp".to_string());
            args.push(threads.to_string());
        }

        let mut limits = Vec::new();
        if let Some(mb) = job.resources.memory_mb {
            limits.push(format!("mem_free={mb}M"));
            limits.push(format!("ram_free={mb}M"));
        }
        if let Some(minutes) = job.resources.minutes {
            limits.push(format!("h_rt={:02}:{:02}:00", minutes / 60, minutes % 60));
        }
        if !limits.is_empty() {
            args.push("-l".to_string());
            args.push(limits.join(","));
        }

        args.extend(
            ["-cwd", "-j", "y", "-b", "y", "-V", "-N"]
                .iter()
                .map(|s| s.to_string()),
        );
        args.push(job.name.clone());
        args.push("-e".to_string());
        args.push(job.workdir.join("stderr").display().to_string());
        args.push("-o".to_string());
        args.push(job.stdout_path.display().to_string());

        if !job.holds.is_empty() {
            args.push("-hold_jid".to_string());
            args.push(job.holds.join(","));
        }

        args.push("bash".to_string());
        args.push(job.script_path.display().to_string());
        args
    }

    /// The submission as one shell line, for logs and dry runs.
    pub fn command_line(&self, job: &StageJob) -> String {
        let args = self.build_args(job);
        std::iter::once(self.qsub_bin.as_str())
            .chain(args.iter().map(String::as_str))
            .map(quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Job id from `Your job 12345 ("name") has been submitted`.
fn parse_job_id(stdout: &str) -> Option<String> {
    let re = Regex::new(r"[Yy]our job (\d+)").ok()?;
    re.captures(stdout)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[async_trait]
impl ExecutionBackend for QsubBackend {
    fn name(&self) -> &str {
        "qsub"
    }

    async fn execute(&self, job: &StageJob) -> Result<JobOutcome, ExecutionError> {
        tracing::debug!("{}", self.command_line(job));
        let output = Command::new(&self.qsub_bin)
            .args(self.build_args(job))
            .current_dir(&job.workdir)
            .output()
            .await
            .map_err(|source| ExecutionError::Spawn {
                stage: job.name.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let reason = if stderr.is_empty() {
                format!("{} exited with {}", self.qsub_bin, output.status)
            } else {
                stderr
            };
            return Err(ExecutionError::Submit {
                stage: job.name.clone(),
                reason,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(JobOutcome::Submitted {
            job_id: parse_job_id(&stdout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expgrid_core::api::ResourceHints;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn job(holds: &[&str], resources: ResourceHints) -> StageJob {
        StageJob {
            name: "dp2_full".into(),
            script_path: PathBuf::from("/exp/run_001/dp2_full/dp2_full.sh"),
            workdir: PathBuf::from("/exp/run_001/dp2_full"),
            stdout_path: PathBuf::from("/exp/run_001/dp2_full/stdout"),
            holds: holds.iter().map(|s| s.to_string()).collect(),
            resources,
        }
    }

    #[test]
    fn argv_carries_resources_and_holds() {
        let backend = QsubBackend::new("qsub", Some("all.q".into()));
        let args = backend.build_args(&job(
            &["prune", "dp1_basic"],
            ResourceHints {
                threads: Some(4),
                memory_mb: Some(2512),
                minutes: Some(61),
            },
        ));
        let expected: Vec<String> = [
            "-q",
            "all.q",
            "-pe",
            "smp",
            "4",
            "-l",
            "mem_free=2512M,ram_free=2512M,h_rt=01:01:00",
            "-cwd",
            "-j",
            "y",
            "-b",
            "y",
            "-V",
            "-N",
            "dp2_full",
            "-e",
            "/exp/run_001/dp2_full/stderr",
            "-o",
            "/exp/run_001/dp2_full/stdout",
            "-hold_jid",
            "prune,dp1_basic",
            "bash",
            "/exp/run_001/dp2_full/dp2_full.sh",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(args, expected);
    }

    #[test]
    fn optional_flags_are_left_out() {
        let backend = QsubBackend::new("qsub", None);
        let args = backend.build_args(&job(&[], ResourceHints::default()));
        for flag in ["-q", "-pe", "-l", "-hold_jid"] {
            assert!(!args.iter().any(|a| a == flag), "unexpected {flag}");
        }
        assert_eq!(args.last().map(String::as_str), Some("/exp/run_001/dp2_full/dp2_full.sh"));
    }

    #[test]
    fn job_id_is_read_from_submission_output() {
        assert_eq!(
            parse_job_id("Your job 4242 (\"dp2_full\") has been submitted\n"),
            Some("4242".to_string())
        );
        assert_eq!(parse_job_id("something else"), None);
    }
}
