use std::fs::File;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use anyhow::Context;
use async_trait::async_trait;
use tokio::process::Command;

use expgrid_core::api::{ExecutionBackend, ExecutionError, JobOutcome, StageJob};

/// Runs each stage script to completion with `bash`, one at a time.
pub struct LocalBackend {
    shell: String,
}

impl LocalBackend {
    pub fn new() -> Self {
        Self {
            shell: "bash".to_string(),
        }
    }
}

/// One file receiving both stdout and stderr.
fn capture_files(path: &Path) -> anyhow::Result<(File, File)> {
    let out = File::create(path)
        .with_context(|| format!("creating capture file {}", path.display()))?;
    let err = out
        .try_clone()
        .with_context(|| format!("sharing capture file {}", path.display()))?;
    Ok((out, err))
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionBackend for LocalBackend {
    fn name(&self) -> &str {
        "local"
    }

    async fn execute(&self, job: &StageJob) -> Result<JobOutcome, ExecutionError> {
        let spawn_err = |source: std::io::Error| ExecutionError::Spawn {
            stage: job.name.clone(),
            source,
        };

        let (out, err) = capture_files(&job.stdout_path)?;

        tracing::info!("running {} {}", self.shell, job.script_path.display());
        let started = Instant::now();
        let status = Command::new(&self.shell)
            .arg(&job.script_path)
            .current_dir(&job.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(out))
            .stderr(Stdio::from(err))
            .status()
            .await
            .map_err(spawn_err)?;
        let duration_ms = started.elapsed().as_millis() as u64;

        let exit_code = status.code().unwrap_or(-1);
        if exit_code != 0 {
            tracing::error!(
                "stage {} failed with exit code {}; see {}",
                job.name,
                exit_code,
                job.stdout_path.display()
            );
            return Err(ExecutionError::NonZeroExit {
                stage: job.name.clone(),
                code: exit_code,
            });
        }

        Ok(JobOutcome::Completed {
            exit_code,
            duration_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expgrid_core::api::ResourceHints;

    fn job(dir: &std::path::Path, body: &str) -> StageJob {
        let script_path = dir.join("s.sh");
        std::fs::write(&script_path, body).unwrap();
        StageJob {
            name: "s".into(),
            script_path,
            workdir: dir.to_path_buf(),
            stdout_path: dir.join("stdout"),
            holds: vec![],
            resources: ResourceHints::default(),
        }
    }

    #[tokio::test]
    async fn captures_output_and_reports_completion() {
        let tmp = tempfile::tempdir().unwrap();
        let job = job(tmp.path(), "echo hello\necho oops >&2\n");
        let outcome = LocalBackend::new().execute(&job).await.unwrap();
        assert!(matches!(outcome, JobOutcome::Completed { exit_code: 0, .. }));

        let captured = std::fs::read_to_string(tmp.path().join("stdout")).unwrap();
        assert!(captured.contains("hello"));
        assert!(captured.contains("oops"));
    }

    #[tokio::test]
    async fn non_zero_exit_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let job = job(tmp.path(), "exit 3\n");
        let err = LocalBackend::new().execute(&job).await.unwrap_err();
        assert!(matches!(err, ExecutionError::NonZeroExit { code: 3, .. }));
    }

    #[tokio::test]
    async fn unwritable_capture_file_is_a_backend_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut job = job(tmp.path(), "true\n");
        job.stdout_path = tmp.path().join("missing").join("stdout");
        let err = LocalBackend::new().execute(&job).await.unwrap_err();
        assert!(matches!(err, ExecutionError::Backend(_)));
        assert!(err.to_string().contains("capture file"));
    }
}
