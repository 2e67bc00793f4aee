//! Shell script assembly for stages.

use std::path::Path;

use chrono::Local;

use crate::util::shell::quote;

/// Run `cmd` under `time`, then stop the script with the command's exit code
/// if it failed.
pub fn checked_command(cmd: &str) -> String {
    let cmd = cmd.trim_end();
    format!(
        "time (\n{cmd}\n)\n\
         exit_code=$?\n\
         if [ $exit_code -ne 0 ]; then\n  \
         echo \"ERROR: command exited with code $exit_code\"\n  \
         exit $exit_code\n\
         fi\n"
    )
}

/// Header, body and the sentinel touch that marks the stage complete.
pub fn render_script(stage_name: &str, workdir: &Path, body: &str, sentinel: &Path) -> String {
    let workdir = workdir.display().to_string();
    let sentinel = sentinel.display().to_string();
    let mut out = String::new();
    out.push_str("#!/usr/bin/env bash\n");
    out.push_str(&format!(
        "# stage: {stage_name}\n# generated: {}\n",
        Local::now().to_rfc3339()
    ));
    out.push_str(&format!("cd {}\n", quote(&workdir)));
    out.push('\n');
    out.push_str(body.trim_end());
    out.push_str("\n\n");
    out.push_str(&format!("touch {}\n", quote(&sentinel)));
    out
}
