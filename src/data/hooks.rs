use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{info, warn};

use crate::data::command::{capture_lines, failure_message, wait_with_output};

/// Run each hook command through `sh -c` inside `worktree_path`, with
/// `WT_BRANCH` and `WT_PATH` exported. Output goes to `sink`, never to the
/// terminal. Every command runs even if an earlier one fails; the returned
/// warning names the failures.
pub fn run_hooks(
    label: &str,
    commands: &[String],
    branch: &str,
    worktree_path: &Path,
    sink: &mut Vec<String>,
) -> Option<String> {
    let mut failures = Vec::new();

    for command in commands {
        sink.push(format!("$ {}", command));
        let spawned = Command::new("sh")
            .args(["-c", command])
            .current_dir(worktree_path)
            .env("WT_BRANCH", branch)
            .env("WT_PATH", worktree_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let result = spawned.and_then(|mut child| wait_with_output(&mut child));
        match result {
            Ok(output) => {
                capture_lines(&output, sink);
                if output.status.success() {
                    info!(hook = label, %command, "hook finished");
                } else {
                    let message = failure_message(&output);
                    warn!(hook = label, %command, %message, "hook failed");
                    sink.push(format!("  {} hook failed: {}", label, message));
                    failures.push(command.clone());
                }
            }
            Err(e) => {
                warn!(hook = label, %command, error = %e, "hook could not start");
                sink.push(format!("  {} hook could not start: {}", label, e));
                failures.push(command.clone());
            }
        }
    }

    if failures.is_empty() {
        None
    } else {
        Some(format!(
            "{} hook failed: {}",
            label,
            failures.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hooks_see_branch_and_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = Vec::new();
        let warning = run_hooks(
            "on_worktree_create",
            &["echo \"$WT_BRANCH\" > marker".to_string()],
            "feature-x",
            dir.path(),
            &mut sink,
        );
        assert_eq!(warning, None);
        let marker = std::fs::read_to_string(dir.path().join("marker")).unwrap();
        assert_eq!(marker.trim(), "feature-x");
        assert_eq!(sink[0], "$ echo \"$WT_BRANCH\" > marker");
    }

    #[test]
    fn failing_hook_is_a_warning_and_later_hooks_still_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = Vec::new();
        let warning = run_hooks(
            "on_worktree_create",
            &["exit 1".to_string(), "echo after".to_string()],
            "b",
            dir.path(),
            &mut sink,
        );
        assert_eq!(
            warning.as_deref(),
            Some("on_worktree_create hook failed: exit 1")
        );
        assert!(sink.iter().any(|l| l == "  after"));
    }
}
