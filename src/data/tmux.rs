use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::Result;

/// tmux window name for a worktree; tmux treats `.` and `:` as target separators.
pub fn window_name(worktree_name: &str) -> String {
    worktree_name.replace(['.', ':'], "-")
}

fn inside_tmux() -> bool {
    std::env::var_os("TMUX").is_some()
}

fn tmux(args: &[&str]) -> Result<()> {
    let output = Command::new("tmux")
        .args(args)
        .stdin(Stdio::null())
        .output()?;
    if !output.status.success() {
        anyhow::bail!(
            "tmux {} failed: {}",
            args.first().unwrap_or(&""),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

/// Select the worktree's tmux window, creating it in `path` if it does not
/// exist yet.
pub fn open_window(name: &str, path: &Path) -> Result<()> {
    if !inside_tmux() {
        anyhow::bail!("not running inside tmux");
    }
    let window = window_name(name);
    if tmux(&["select-window", "-t", &window]).is_ok() {
        return Ok(());
    }
    let cwd = path.to_string_lossy();
    tmux(&["new-window", "-n", &window, "-c", &cwd])
}

/// Open `$EDITOR` (falling back to `vi`) in a new tmux window at `path`.
pub fn open_editor(name: &str, path: &Path) -> Result<()> {
    if !inside_tmux() {
        anyhow::bail!("not running inside tmux");
    }
    let editor = std::env::var("EDITOR")
        .ok()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| "vi".to_string());
    let window = format!("{}-edit", window_name(name));
    let cwd = path.to_string_lossy();
    tmux(&["new-window", "-n", &window, "-c", &cwd, &format!("{} .", editor)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_name_strips_target_separators() {
        assert_eq!(window_name("feat/v1.2:x"), "feat/v1-2-x");
    }
}
