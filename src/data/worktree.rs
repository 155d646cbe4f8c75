use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::data::command::{capture_lines, failure_message, run_captured};
use crate::error::WorktreeError;
use crate::model::confirm::MergeMethod;
use crate::model::worktree::Worktree;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    pub method: MergeMethod,
    /// Leave the head branch in place after merging; cleanup is chosen afterwards.
    pub keep_branch: bool,
}

/// Git worktree operations against the shared repository and its GitHub
/// remote. Every mutating call writes its progress lines to `out` instead of
/// the terminal.
pub trait WorktreeManager: Send + Sync {
    fn list(&self) -> Result<Vec<Worktree>, WorktreeError>;

    /// Create `branch` from `parent` (default branch when `None`) in a new
    /// worktree. A failure leaves no half-made worktree or branch behind.
    fn new_atomic(
        &self,
        branch: &str,
        parent: Option<&str>,
        out: &mut Vec<String>,
    ) -> Result<PathBuf, WorktreeError>;

    fn remove(
        &self,
        branch: &str,
        delete_branch: bool,
        out: &mut Vec<String>,
    ) -> Result<(), WorktreeError>;

    /// Fetch and rebase one worktree, or every linked worktree when `branch`
    /// is `None`. One failure does not stop the others.
    fn sync(&self, branch: Option<&str>, out: &mut Vec<String>) -> Result<(), WorktreeError>;

    fn merge_pr_for_branch(
        &self,
        branch: &str,
        options: MergeOptions,
        out: &mut Vec<String>,
    ) -> Result<u64, WorktreeError>;

    fn default_branch(&self) -> String;

    /// Hard-reset the worktree of `branch` to the remote tip of the default branch.
    fn reset_to_default(&self, branch: &str, out: &mut Vec<String>) -> Result<(), WorktreeError>;
}

/// `WorktreeManager` backed by the `git` and `gh` command line tools.
pub struct GitWorktreeManager {
    repo_root: PathBuf,
    worktrees_dir: PathBuf,
}

impl GitWorktreeManager {
    pub fn new(repo_root: PathBuf, worktrees_dir: PathBuf) -> Self {
        Self {
            repo_root,
            worktrees_dir,
        }
    }

    fn run_git(&self, cwd: &Path, args: &[&str], out: &mut Vec<String>) -> Result<String, WorktreeError> {
        out.push(format!("$ git {}", args.join(" ")));
        let output = run_captured("git", args, cwd)?;
        capture_lines(&output, out);
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).to_string());
        }
        Err(WorktreeError::Git {
            command: args.join(" "),
            message: failure_message(&output),
        })
    }

    fn run_gh(&self, args: &[&str], out: &mut Vec<String>) -> Result<String, WorktreeError> {
        out.push(format!("$ gh {}", args.join(" ")));
        let output = run_captured("gh", args, &self.repo_root)?;
        capture_lines(&output, out);
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).to_string());
        }
        Err(WorktreeError::GitHub {
            command: args.join(" "),
            message: failure_message(&output),
        })
    }

    fn find(&self, branch: &str) -> Result<Worktree, WorktreeError> {
        self.list()?
            .into_iter()
            .find(|wt| wt.branch == branch)
            .ok_or_else(|| WorktreeError::NotFound(branch.to_string()))
    }

    fn worktree_path(&self, branch: &str) -> PathBuf {
        self.worktrees_dir.join(branch.replace('/', "-"))
    }
}

impl WorktreeManager for GitWorktreeManager {
    fn list(&self) -> Result<Vec<Worktree>, WorktreeError> {
        let mut scratch = Vec::new();
        let stdout = self.run_git(&self.repo_root, &["worktree", "list", "--porcelain"], &mut scratch)?;
        Ok(parse_worktree_list(&stdout))
    }

    fn new_atomic(
        &self,
        branch: &str,
        parent: Option<&str>,
        out: &mut Vec<String>,
    ) -> Result<PathBuf, WorktreeError> {
        if !branch_name_is_valid(branch) {
            return Err(WorktreeError::InvalidBranch(branch.to_string()));
        }
        let path = self.worktree_path(branch);
        if path.exists() {
            return Err(WorktreeError::Git {
                command: "worktree add".into(),
                message: format!("{} already exists", path.display()),
            });
        }
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let default_branch = self.default_branch();
        let base = parent.filter(|p| !p.is_empty()).unwrap_or(&default_branch);
        let path_arg = path.to_string_lossy().to_string();

        match self.run_git(
            &self.repo_root,
            &["worktree", "add", "-b", branch, &path_arg, base],
            out,
        ) {
            Ok(_) => {
                info!(%branch, path = %path.display(), "worktree created");
                Ok(path)
            }
            Err(e) => {
                warn!(%branch, error = %e, "worktree add failed, cleaning up");
                let mut cleanup = Vec::new();
                if path.exists() {
                    let _ = std::fs::remove_dir_all(&path);
                }
                let _ = self.run_git(&self.repo_root, &["worktree", "prune"], &mut cleanup);
                let _ = self.run_git(&self.repo_root, &["branch", "-D", branch], &mut cleanup);
                Err(e)
            }
        }
    }

    fn remove(
        &self,
        branch: &str,
        delete_branch: bool,
        out: &mut Vec<String>,
    ) -> Result<(), WorktreeError> {
        let worktree = self.find(branch)?;
        if worktree.is_main {
            return Err(WorktreeError::InvalidBranch(branch.to_string()));
        }
        let path_arg = worktree.path.to_string_lossy().to_string();
        self.run_git(&self.repo_root, &["worktree", "remove", "--force", &path_arg], out)?;
        if delete_branch {
            self.run_git(&self.repo_root, &["branch", "-D", branch], out)?;
        }
        info!(%branch, delete_branch, "worktree removed");
        Ok(())
    }

    fn sync(&self, branch: Option<&str>, out: &mut Vec<String>) -> Result<(), WorktreeError> {
        self.run_git(&self.repo_root, &["fetch", "origin", "--prune"], out)?;
        let upstream = format!("origin/{}", self.default_branch());

        let targets: Vec<Worktree> = match branch {
            Some(b) => vec![self.find(b)?],
            None => self.list()?.into_iter().filter(|wt| !wt.is_main).collect(),
        };

        let total = targets.len();
        let mut failed = 0;
        for wt in targets {
            out.push(format!("Syncing {} onto {}", wt.name(), upstream));
            if let Err(e) = self.run_git(&wt.path, &["rebase", &upstream], out) {
                failed += 1;
                warn!(branch = %wt.branch, error = %e, "rebase failed");
                out.push(format!("  {} failed: {}", wt.name(), e));
                let _ = self.run_git(&wt.path, &["rebase", "--abort"], out);
            }
        }

        if failed > 0 {
            return Err(WorktreeError::PartialSync { failed, total });
        }
        debug!(total, "sync finished");
        Ok(())
    }

    fn merge_pr_for_branch(
        &self,
        branch: &str,
        options: MergeOptions,
        out: &mut Vec<String>,
    ) -> Result<u64, WorktreeError> {
        let number = self.run_gh(&["pr", "view", branch, "--json", "number", "--jq", ".number"], out)?;
        let number: u64 = number.trim().parse().map_err(|_| WorktreeError::GitHub {
            command: "pr view".into(),
            message: format!("no PR number for {}", branch),
        })?;

        let number_arg = number.to_string();
        let mut args = vec!["pr", "merge", number_arg.as_str(), options.method.gh_flag()];
        if !options.keep_branch {
            args.push("--delete-branch");
        }
        self.run_gh(&args, out)?;
        info!(%branch, number, method = options.method.label(), "PR merged");
        Ok(number)
    }

    fn default_branch(&self) -> String {
        let mut scratch = Vec::new();
        self.run_git(
            &self.repo_root,
            &["symbolic-ref", "--short", "refs/remotes/origin/HEAD"],
            &mut scratch,
        )
        .ok()
        .map(|s| s.trim().trim_start_matches("origin/").to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "main".to_string())
    }

    fn reset_to_default(&self, branch: &str, out: &mut Vec<String>) -> Result<(), WorktreeError> {
        let worktree = self.find(branch)?;
        let default_branch = self.default_branch();
        self.run_git(&worktree.path, &["fetch", "origin", &default_branch], out)?;
        let target = format!("origin/{}", default_branch);
        self.run_git(&worktree.path, &["reset", "--hard", &target], out)?;
        info!(%branch, %target, "worktree reset");
        Ok(())
    }
}

/// Parse `git worktree list --porcelain`. The first entry is the main
/// worktree; bare entries are skipped.
pub fn parse_worktree_list(stdout: &str) -> Vec<Worktree> {
    let mut worktrees = Vec::new();
    for (index, block) in stdout.split("\n\n").enumerate() {
        let mut path = None;
        let mut head = String::new();
        let mut branch = String::new();
        let mut bare = false;
        for line in block.lines() {
            if let Some(p) = line.strip_prefix("worktree ") {
                path = Some(PathBuf::from(p));
            } else if let Some(h) = line.strip_prefix("HEAD ") {
                head = h.to_string();
            } else if let Some(b) = line.strip_prefix("branch ") {
                branch = b.trim_start_matches("refs/heads/").to_string();
            } else if line == "bare" {
                bare = true;
            }
        }
        let Some(path) = path else { continue };
        if bare {
            continue;
        }
        worktrees.push(Worktree {
            path,
            branch,
            head,
            is_main: index == 0,
        });
    }
    worktrees
}

fn branch_name_is_valid(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && !name.starts_with('/')
        && !name.ends_with('/')
        && !name.ends_with(".lock")
        && !name.contains("..")
        && !name.contains("//")
        && !name
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || "~^:?*[\\".contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_porcelain_worktree_list() {
        let out = "worktree /src/app\nHEAD 1111\nbranch refs/heads/main\n\n\
                   worktree /src/app-worktrees/feat-login\nHEAD 2222\nbranch refs/heads/feat/login\n\n\
                   worktree /src/app-worktrees/detached\nHEAD 3333\ndetached\n";
        let list = parse_worktree_list(out);
        assert_eq!(list.len(), 3);
        assert!(list[0].is_main);
        assert_eq!(list[1].branch, "feat/login");
        assert!(!list[1].is_main);
        assert_eq!(list[2].branch, "");
        assert_eq!(list[2].name(), "detached");
    }

    #[test]
    fn bare_entry_is_skipped() {
        let out = "worktree /src/app.git\nbare\n\nworktree /src/wt/a\nHEAD 1\nbranch refs/heads/a\n";
        let list = parse_worktree_list(out);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].branch, "a");
    }

    #[test]
    fn branch_validation() {
        assert!(branch_name_is_valid("feat/login-form"));
        assert!(!branch_name_is_valid(""));
        assert!(!branch_name_is_valid("has space"));
        assert!(!branch_name_is_valid("-x"));
        assert!(!branch_name_is_valid("a..b"));
        assert!(!branch_name_is_valid("x.lock"));
    }
}
