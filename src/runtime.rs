//! Executes the effects the reducer asks for. Every effect runs on its own
//! thread and posts exactly one event back; `Quit` is handled by the caller.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Instant;

use tracing::{debug, warn};

use crate::config::{load_settings, save_settings};
use crate::data::github::{list_prs, prs_by_branch};
use crate::data::hooks::run_hooks;
use crate::data::router::TaskRouter;
use crate::data::sessions::SessionManager;
use crate::data::worktree::{MergeOptions, WorktreeManager};
use crate::data::{git, tmux};
use crate::effect::Effect;
use crate::event::{AppEvent, SessionAction};
use crate::model::git::GitSummary;
use crate::model::worktree::{WorktreeOpKind, WorktreeOpResult};

#[derive(Clone)]
pub struct Runtime {
    worktrees: Arc<dyn WorktreeManager>,
    sessions: Arc<dyn SessionManager>,
    router: Arc<dyn TaskRouter>,
    repo_root: PathBuf,
    settings_path: PathBuf,
    tx: mpsc::Sender<AppEvent>,
}

impl Runtime {
    pub fn new(
        worktrees: Arc<dyn WorktreeManager>,
        sessions: Arc<dyn SessionManager>,
        router: Arc<dyn TaskRouter>,
        repo_root: PathBuf,
        settings_path: PathBuf,
        tx: mpsc::Sender<AppEvent>,
    ) -> Self {
        Self {
            worktrees,
            sessions,
            router,
            repo_root,
            settings_path,
            tx,
        }
    }

    /// Run `effect` in the background; its result arrives on the channel.
    pub fn execute(&self, effect: Effect) {
        if effect == Effect::Quit {
            return;
        }
        debug!(?effect, "execute");
        let runtime = self.clone();
        thread::spawn(move || {
            if let Some(event) = runtime.run(effect) {
                let _ = runtime.tx.send(event);
            }
        });
    }

    /// Perform one effect synchronously and build the event that reports it.
    fn run(&self, effect: Effect) -> Option<AppEvent> {
        let event = match effect {
            Effect::Quit => return None,
            Effect::Schedule { after, timer } => {
                thread::sleep(after);
                AppEvent::TimerFired(timer, Instant::now())
            }
            Effect::LoadWorktrees => {
                AppEvent::WorktreesLoaded(self.worktrees.list().map_err(|e| e.to_string()))
            }
            Effect::LoadGitStatuses(targets) => AppEvent::GitStatusesLoaded(git_summaries(&targets)),
            Effect::LoadPrStatuses => AppEvent::PrStatusesLoaded(
                list_prs(&self.repo_root)
                    .map(prs_by_branch)
                    .map_err(|e| format!("{:#}", e)),
            ),
            Effect::LoadSessions => AppEvent::SessionsLoaded(self.sessions.all_sessions()),
            Effect::CreateWorktree {
                branch,
                parent,
                hooks,
                auto_prompt,
            } => AppEvent::WorktreeOpFinished {
                kind: WorktreeOpKind::Create,
                target: Some(branch.clone()),
                auto_prompt,
                result: create_worktree(self.worktrees.as_ref(), &branch, parent.as_deref(), &hooks),
            },
            Effect::DeleteWorktree {
                branch,
                path,
                delete_branch,
                hooks,
            } => {
                let result = delete_worktree(
                    self.worktrees.as_ref(),
                    &branch,
                    &path,
                    delete_branch,
                    &hooks,
                );
                if result.succeeded() {
                    self.retire_sessions(&path);
                }
                AppEvent::WorktreeOpFinished {
                    kind: WorktreeOpKind::Delete,
                    target: Some(branch),
                    auto_prompt: None,
                    result,
                }
            }
            Effect::SyncWorktrees { branch } => {
                let mut lines = Vec::new();
                let result = match self.worktrees.sync(branch.as_deref(), &mut lines) {
                    Ok(()) => WorktreeOpResult {
                        lines,
                        ..WorktreeOpResult::default()
                    },
                    Err(e) => WorktreeOpResult::failed(lines, e.to_string()),
                };
                AppEvent::WorktreeOpFinished {
                    kind: WorktreeOpKind::Sync,
                    target: branch,
                    auto_prompt: None,
                    result,
                }
            }
            Effect::ResetWorktree { branch } => {
                let mut lines = Vec::new();
                let result = match self.worktrees.reset_to_default(&branch, &mut lines) {
                    Ok(()) => WorktreeOpResult {
                        lines,
                        ..WorktreeOpResult::default()
                    },
                    Err(e) => WorktreeOpResult::failed(lines, e.to_string()),
                };
                AppEvent::WorktreeOpFinished {
                    kind: WorktreeOpKind::Reset,
                    target: Some(branch),
                    auto_prompt: None,
                    result,
                }
            }
            Effect::MergePr { branch, method } => {
                let mut lines = Vec::new();
                // Branch cleanup is offered after the merge, so gh must not delete it.
                let options = MergeOptions {
                    method,
                    keep_branch: true,
                };
                let result = self
                    .worktrees
                    .merge_pr_for_branch(&branch, options, &mut lines)
                    .map_err(|e| e.to_string());
                AppEvent::MergeFinished {
                    branch,
                    result,
                    lines,
                }
            }
            Effect::StartSession {
                kind,
                worktree_path,
                prompt,
                model,
            } => {
                let result = self
                    .sessions
                    .start_session(kind, &worktree_path, &prompt, &model)
                    .map_err(|e| e.to_string());
                AppEvent::SessionStarted {
                    kind,
                    worktree_path,
                    result,
                }
            }
            Effect::StopSession { id } => AppEvent::SessionActionFinished {
                action: SessionAction::Stop,
                result: self.sessions.stop_session(&id).map_err(|e| e.to_string()),
                id,
            },
            Effect::SendFollowUp { id, text } => AppEvent::SessionActionFinished {
                action: SessionAction::FollowUp,
                result: self
                    .sessions
                    .send_follow_up(&id, &text)
                    .map_err(|e| e.to_string()),
                id,
            },
            Effect::CompleteSession { id } => AppEvent::SessionActionFinished {
                action: SessionAction::Complete,
                result: self
                    .sessions
                    .complete_session(&id)
                    .map_err(|e| e.to_string()),
                id,
            },
            Effect::RouteTask {
                request,
                prompt,
                worktrees,
            } => {
                let default_branch = self.worktrees.default_branch();
                AppEvent::RoutingFinished {
                    request,
                    result: self
                        .router
                        .route(&prompt, &worktrees, &default_branch)
                        .map_err(|e| e.to_string()),
                }
            }
            Effect::SaveSettings(settings) => AppEvent::SettingsSaved(
                save_settings(&self.settings_path, &settings).map_err(|e| e.to_string()),
            ),
            Effect::ReloadSettings => AppEvent::SettingsLoaded(
                load_settings(&self.settings_path).map_err(|e| e.to_string()),
            ),
            Effect::OpenTmuxWindow { name, path } => AppEvent::ExternalFinished {
                label: "tmux window".to_string(),
                result: tmux::open_window(&name, &path).map_err(|e| format!("{:#}", e)),
            },
            Effect::OpenEditor { name, path } => AppEvent::ExternalFinished {
                label: "editor".to_string(),
                result: tmux::open_editor(&name, &path).map_err(|e| format!("{:#}", e)),
            },
        };
        Some(event)
    }

    /// Idle sessions of a removed worktree can never resume; complete them.
    fn retire_sessions(&self, path: &Path) {
        for session in self.sessions.sessions_for_worktree(path) {
            if session.status.is_terminal() {
                continue;
            }
            if let Err(e) = self.sessions.complete_session(&session.id) {
                warn!(session = %session.id, error = %e, "failed to retire session");
            }
        }
    }
}

/// Git half of every worktree's status. A worktree whose status cannot be
/// read is left out so its previous value stays on screen.
fn git_summaries(targets: &[(String, PathBuf)]) -> HashMap<String, GitSummary> {
    let mut summaries = HashMap::new();
    for (name, path) in targets {
        match git::load_summary(path) {
            Ok(summary) => {
                summaries.insert(name.clone(), summary);
            }
            Err(e) => warn!(worktree = %name, error = %e, "git status failed"),
        }
    }
    summaries
}

/// Create the worktree, then run the create hooks inside it. Hook failures
/// only produce a warning; the worktree stays.
fn create_worktree(
    manager: &dyn WorktreeManager,
    branch: &str,
    parent: Option<&str>,
    hooks: &[String],
) -> WorktreeOpResult {
    let mut lines = Vec::new();
    match manager.new_atomic(branch, parent, &mut lines) {
        Ok(path) => {
            let warning = run_hooks("create", hooks, branch, &path, &mut lines);
            WorktreeOpResult {
                lines,
                branch: Some(branch.to_string()),
                warning,
                error: None,
            }
        }
        Err(e) => WorktreeOpResult::failed(lines, e.to_string()),
    }
}

/// Run the delete hooks while the worktree still exists, then remove it.
fn delete_worktree(
    manager: &dyn WorktreeManager,
    branch: &str,
    path: &Path,
    delete_branch: bool,
    hooks: &[String],
) -> WorktreeOpResult {
    let mut lines = Vec::new();
    let warning = if path.is_dir() {
        run_hooks("delete", hooks, branch, path, &mut lines)
    } else {
        None
    };
    match manager.remove(branch, delete_branch, &mut lines) {
        Ok(()) => WorktreeOpResult {
            lines,
            warning,
            ..WorktreeOpResult::default()
        },
        Err(e) => WorktreeOpResult::failed(lines, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::error::WorktreeError;
    use crate::model::worktree::Worktree;

    /// Records calls and writes a marker line into the shared log so the
    /// order relative to hook output is observable.
    #[derive(Default)]
    struct FakeManager {
        calls: Mutex<Vec<String>>,
        fail_create: bool,
        created_at: PathBuf,
    }

    impl WorktreeManager for FakeManager {
        fn list(&self) -> Result<Vec<Worktree>, WorktreeError> {
            Ok(Vec::new())
        }

        fn new_atomic(
            &self,
            branch: &str,
            _parent: Option<&str>,
            out: &mut Vec<String>,
        ) -> Result<PathBuf, WorktreeError> {
            out.push(format!("new {}", branch));
            if self.fail_create {
                return Err(WorktreeError::InvalidBranch(branch.to_string()));
            }
            Ok(self.created_at.clone())
        }

        fn remove(
            &self,
            branch: &str,
            delete_branch: bool,
            out: &mut Vec<String>,
        ) -> Result<(), WorktreeError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(format!("remove {} {}", branch, delete_branch));
            }
            out.push(format!("removed {}", branch));
            Ok(())
        }

        fn sync(&self, _branch: Option<&str>, _out: &mut Vec<String>) -> Result<(), WorktreeError> {
            Ok(())
        }

        fn merge_pr_for_branch(
            &self,
            _branch: &str,
            _options: MergeOptions,
            _out: &mut Vec<String>,
        ) -> Result<u64, WorktreeError> {
            Ok(1)
        }

        fn default_branch(&self) -> String {
            "main".to_string()
        }

        fn reset_to_default(&self, _branch: &str, _out: &mut Vec<String>) -> Result<(), WorktreeError> {
            Ok(())
        }
    }

    #[test]
    fn delete_hooks_run_before_removal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = FakeManager::default();
        let hooks = vec!["echo bye-$WT_BRANCH".to_string()];

        let result = delete_worktree(&manager, "feat", dir.path(), true, &hooks);
        assert!(result.succeeded());
        let hook_at = result.lines.iter().position(|l| l.contains("bye-feat"));
        let removed_at = result.lines.iter().position(|l| l == "removed feat");
        assert!(hook_at.is_some());
        assert!(hook_at < removed_at);
        assert_eq!(
            manager.calls.lock().map(|c| c.clone()).unwrap_or_default(),
            vec!["remove feat true".to_string()]
        );
    }

    #[test]
    fn failed_hook_still_removes_and_warns() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = FakeManager::default();
        let hooks = vec!["exit 3".to_string()];

        let result = delete_worktree(&manager, "feat", dir.path(), false, &hooks);
        assert!(result.succeeded());
        assert_eq!(
            result.warning.as_deref(),
            Some("delete hook failed: exit 3")
        );
        assert!(result.lines.iter().any(|l| l == "removed feat"));
    }

    #[test]
    fn create_reports_branch_only_on_success() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = FakeManager {
            created_at: dir.path().to_path_buf(),
            ..FakeManager::default()
        };
        let ok = create_worktree(&manager, "feat", None, &["true".to_string()]);
        assert_eq!(ok.created_branch(), Some("feat"));
        assert_eq!(ok.warning, None);

        let failing = FakeManager {
            fail_create: true,
            ..FakeManager::default()
        };
        let failed = create_worktree(&failing, "feat", None, &["true".to_string()]);
        assert_eq!(failed.created_branch(), None);
        assert!(failed.error.is_some());
        // Hooks never run for a worktree that was not created.
        assert!(!failed.lines.iter().any(|l| l == "$ true"));
    }
}
