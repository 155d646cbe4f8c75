use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::update::update;
use super::{App, TaskStage};
use crate::config::{ProjectConfig, Settings};
use crate::effect::{Effect, Timer};
use crate::event::AppEvent;
use crate::model::confirm::{MergeMethod, PendingAction};
use crate::model::focus::{FocusMode, Pane};
use crate::model::git::{GitChanges, GitSummary};
use crate::model::github::PullRequest;
use crate::model::routing::{RoutingAction, TaskRoutingProposal};
use crate::model::session::{SessionInfo, SessionKind, SessionStatus};
use crate::model::toast::ToastLevel;
use crate::model::worktree::{
    PendingWorktreeSelect, Worktree, WorktreeOpKind, WorktreeOpResult, WorktreeStatus,
};

fn worktree(branch: &str, path: &str, is_main: bool) -> Worktree {
    Worktree {
        path: PathBuf::from(path),
        branch: branch.to_string(),
        head: "abc123".to_string(),
        is_main,
    }
}

fn test_app() -> App {
    let mut app = App::new(
        PathBuf::from("/repo"),
        ProjectConfig::default(),
        Settings::default(),
        None,
    );
    app.worktrees = vec![
        worktree("main", "/repo", true),
        worktree("feat", "/repo-worktrees/feat", false),
    ];
    app
}

fn session(id: &str, path: &str, kind: SessionKind, status: SessionStatus) -> SessionInfo {
    SessionInfo {
        id: id.to_string(),
        kind,
        worktree_path: PathBuf::from(path),
        status,
        model: "sonnet".to_string(),
        prompt: format!("task for {}", id),
        started_at: Local::now(),
        output: (0..100).map(|i| format!("line {}", i)).collect(),
    }
}

fn pr(number: u64, state: &str) -> PullRequest {
    PullRequest {
        number,
        title: "Add feature".to_string(),
        state: state.to_string(),
        updated_at: "2026-01-01T00:00:00Z".to_string(),
        head_ref_name: "feat".to_string(),
        is_draft: false,
        review_decision: Some("APPROVED".to_string()),
    }
}

fn dirty(files: usize) -> GitChanges {
    GitChanges {
        unstaged: files,
        ..GitChanges::default()
    }
}

fn key(code: KeyCode) -> AppEvent {
    AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn press(app: &mut App, code: KeyCode) -> Vec<Effect> {
    update(app, key(code))
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        press(app, KeyCode::Char(c));
    }
}

fn latest_toast(app: &App) -> String {
    app.toasts
        .latest()
        .map(|t| t.message.clone())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Quit
// ---------------------------------------------------------------------------

#[test]
fn repo_name_is_taken_from_root_dir() {
    let app = App::new(
        PathBuf::from("/src/arbor.git"),
        ProjectConfig::default(),
        Settings::default(),
        None,
    );
    assert_eq!(app.repo_name, "arbor");
}

#[test]
fn quit_without_sessions_is_immediate() {
    let mut app = test_app();
    let effects = press(&mut app, KeyCode::Char('q'));
    assert!(effects.contains(&Effect::Quit));
}

#[test]
fn quit_with_running_session_needs_second_key() {
    let mut app = test_app();
    app.sessions = vec![session(
        "s1",
        "/repo-worktrees/feat",
        SessionKind::Builder,
        SessionStatus::Running,
    )];

    let effects = press(&mut app, KeyCode::Char('q'));
    assert!(!effects.contains(&Effect::Quit));
    assert!(app.pending_quit);
    assert!(latest_toast(&app).starts_with("1 session is still running"));

    let effects = press(&mut app, KeyCode::Char('x'));
    assert!(!effects.contains(&Effect::Quit));
    assert!(!app.pending_quit);
    assert_eq!(latest_toast(&app), "Quit cancelled");

    press(&mut app, KeyCode::Char('q'));
    let effects = press(&mut app, KeyCode::Char('y'));
    assert!(effects.contains(&Effect::Quit));
}

#[test]
fn ctrl_c_quits_from_any_layer() {
    let mut app = test_app();
    app.set_focus(FocusMode::Help);
    let effects = update(
        &mut app,
        AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
    );
    assert_eq!(effects, vec![Effect::Quit]);
}

// ---------------------------------------------------------------------------
// Focus layering
// ---------------------------------------------------------------------------

#[test]
fn help_swallows_normal_bindings() {
    let mut app = test_app();
    press(&mut app, KeyCode::Char('?'));
    assert_eq!(app.focus, FocusMode::Help);

    let effects = press(&mut app, KeyCode::Char('q'));
    assert!(effects.is_empty());
    assert_eq!(app.focus, FocusMode::Output);
}

#[test]
fn input_owns_keys_until_submitted() {
    let mut app = test_app();
    press(&mut app, KeyCode::Char('n'));
    assert_eq!(app.focus, FocusMode::Input);

    type_text(&mut app, "q-fix");
    let effects = press(&mut app, KeyCode::Enter);
    assert_eq!(app.focus, FocusMode::Output);
    assert!(effects.contains(&Effect::CreateWorktree {
        branch: "q-fix".to_string(),
        parent: None,
        hooks: Vec::new(),
        auto_prompt: None,
    }));
    assert_eq!(app.op_in_flight, Some(WorktreeOpKind::Create));
}

#[test]
fn empty_input_submits_nothing() {
    let mut app = test_app();
    press(&mut app, KeyCode::Char('n'));
    let effects = press(&mut app, KeyCode::Enter);
    assert!(effects.is_empty());
    assert!(app.input.is_none());
}

// ---------------------------------------------------------------------------
// Confirmation prompts
// ---------------------------------------------------------------------------

#[test]
fn confirm_ignores_unknown_keys_then_runs_choice() {
    let mut app = test_app();
    app.select_worktree("feat");
    press(&mut app, KeyCode::Char('d'));
    assert_eq!(app.focus, FocusMode::Confirm);

    let effects = press(&mut app, KeyCode::Char('x'));
    assert!(effects.is_empty());
    assert!(app.confirm.is_some());

    let effects = press(&mut app, KeyCode::Char('d'));
    assert!(app.confirm.is_none());
    assert_eq!(app.focus, FocusMode::Output);
    assert!(effects.contains(&Effect::DeleteWorktree {
        branch: "feat".to_string(),
        path: PathBuf::from("/repo-worktrees/feat"),
        delete_branch: true,
        hooks: Vec::new(),
    }));
}

#[test]
fn esc_without_cancel_action_does_nothing() {
    let mut app = test_app();
    app.select_worktree("feat");
    press(&mut app, KeyCode::Char('d'));
    let effects = press(&mut app, KeyCode::Esc);
    assert!(effects.is_empty());
    assert!(app.confirm.is_none());
    assert_eq!(app.op_in_flight, None);
}

#[test]
fn main_worktree_cannot_be_deleted() {
    let mut app = test_app();
    app.select_worktree("main");
    press(&mut app, KeyCode::Char('d'));
    assert!(app.confirm.is_none());
    assert_eq!(latest_toast(&app), "The main worktree cannot be deleted");
}

// ---------------------------------------------------------------------------
// Worktree operations
// ---------------------------------------------------------------------------

#[test]
fn second_op_is_refused_while_one_runs() {
    let mut app = test_app();
    let effects = press(&mut app, KeyCode::Char('G'));
    assert!(effects.contains(&Effect::SyncWorktrees { branch: None }));

    let effects = press(&mut app, KeyCode::Char('G'));
    assert!(!effects.iter().any(|e| matches!(e, Effect::SyncWorktrees { .. })));
    assert_eq!(latest_toast(&app), "Syncing already in progress");
}

#[test]
fn created_worktree_is_selected_once_listed() {
    let mut app = test_app();
    app.op_in_flight = Some(WorktreeOpKind::Create);
    let effects = update(
        &mut app,
        AppEvent::WorktreeOpFinished {
            kind: WorktreeOpKind::Create,
            target: Some("login".to_string()),
            auto_prompt: Some("fix login".to_string()),
            result: WorktreeOpResult {
                branch: Some("login".to_string()),
                ..WorktreeOpResult::default()
            },
        },
    );
    assert_eq!(app.op_in_flight, None);
    assert!(effects.contains(&Effect::LoadWorktrees));
    assert_eq!(
        app.pending_select.as_ref().map(|p| p.branch.as_str()),
        Some("login")
    );

    // A list fetched before the create landed keeps the marker.
    let stale = app.worktrees.clone();
    update(&mut app, AppEvent::WorktreesLoaded(Ok(stale.clone())));
    assert!(app.pending_select.is_some());

    let mut fresh = stale;
    fresh.push(worktree("login", "/repo-worktrees/login", false));
    let effects = update(&mut app, AppEvent::WorktreesLoaded(Ok(fresh)));
    assert!(app.pending_select.is_none());
    assert_eq!(app.selected.as_deref(), Some("login"));
    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::StartSession { kind: SessionKind::Planner, prompt, worktree_path, .. }
            if prompt == "fix login" && worktree_path == &PathBuf::from("/repo-worktrees/login")
    )));
}

#[test]
fn failed_create_and_other_ops_leave_no_pending_select() {
    let mut app = test_app();
    app.pending_select = Some(PendingWorktreeSelect {
        branch: "routed".to_string(),
        prompt: Some("queued task".to_string()),
    });
    update(
        &mut app,
        AppEvent::WorktreeOpFinished {
            kind: WorktreeOpKind::Create,
            target: Some("login".to_string()),
            auto_prompt: None,
            result: WorktreeOpResult {
                branch: Some("login".to_string()),
                error: Some("already exists".to_string()),
                ..WorktreeOpResult::default()
            },
        },
    );
    assert!(app.pending_select.is_none());
    assert_eq!(latest_toast(&app), "Create login failed: already exists");

    app.pending_select = Some(PendingWorktreeSelect {
        branch: "old".to_string(),
        prompt: None,
    });
    update(
        &mut app,
        AppEvent::WorktreeOpFinished {
            kind: WorktreeOpKind::Sync,
            target: None,
            auto_prompt: None,
            result: WorktreeOpResult::default(),
        },
    );
    assert!(app.pending_select.is_none());
}

#[test]
fn hook_warning_is_shown_after_success() {
    let mut app = test_app();
    update(
        &mut app,
        AppEvent::WorktreeOpFinished {
            kind: WorktreeOpKind::Create,
            target: Some("login".to_string()),
            auto_prompt: None,
            result: WorktreeOpResult {
                branch: Some("login".to_string()),
                warning: Some("create hook failed: make deps".to_string()),
                ..WorktreeOpResult::default()
            },
        },
    );
    let levels: Vec<ToastLevel> = app.toasts.iter().map(|t| t.level).collect();
    assert_eq!(levels, vec![ToastLevel::Warning, ToastLevel::Success]);
}

#[test]
fn vanished_selection_falls_back_to_first() {
    let mut app = test_app();
    app.select_worktree("feat");
    let effects = update(
        &mut app,
        AppEvent::WorktreesLoaded(Ok(vec![worktree("main", "/repo", true)])),
    );
    assert_eq!(app.selected.as_deref(), Some("main"));
    assert!(effects.contains(&Effect::LoadGitStatuses(vec![(
        "main".to_string(),
        PathBuf::from("/repo")
    )])));
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

fn merge_ready_app(git: GitSummary, pr_state: &str) -> App {
    let mut app = test_app();
    app.select_worktree("feat");
    app.statuses.insert(
        "feat".to_string(),
        WorktreeStatus {
            git: Some(git),
            pr: Some(pr(42, pr_state)),
        },
    );
    app.prs_loaded = true;
    app
}

#[test]
fn merge_requires_loaded_status() {
    let mut app = test_app();
    app.select_worktree("feat");
    press(&mut app, KeyCode::Char('m'));
    assert_eq!(
        latest_toast(&app),
        "Worktree feat status not loaded yet; try again shortly"
    );
}

#[test]
fn merge_waits_for_first_pr_fetch() {
    let mut app = test_app();
    app.select_worktree("feat");
    let mut git = HashMap::new();
    git.insert("feat".to_string(), GitSummary::default());
    update(&mut app, AppEvent::GitStatusesLoaded(git));

    press(&mut app, KeyCode::Char('m'));
    assert_eq!(
        latest_toast(&app),
        "Worktree feat status not loaded yet; try again shortly"
    );

    update(&mut app, AppEvent::PrStatusesLoaded(Ok(HashMap::new())));
    press(&mut app, KeyCode::Char('m'));
    assert_eq!(latest_toast(&app), "No PR found for branch feat");
}

#[test]
fn merge_guard_order_reports_pr_state_first() {
    let git = GitSummary {
        changes: dirty(2),
        ahead: 1,
    };
    let mut app = merge_ready_app(git, "MERGED");
    press(&mut app, KeyCode::Char('m'));
    assert_eq!(latest_toast(&app), "PR #42 is MERGED");
    assert!(app.confirm.is_none());
}

#[test]
fn merge_refuses_dirty_then_unpushed() {
    let mut app = merge_ready_app(
        GitSummary {
            changes: dirty(2),
            ahead: 0,
        },
        "OPEN",
    );
    press(&mut app, KeyCode::Char('m'));
    assert_eq!(
        latest_toast(&app),
        "Worktree has uncommitted changes (2 files); commit or stash first"
    );

    let mut app = merge_ready_app(
        GitSummary {
            changes: GitChanges::default(),
            ahead: 3,
        },
        "OPEN",
    );
    press(&mut app, KeyCode::Char('m'));
    assert_eq!(
        latest_toast(&app),
        "Branch has 3 unpushed commits; push before merging"
    );
}

#[test]
fn merge_blocked_by_active_session() {
    let mut app = merge_ready_app(GitSummary::default(), "OPEN");
    app.sessions = vec![session(
        "s1",
        "/repo-worktrees/feat",
        SessionKind::Builder,
        SessionStatus::Running,
    )];
    press(&mut app, KeyCode::Char('m'));
    assert_eq!(
        latest_toast(&app),
        "builder session is running in feat; wait for it or stop it first"
    );
}

#[test]
fn confirmed_merge_dispatches_method() {
    let mut app = merge_ready_app(GitSummary::default(), "OPEN");
    press(&mut app, KeyCode::Char('m'));
    let confirm = app.confirm.as_ref().map(|c| c.prompt.message.clone());
    assert_eq!(confirm.as_deref(), Some("Merge PR #42 (feat) [APPROVED]?"));

    let effects = press(&mut app, KeyCode::Char('s'));
    assert!(effects.contains(&Effect::MergePr {
        branch: "feat".to_string(),
        method: MergeMethod::Squash,
    }));
    assert!(app.merge_in_flight);
}

#[test]
fn dismissing_post_merge_prompt_still_refreshes() {
    let mut app = test_app();
    app.merge_in_flight = true;
    update(
        &mut app,
        AppEvent::MergeFinished {
            branch: "feat".to_string(),
            result: Ok(42),
            lines: vec!["$ gh pr merge 42 --squash".to_string()],
        },
    );
    assert!(!app.merge_in_flight);
    assert!(matches!(
        app.confirm.as_ref().map(|c| &c.on_confirm),
        Some(PendingAction::PostMerge { .. })
    ));

    let effects = press(&mut app, KeyCode::Esc);
    assert!(app.confirm.is_none());
    assert!(effects.contains(&Effect::LoadWorktrees));
    assert!(effects.contains(&Effect::LoadPrStatuses));
    assert!(!effects.iter().any(|e| matches!(e, Effect::DeleteWorktree { .. })));
}

fn merged(app: &mut App, pr_number: u64) -> Vec<Effect> {
    update(
        app,
        AppEvent::MergeFinished {
            branch: "feat".to_string(),
            result: Ok(pr_number),
            lines: Vec::new(),
        },
    )
}

#[test]
fn post_merge_prompt_waits_for_open_editor() {
    let mut app = test_app();
    press(&mut app, KeyCode::Char('R'));
    assert_eq!(app.focus, FocusMode::RepoSettings);
    type_text(&mut app, "npm install");

    merged(&mut app, 7);
    assert_eq!(app.focus, FocusMode::RepoSettings);
    assert!(app.confirm.is_none());
    assert!(app.repo_settings.is_some());

    press(&mut app, KeyCode::Esc);
    assert!(app.repo_settings.is_none());
    assert_eq!(app.focus, FocusMode::Confirm);
    assert!(matches!(
        app.confirm.as_ref().map(|c| &c.on_confirm),
        Some(PendingAction::PostMerge { .. })
    ));
}

#[test]
fn post_merge_prompt_keeps_half_typed_input() {
    let mut app = test_app();
    press(&mut app, KeyCode::Char('n'));
    assert_eq!(app.focus, FocusMode::Input);
    type_text(&mut app, "half");

    merged(&mut app, 7);
    assert_eq!(app.focus, FocusMode::Input);
    assert_eq!(app.input.as_ref().map(|i| i.text()).as_deref(), Some("half"));
    assert!(app.confirm.is_none());
}

#[test]
fn post_merge_prompt_clears_pending_quit() {
    let mut app = test_app();
    app.sessions = vec![session(
        "s1",
        "/repo",
        SessionKind::Builder,
        SessionStatus::Running,
    )];
    press(&mut app, KeyCode::Char('q'));
    assert!(app.pending_quit);

    merged(&mut app, 7);
    assert_eq!(app.focus, FocusMode::Confirm);
    assert!(!app.pending_quit);

    press(&mut app, KeyCode::Esc);
    assert_eq!(app.focus, FocusMode::Output);
    press(&mut app, KeyCode::Char('?'));
    assert_eq!(app.focus, FocusMode::Help);
    assert_ne!(latest_toast(&app), "Quit cancelled");
}

#[test]
fn post_merge_delete_removes_branch() {
    let mut app = test_app();
    update(
        &mut app,
        AppEvent::MergeFinished {
            branch: "feat".to_string(),
            result: Ok(42),
            lines: Vec::new(),
        },
    );
    let effects = press(&mut app, KeyCode::Char('d'));
    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::DeleteWorktree { branch, delete_branch: true, .. } if branch == "feat"
    )));
}

// ---------------------------------------------------------------------------
// Status merging and timers
// ---------------------------------------------------------------------------

#[test]
fn status_halves_are_independent() {
    let mut app = test_app();
    let mut prs = HashMap::new();
    prs.insert("feat".to_string(), pr(7, "OPEN"));
    update(&mut app, AppEvent::PrStatusesLoaded(Ok(prs)));

    let mut git = HashMap::new();
    git.insert(
        "feat".to_string(),
        GitSummary {
            changes: GitChanges::default(),
            ahead: 2,
        },
    );
    update(&mut app, AppEvent::GitStatusesLoaded(git));

    let status = app.status_of("feat").cloned().unwrap_or_default();
    assert_eq!(status.pr_number(), 7);
    assert_eq!(status.git.map(|g| g.ahead), Some(2));

    update(&mut app, AppEvent::PrStatusesLoaded(Err("offline".to_string())));
    assert_eq!(app.status_of("feat").map(|s| s.pr_number()), Some(7));
}

#[test]
fn toast_expiry_is_scheduled_once() {
    let mut app = test_app();
    app.toast(ToastLevel::Info, "one");
    app.toast(ToastLevel::Info, "two");
    let effects = app.take_effects();
    let ticks = effects
        .iter()
        .filter(|e| matches!(e, Effect::Schedule { timer: Timer::ToastExpiry, .. }))
        .count();
    assert_eq!(ticks, 1);

    let later = Instant::now() + Duration::from_secs(60);
    let effects = update(&mut app, AppEvent::TimerFired(Timer::ToastExpiry, later));
    assert!(effects.is_empty());
    assert!(app.toasts.is_empty());
}

#[test]
fn status_polls_always_reschedule() {
    let mut app = test_app();
    let effects = update(
        &mut app,
        AppEvent::TimerFired(Timer::GitStatusPoll, Instant::now()),
    );
    assert!(effects.iter().any(|e| matches!(e, Effect::LoadGitStatuses(_))));
    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::Schedule { timer: Timer::GitStatusPoll, .. }
    )));
}

#[test]
fn session_poll_only_runs_while_sessions_are_active() {
    let mut app = test_app();
    let effects = update(
        &mut app,
        AppEvent::SessionsLoaded(vec![session(
            "s1",
            "/repo",
            SessionKind::Planner,
            SessionStatus::Running,
        )]),
    );
    assert!(app.session_poll_scheduled);
    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::Schedule { timer: Timer::SessionPoll, .. }
    )));

    let effects = update(
        &mut app,
        AppEvent::TimerFired(Timer::SessionPoll, Instant::now()),
    );
    assert_eq!(effects, vec![Effect::LoadSessions]);
    assert!(!app.session_poll_scheduled);

    let effects = update(
        &mut app,
        AppEvent::SessionsLoaded(vec![session(
            "s1",
            "/repo",
            SessionKind::Planner,
            SessionStatus::Idle,
        )]),
    );
    assert!(effects.is_empty());
}

// ---------------------------------------------------------------------------
// Sessions and panes
// ---------------------------------------------------------------------------

#[test]
fn scroll_offsets_survive_session_switches() {
    let mut app = test_app();
    app.sessions = vec![
        session("s1", "/repo-worktrees/feat", SessionKind::Planner, SessionStatus::Idle),
        session("s2", "/repo-worktrees/feat", SessionKind::Builder, SessionStatus::Idle),
    ];
    app.select_worktree("feat");
    assert_eq!(app.view().viewing.as_deref(), Some("s2"));

    press(&mut app, KeyCode::Char('1'));
    for _ in 0..3 {
        press(&mut app, KeyCode::Char('j'));
    }
    assert_eq!(app.view().scroll, 3);

    press(&mut app, KeyCode::Char('2'));
    assert_eq!(app.view().scroll, 0);
    press(&mut app, KeyCode::Char('1'));
    assert_eq!(app.view().scroll, 3);
}

#[test]
fn split_panes_keep_separate_views() {
    let mut app = test_app();
    app.sessions = vec![
        session("s1", "/repo-worktrees/feat", SessionKind::Planner, SessionStatus::Idle),
        session("s2", "/repo-worktrees/feat", SessionKind::Builder, SessionStatus::Idle),
    ];
    app.select_worktree("feat");

    press(&mut app, KeyCode::Tab);
    assert_eq!(app.active_pane, Pane::Left);

    press(&mut app, KeyCode::F(2));
    press(&mut app, KeyCode::Tab);
    assert_eq!(app.active_pane, Pane::Right);
    press(&mut app, KeyCode::Char('1'));
    assert_eq!(app.panes[1].viewing.as_deref(), Some("s1"));
    assert_eq!(app.panes[0].viewing.as_deref(), Some("s2"));

    press(&mut app, KeyCode::F(2));
    assert!(!app.split);
    assert_eq!(app.active_pane, Pane::Left);
}

#[test]
fn idle_planner_promotes_to_builder() {
    let mut app = test_app();
    app.sessions = vec![session(
        "s1",
        "/repo-worktrees/feat",
        SessionKind::Planner,
        SessionStatus::Idle,
    )];
    app.select_worktree("feat");

    let effects = press(&mut app, KeyCode::Char('a'));
    assert!(effects.contains(&Effect::CompleteSession {
        id: "s1".to_string()
    }));
    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::StartSession { kind: SessionKind::Builder, prompt, model, .. }
            if prompt.contains("task for s1") && model == "sonnet"
    )));
}

#[test]
fn follow_up_refused_while_running() {
    let mut app = test_app();
    app.sessions = vec![session(
        "s1",
        "/repo-worktrees/feat",
        SessionKind::Builder,
        SessionStatus::Running,
    )];
    app.select_worktree("feat");
    press(&mut app, KeyCode::Char('f'));
    assert!(app.input.is_none());
    assert_eq!(
        latest_toast(&app),
        "Session is still working; wait for it to go idle"
    );
}

#[test]
fn disabled_provider_blocks_sessions() {
    let mut app = test_app();
    app.settings.enabled_providers = Some(Vec::new());
    app.select_worktree("feat");
    press(&mut app, KeyCode::Char('p'));
    assert!(app.input.is_none());
    assert_eq!(latest_toast(&app), "Provider 'claude' is disabled in settings");
}

// ---------------------------------------------------------------------------
// Task routing
// ---------------------------------------------------------------------------

fn stage(app: &App) -> Option<TaskStage> {
    app.task_modal.as_ref().map(|m| m.stage.clone())
}

/// Answer the request the open modal is waiting on.
fn finish_routing(app: &mut App, result: Result<TaskRoutingProposal, String>) -> Vec<Effect> {
    let request = app.task_modal.as_ref().map_or(0, |m| m.request);
    update(app, AppEvent::RoutingFinished { request, result })
}

fn use_feat() -> TaskRoutingProposal {
    TaskRoutingProposal {
        action: RoutingAction::UseExisting,
        worktree: "feat".to_string(),
        parent: None,
        reasoning: String::new(),
    }
}

#[test]
fn routed_task_creates_worktree_with_prompt() {
    let mut app = test_app();
    press(&mut app, KeyCode::Char('N'));
    assert_eq!(app.focus, FocusMode::TaskModal);

    press(&mut app, KeyCode::Enter);
    assert_eq!(
        app.task_modal.as_ref().and_then(|m| m.error.clone()).as_deref(),
        Some("Describe the task first")
    );

    type_text(&mut app, "fix login");
    let effects = press(&mut app, KeyCode::Enter);
    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::RouteTask { prompt, .. } if prompt == "fix login"
    )));
    assert_eq!(stage(&app), Some(TaskStage::Routing));

    let proposal = TaskRoutingProposal {
        action: RoutingAction::CreateNew,
        worktree: "fix-login".to_string(),
        parent: None,
        reasoning: "new work".to_string(),
    };
    finish_routing(&mut app, Ok(proposal.clone()));
    assert_eq!(stage(&app), Some(TaskStage::Proposal(proposal)));

    let effects = press(&mut app, KeyCode::Enter);
    assert!(app.task_modal.is_none());
    assert_eq!(app.focus, FocusMode::Output);
    assert!(effects.contains(&Effect::CreateWorktree {
        branch: "fix-login".to_string(),
        parent: None,
        hooks: Vec::new(),
        auto_prompt: Some("fix login".to_string()),
    }));
}

#[test]
fn routing_failure_returns_to_prompt() {
    let mut app = test_app();
    press(&mut app, KeyCode::Char('N'));
    type_text(&mut app, "x");
    press(&mut app, KeyCode::Enter);
    finish_routing(&mut app, Err("router timed out".to_string()));
    assert_eq!(stage(&app), Some(TaskStage::Prompt));
    assert_eq!(
        app.task_modal.as_ref().and_then(|m| m.error.clone()).as_deref(),
        Some("router timed out")
    );
}

#[test]
fn routing_result_after_close_is_dropped() {
    let mut app = test_app();
    press(&mut app, KeyCode::Char('N'));
    type_text(&mut app, "x");
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Esc);
    let effects = update(
        &mut app,
        AppEvent::RoutingFinished {
            request: 1,
            result: Ok(use_feat()),
        },
    );
    assert!(effects.is_empty());
    assert!(app.task_modal.is_none());
}

#[test]
fn reopened_modal_ignores_earlier_routing_result() {
    let mut app = test_app();
    press(&mut app, KeyCode::Char('N'));
    type_text(&mut app, "task A");
    let effects = press(&mut app, KeyCode::Enter);
    let first = effects.iter().find_map(|e| match e {
        Effect::RouteTask { request, .. } => Some(*request),
        _ => None,
    });
    press(&mut app, KeyCode::Esc);

    press(&mut app, KeyCode::Char('N'));
    type_text(&mut app, "task B");
    press(&mut app, KeyCode::Enter);
    let second = app.task_modal.as_ref().map(|m| m.request);
    assert!(first.is_some());
    assert_ne!(first, second);

    update(
        &mut app,
        AppEvent::RoutingFinished {
            request: first.unwrap_or_default(),
            result: Ok(use_feat()),
        },
    );
    assert_eq!(stage(&app), Some(TaskStage::Routing));
    let effects = press(&mut app, KeyCode::Enter);
    assert!(!effects
        .iter()
        .any(|e| matches!(e, Effect::StartSession { .. })));

    finish_routing(&mut app, Ok(use_feat()));
    assert_eq!(stage(&app), Some(TaskStage::Proposal(use_feat())));
}

#[test]
fn use_existing_starts_planner_in_that_worktree() {
    let mut app = test_app();
    press(&mut app, KeyCode::Char('N'));
    type_text(&mut app, "more tests");
    press(&mut app, KeyCode::Enter);
    finish_routing(&mut app, Ok(use_feat()));
    let effects = press(&mut app, KeyCode::Enter);
    assert_eq!(app.selected.as_deref(), Some("feat"));
    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::StartSession { kind: SessionKind::Planner, prompt, model, .. }
            if prompt == "more tests" && model == "opus"
    )));
}

// ---------------------------------------------------------------------------
// Overlays
// ---------------------------------------------------------------------------

#[test]
fn theme_picker_saves_choice() {
    let mut app = test_app();
    press(&mut app, KeyCode::Char('T'));
    assert_eq!(app.focus, FocusMode::ThemePicker);
    press(&mut app, KeyCode::Char('j'));
    let effects = press(&mut app, KeyCode::Enter);
    assert_eq!(app.settings.theme, "gruvbox");
    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::SaveSettings(s) if s.theme == "gruvbox"
    )));
}

#[test]
fn repo_hooks_are_saved_trimmed() {
    let mut app = test_app();
    press(&mut app, KeyCode::Char('R'));
    assert_eq!(app.focus, FocusMode::RepoSettings);
    type_text(&mut app, "  npm install ");
    let effects = update(
        &mut app,
        AppEvent::Key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)),
    );
    assert_eq!(app.focus, FocusMode::Output);
    assert_eq!(
        app.settings.hooks_for("repo").on_worktree_create,
        vec!["npm install".to_string()]
    );
    assert!(effects.iter().any(|e| matches!(e, Effect::SaveSettings(_))));
}

#[test]
fn all_sessions_jumps_to_worktree() {
    let mut app = test_app();
    app.sessions = vec![
        session("s1", "/repo", SessionKind::Planner, SessionStatus::Idle),
        session("s2", "/repo-worktrees/feat", SessionKind::Builder, SessionStatus::Idle),
    ];
    update(
        &mut app,
        AppEvent::Key(KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL)),
    );
    assert_eq!(app.focus, FocusMode::AllSessions);
    press(&mut app, KeyCode::Char('j'));
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.selected.as_deref(), Some("feat"));
    assert_eq!(app.view().viewing.as_deref(), Some("s2"));
}

#[test]
fn unparsable_settings_reload_keeps_current() {
    let mut app = test_app();
    app.settings.theme = "nord".to_string();
    update(
        &mut app,
        AppEvent::SettingsLoaded(Err("expected value at line 1".to_string())),
    );
    assert_eq!(app.settings.theme, "nord");
    assert_eq!(
        app.toasts.latest().map(|t| t.level),
        Some(ToastLevel::Warning)
    );
}
