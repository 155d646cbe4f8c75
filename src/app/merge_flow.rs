use std::path::PathBuf;

use tracing::{info, warn};

use super::{worktree_flow, App};
use crate::effect::Effect;
use crate::model::confirm::{ConfirmPrompt, ConfirmRequest, MergeMethod, PendingAction};
use crate::model::toast::ToastLevel;

/// Everything the merge prompt needs once preflight passes.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct MergeCandidate {
    pub branch: String,
    pub pr_number: u64,
    pub review: Option<String>,
    pub draft: bool,
}

/// Ordered merge guards. The first failing guard's message is returned and
/// later guards are not consulted.
pub(super) fn preflight(app: &App) -> Result<MergeCandidate, String> {
    let wt = app
        .selected_worktree()
        .ok_or_else(|| "No worktree selected".to_string())?;
    let name = wt.name();

    let status = app
        .status_of(name)
        .filter(|s| s.git.is_some() && app.prs_loaded)
        .ok_or_else(|| format!("Worktree {} status not loaded yet; try again shortly", name))?;

    let pr_number = status.pr_number();
    if pr_number == 0 {
        return Err(format!("No PR found for branch {}", wt.branch));
    }
    let pr = status
        .pr
        .as_ref()
        .ok_or_else(|| format!("No PR found for branch {}", wt.branch))?;
    if pr.state != "OPEN" {
        return Err(format!("PR #{} is {}", pr_number, pr.state));
    }

    let git = status.git.as_ref().ok_or_else(|| {
        format!("Worktree {} status not loaded yet; try again shortly", name)
    })?;
    if git.is_dirty() {
        return Err(format!(
            "Worktree has uncommitted changes ({} files); commit or stash first",
            git.changes.total_files()
        ));
    }
    if git.ahead > 0 {
        let noun = if git.ahead == 1 { "commit" } else { "commits" };
        return Err(format!(
            "Branch has {} unpushed {}; push before merging",
            git.ahead, noun
        ));
    }

    if let Some(active) = app
        .sessions_for_path(&wt.path)
        .into_iter()
        .find(|s| s.status.is_active())
    {
        return Err(format!(
            "{} session is {} in {}; wait for it or stop it first",
            active.kind.label(),
            active.status.label(),
            name
        ));
    }

    Ok(MergeCandidate {
        branch: wt.branch.clone(),
        pr_number,
        review: pr.review_label().map(String::from),
        draft: pr.is_draft,
    })
}

pub(super) fn request_merge(app: &mut App) {
    if app.merge_in_flight {
        app.toast(ToastLevel::Info, "A merge is already in progress");
        return;
    }
    let candidate = match preflight(app) {
        Ok(c) => c,
        Err(reason) => {
            app.toast(ToastLevel::Info, reason);
            return;
        }
    };

    let mut message = format!("Merge PR #{} ({})", candidate.pr_number, candidate.branch);
    if let Some(review) = &candidate.review {
        message.push_str(&format!(" [{}]", review));
    }
    if candidate.draft {
        message.push_str(" [Draft PR]");
    }
    message.push('?');

    let prompt = ConfirmPrompt::new(
        message,
        &[('s', "squash"), ('r', "rebase"), ('m', "merge commit")],
    );
    app.show_confirm(ConfirmRequest::new(
        prompt,
        PendingAction::MergePr {
            branch: candidate.branch,
            pr_number: candidate.pr_number,
        },
    ));
}

pub(super) fn start_merge(app: &mut App, branch: String, pr_number: u64, method: MergeMethod) {
    if app.merge_in_flight {
        app.toast(ToastLevel::Info, "A merge is already in progress");
        return;
    }
    app.merge_in_flight = true;
    app.op_log.push(format!(
        "Merging PR #{} ({}) with {}…",
        pr_number,
        branch,
        method.label()
    ));
    app.emit(Effect::MergePr { branch, method });
}

pub(super) fn on_merge_finished(
    app: &mut App,
    branch: String,
    result: Result<u64, String>,
    lines: Vec<String>,
) {
    app.merge_in_flight = false;
    app.op_log.extend(lines);

    let pr_number = match result {
        Ok(n) => n,
        Err(e) => {
            warn!(%branch, error = %e, "merge failed");
            app.toast(ToastLevel::Error, format!("Merge of {} failed: {}", branch, e));
            app.emit(Effect::LoadPrStatuses);
            return;
        }
    };

    info!(%branch, pr_number, "merged");
    app.toast(
        ToastLevel::Success,
        format!("Merged PR #{} ({})", pr_number, branch),
    );

    let Some(path) = app
        .worktrees
        .iter()
        .find(|wt| wt.branch == branch)
        .map(|wt| wt.path.clone())
    else {
        keep(app, &branch);
        return;
    };

    // The remote merge already happened; dismissing this prompt must still
    // refresh, hence the cancel action.
    let prompt = ConfirmPrompt::new(
        format!("PR #{} merged. What should happen to worktree {}?", pr_number, branch),
        &[
            ('d', "delete worktree and branch"),
            ('r', "reset to default branch"),
            ('k', "keep as is"),
        ],
    );
    app.queue_confirm(
        ConfirmRequest::new(
            prompt,
            PendingAction::PostMerge {
                branch: branch.clone(),
                path,
            },
        )
        .with_cancel(PendingAction::KeepMergedWorktree { branch }),
    );
}

pub(super) fn post_merge_choice(app: &mut App, choice: Option<char>, branch: String, path: PathBuf) {
    match choice {
        Some('d') => worktree_flow::start_delete(app, branch, path, true),
        Some('r') => worktree_flow::start_reset(app, branch),
        _ => keep(app, &branch),
    }
}

pub(super) fn keep(app: &mut App, branch: &str) {
    app.toast(ToastLevel::Info, format!("Keeping worktree {}", branch));
    app.emit(Effect::LoadWorktrees);
    app.emit(Effect::LoadPrStatuses);
}
