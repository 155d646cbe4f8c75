use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;

use crate::data::command::run_captured;
use crate::model::github::PullRequest;

/// Run a gh command in `cwd`, returning stdout on success.
fn run_gh(args: &[&str], cwd: &Path) -> Result<Vec<u8>> {
    let output = run_captured("gh", args, cwd)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("gh {} failed: {}", args.first().unwrap_or(&""), stderr.trim());
    }
    Ok(output.stdout)
}

/// List recent PRs of every state for the repository checked out at `cwd`.
pub fn list_prs(cwd: &Path) -> Result<Vec<PullRequest>> {
    let stdout = run_gh(
        &[
            "pr",
            "list",
            "--state",
            "all",
            "--limit",
            "200",
            "--json",
            "number,title,state,updatedAt,headRefName,isDraft,reviewDecision",
        ],
        cwd,
    )?;
    let prs: Vec<PullRequest> = serde_json::from_slice(&stdout)?;
    Ok(prs)
}

/// Pick the PR that represents each branch: an open PR wins, otherwise the
/// most recently updated one.
pub fn prs_by_branch(prs: Vec<PullRequest>) -> HashMap<String, PullRequest> {
    let mut by_branch: HashMap<String, PullRequest> = HashMap::new();
    for pr in prs {
        let replace = match by_branch.get(&pr.head_ref_name) {
            None => true,
            Some(existing) => {
                (pr.is_open() && !existing.is_open())
                    || (pr.is_open() == existing.is_open() && pr.updated_at > existing.updated_at)
            }
        };
        if replace {
            by_branch.insert(pr.head_ref_name.clone(), pr);
        }
    }
    by_branch
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr(number: u64, branch: &str, state: &str, updated: &str) -> PullRequest {
        PullRequest {
            number,
            title: format!("PR {}", number),
            state: state.into(),
            updated_at: updated.into(),
            head_ref_name: branch.into(),
            is_draft: false,
            review_decision: None,
        }
    }

    #[test]
    fn open_pr_wins_over_newer_closed_one() {
        let map = prs_by_branch(vec![
            pr(1, "feat", "OPEN", "2024-01-01T00:00:00Z"),
            pr(2, "feat", "CLOSED", "2024-06-01T00:00:00Z"),
            pr(3, "fix", "MERGED", "2024-02-01T00:00:00Z"),
            pr(4, "fix", "CLOSED", "2024-03-01T00:00:00Z"),
        ]);
        assert_eq!(map["feat"].number, 1);
        assert_eq!(map["fix"].number, 4);
    }

    #[test]
    fn parses_gh_json() {
        let json = r#"[{"number":42,"title":"Add login","state":"OPEN","url":"https://github.com/o/r/pull/42","updatedAt":"2024-01-01T00:00:00Z","headRefName":"login","isDraft":true,"reviewDecision":"APPROVED"}]"#;
        let prs: Vec<PullRequest> = serde_json::from_str(json).unwrap();
        assert_eq!(prs[0].number, 42);
        assert!(prs[0].is_draft);
        assert_eq!(prs[0].review_label(), Some("APPROVED"));
    }
}
