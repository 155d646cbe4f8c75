use crate::model::worktree::Worktree;

/// File a planner session writes its plan to, relative to the worktree root.
pub const PLAN_FILE: &str = "PLAN.md";

/// System instructions appended to every planner turn.
///
/// The planner only reads code and writes the plan file; it must not make
/// changes. The builder picks the plan up later.
pub fn planner_instructions() -> String {
    format!(
        r#"You are planning a change in this repository, not implementing it.

1. Read the relevant code to understand the current architecture.
2. Write a step-by-step implementation plan to `{plan}` in the repository root.
3. List the files to change, the tests to add, and any open questions.

Do not modify any file other than `{plan}`."#,
        plan = PLAN_FILE,
    )
}

/// Prompt for the builder that implements a finished plan.
pub fn build_builder_from_plan_prompt(original_task: &str) -> String {
    format!(
        r#"Implement the plan in `{plan}`.

The plan was written for this task:
{task}

Follow the plan step by step. Run the test suite and fix failures. Commit your
work with clear messages when done."#,
        plan = PLAN_FILE,
        task = original_task.trim(),
    )
}

/// Prompt asking the router model where a task should run.
pub fn build_routing_prompt(task: &str, worktrees: &[Worktree], default_branch: &str) -> String {
    let listing = if worktrees.is_empty() {
        "(none)".to_string()
    } else {
        worktrees
            .iter()
            .map(|wt| {
                if wt.is_main {
                    format!("- {} (main checkout)", wt.name())
                } else {
                    format!("- {}", wt.name())
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"Decide where a coding task should be worked on.

## Existing worktrees
{listing}

## Task
{task}

Answer with a single JSON object and nothing else:
{{"action": "use_existing" | "create_new", "worktree": "<branch name>", "parent": "<parent branch or null>", "reasoning": "<one sentence>"}}

Use an existing worktree only when the task clearly continues its work. For a
new worktree pick a short kebab-case branch name; the parent defaults to
`{default_branch}`."#,
        listing = listing,
        task = task.trim(),
        default_branch = default_branch,
    )
}
