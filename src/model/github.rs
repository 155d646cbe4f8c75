use serde::Deserialize;

/// One row of `gh pr list --json ...`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub state: String,
    #[serde(default)]
    pub updated_at: String,
    pub head_ref_name: String,
    #[serde(default)]
    pub is_draft: bool,
    pub review_decision: Option<String>,
}

impl PullRequest {
    pub fn is_open(&self) -> bool {
        self.state == "OPEN"
    }

    /// Review status icon.
    pub fn review_icon(&self) -> &'static str {
        match self.review_decision.as_deref() {
            Some("APPROVED") => "[+]",
            Some("CHANGES_REQUESTED") => "[!]",
            Some("REVIEW_REQUIRED") => "[?]",
            _ => "[ ]",
        }
    }

    /// Review decision as shown in prompts; `None` when GitHub reports none.
    pub fn review_label(&self) -> Option<&str> {
        self.review_decision.as_deref().filter(|r| !r.is_empty())
    }
}
