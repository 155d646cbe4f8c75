use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// How often the tick event fires (ms).
pub const TICK_RATE_MS: u64 = 250;

/// File watcher debounce interval (ms).
pub const DEBOUNCE_MS: u64 = 200;

pub const GIT_STATUS_POLL_SECS: u64 = 5;
pub const PR_STATUS_POLL_SECS: u64 = 60;
pub const SESSION_POLL_MS: u64 = 500;

pub const DEFAULT_PLANNER_MODEL: &str = "opus";
pub const DEFAULT_BUILDER_MODEL: &str = "sonnet";
pub const DEFAULT_ROUTER_MODEL: &str = "haiku";

/// Provider used for planner, builder and routing sessions.
pub const AGENT_PROVIDER: &str = "claude";

pub const DEFAULT_THEME: &str = "default";

fn dirs_base() -> PathBuf {
    std::env::var("USERPROFILE")
        .or_else(|_| std::env::var("HOME"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Per-user directory holding `settings.json` and the log file.
pub fn settings_dir() -> PathBuf {
    match std::env::var("XDG_CONFIG_HOME") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir).join("arbor"),
        _ => dirs_base().join(".config").join("arbor"),
    }
}

pub fn default_settings_path() -> PathBuf {
    settings_dir().join("settings.json")
}

pub fn default_log_path() -> PathBuf {
    settings_dir().join("arbor.log")
}

// ---------------------------------------------------------------------------
// Project config (.arbor.toml)
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ProjectConfig {
    pub display: Option<DisplayConfig>,
    pub polling: Option<PollingConfig>,
    pub sessions: Option<SessionsConfig>,
    pub worktrees: Option<WorktreesConfig>,
}

#[derive(Debug, Deserialize)]
pub struct DisplayConfig {
    pub tick_rate: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PollingConfig {
    pub git_status_secs: Option<u64>,
    pub pr_status_secs: Option<u64>,
    pub session_millis: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SessionsConfig {
    pub planner_model: Option<String>,
    pub builder_model: Option<String>,
    pub router_model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WorktreesConfig {
    /// Directory new worktrees are created in, relative to the repo root.
    pub dir: Option<PathBuf>,
}

impl ProjectConfig {
    pub fn tick_rate(&self) -> u64 {
        self.display
            .as_ref()
            .and_then(|d| d.tick_rate)
            .unwrap_or(TICK_RATE_MS)
    }

    pub fn git_status_secs(&self) -> u64 {
        self.polling
            .as_ref()
            .and_then(|p| p.git_status_secs)
            .unwrap_or(GIT_STATUS_POLL_SECS)
    }

    pub fn pr_status_secs(&self) -> u64 {
        self.polling
            .as_ref()
            .and_then(|p| p.pr_status_secs)
            .unwrap_or(PR_STATUS_POLL_SECS)
    }

    pub fn session_millis(&self) -> u64 {
        self.polling
            .as_ref()
            .and_then(|p| p.session_millis)
            .unwrap_or(SESSION_POLL_MS)
    }

    pub fn planner_model(&self) -> &str {
        self.sessions
            .as_ref()
            .and_then(|s| s.planner_model.as_deref())
            .unwrap_or(DEFAULT_PLANNER_MODEL)
    }

    pub fn builder_model(&self) -> &str {
        self.sessions
            .as_ref()
            .and_then(|s| s.builder_model.as_deref())
            .unwrap_or(DEFAULT_BUILDER_MODEL)
    }

    pub fn router_model(&self) -> &str {
        self.sessions
            .as_ref()
            .and_then(|s| s.router_model.as_deref())
            .unwrap_or(DEFAULT_ROUTER_MODEL)
    }

    /// Where new worktrees go. Defaults to a sibling `<repo>-worktrees` dir.
    pub fn worktrees_dir(&self, repo_root: &Path) -> PathBuf {
        if let Some(dir) = self.worktrees.as_ref().and_then(|w| w.dir.as_ref()) {
            return repo_root.join(dir);
        }
        let name = repo_name(repo_root);
        repo_root
            .parent()
            .unwrap_or(repo_root)
            .join(format!("{}-worktrees", name))
    }
}

/// Load project config from `.arbor.toml` in the given directory.
/// Returns default config if the file doesn't exist or can't be parsed.
pub fn load_project_config(cwd: &Path) -> ProjectConfig {
    let path = cwd.join(".arbor.toml");
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        toml::from_str(&content).unwrap_or_default()
    } else {
        ProjectConfig::default()
    }
}

/// Repository name used as the key for per-repo settings.
pub fn repo_name(repo_root: &Path) -> String {
    let name = repo_root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "repo".to_string());
    name.strip_suffix(".git").map(String::from).unwrap_or(name)
}

// ---------------------------------------------------------------------------
// User settings (settings.json)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoHooks {
    #[serde(default)]
    pub on_worktree_create: Vec<String>,
    #[serde(default)]
    pub on_worktree_delete: Vec<String>,
}

impl RepoHooks {
    pub fn is_empty(&self) -> bool {
        self.on_worktree_create.is_empty() && self.on_worktree_delete.is_empty()
    }

    fn normalize(&mut self) {
        normalize_commands(&mut self.on_worktree_create);
        normalize_commands(&mut self.on_worktree_delete);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_theme")]
    pub theme: String,
    /// `None` means every provider is enabled; `Some(vec![])` means none.
    #[serde(default)]
    pub enabled_providers: Option<Vec<String>>,
    #[serde(default)]
    pub repos: BTreeMap<String, RepoHooks>,
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            enabled_providers: None,
            repos: BTreeMap::new(),
        }
    }
}

fn normalize_commands(commands: &mut Vec<String>) {
    *commands = commands
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect();
}

impl Settings {
    /// Trim every hook line, drop blank ones, and drop repos left with no hooks.
    pub fn normalize(&mut self) {
        for hooks in self.repos.values_mut() {
            hooks.normalize();
        }
        self.repos.retain(|_, hooks| !hooks.is_empty());
    }

    pub fn provider_enabled(&self, provider: &str) -> bool {
        match &self.enabled_providers {
            None => true,
            Some(list) => list.iter().any(|p| p == provider),
        }
    }

    pub fn hooks_for(&self, repo: &str) -> RepoHooks {
        self.repos.get(repo).cloned().unwrap_or_default()
    }

    pub fn set_hooks(&mut self, repo: &str, hooks: RepoHooks) {
        self.repos.insert(repo.to_string(), hooks);
        self.normalize();
    }
}

/// Read settings; a missing file yields defaults.
pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Settings::default()),
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.display().to_string(),
                source,
            })
        }
    };
    let mut settings: Settings = serde_json::from_str(&content)?;
    settings.normalize();
    Ok(settings)
}

/// Normalize and write settings, replacing the file atomically.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    let mut normalized = settings.clone();
    normalized.normalize();
    let json = serde_json::to_string_pretty(&normalized)?;

    let write_err = |source| SettingsError::Write {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(write_err)?;
    std::fs::rename(&tmp, path).map_err(write_err)?;
    Ok(())
}
