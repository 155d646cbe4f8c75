use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use chrono::Local;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::data::prompts::planner_instructions;
use crate::error::SessionError;
use crate::model::session::{SessionInfo, SessionKind, SessionStatus};

/// Lines of output kept per session.
const MAX_OUTPUT_LINES: usize = 5000;

/// Supervises planner and builder agent sessions.
pub trait SessionManager: Send + Sync {
    fn start_session(
        &self,
        kind: SessionKind,
        worktree_path: &Path,
        prompt: &str,
        model: &str,
    ) -> Result<String, SessionError>;
    fn stop_session(&self, id: &str) -> Result<(), SessionError>;
    fn send_follow_up(&self, id: &str, text: &str) -> Result<(), SessionError>;
    fn complete_session(&self, id: &str) -> Result<(), SessionError>;
    fn all_sessions(&self) -> Vec<SessionInfo>;
    fn sessions_for_worktree(&self, path: &Path) -> Vec<SessionInfo> {
        self.all_sessions()
            .into_iter()
            .filter(|s| s.worktree_path == path)
            .collect()
    }
}

struct SessionEntry {
    info: SessionInfo,
    child: Option<Child>,
    /// Agent-side conversation id, used to resume for follow-ups.
    conversation: Option<String>,
}

type SessionMap = Arc<Mutex<HashMap<String, SessionEntry>>>;

/// Runs each agent turn as a headless `claude -p` subprocess streaming JSON.
pub struct ProcessSessionManager {
    program: String,
    next_id: AtomicUsize,
    sessions: SessionMap,
}

impl ProcessSessionManager {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            next_id: AtomicUsize::new(1),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
        lock_sessions(&self.sessions)
    }

    /// Spawn one agent turn for session `id` and wire its output back into
    /// the shared session map. The child is stored before the readers start
    /// so a fast exit is always reaped.
    fn spawn_turn(
        &self,
        id: &str,
        kind: SessionKind,
        cwd: &Path,
        prompt: &str,
        model: &str,
        resume: Option<&str>,
    ) -> Result<(), SessionError> {
        let mut args = vec![
            "-p",
            prompt,
            "--model",
            model,
            "--dangerously-skip-permissions",
            "--output-format",
            "stream-json",
            "--verbose",
        ];
        let instructions = planner_instructions();
        if kind == SessionKind::Planner {
            args.extend_from_slice(&["--append-system-prompt", instructions.as_str()]);
        }
        if let Some(conversation) = resume {
            args.extend_from_slice(&["--resume", conversation]);
        }

        let mut child = Command::new(&self.program)
            .args(&args)
            .current_dir(cwd)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| SessionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        if let Some(entry) = self.lock().get_mut(id) {
            entry.child = Some(child);
            entry.info.status = SessionStatus::Running;
        }

        if let Some(stdout) = stdout {
            let sessions = Arc::clone(&self.sessions);
            let id = id.to_string();
            thread::spawn(move || {
                let reader = BufReader::new(stdout);
                for line in reader.lines().map_while(Result::ok) {
                    let parsed = parse_stream_line(&line);
                    let mut map = lock_sessions(&sessions);
                    let Some(entry) = map.get_mut(&id) else { break };
                    if let Some(conversation) = parsed.conversation {
                        entry.conversation = Some(conversation);
                    }
                    push_output(&mut entry.info.output, parsed.text);
                }
                finish_turn(&sessions, &id);
            });
        }

        if let Some(stderr) = stderr {
            let sessions = Arc::clone(&self.sessions);
            let id = id.to_string();
            thread::spawn(move || {
                let reader = BufReader::new(stderr);
                for line in reader.lines().map_while(Result::ok) {
                    let mut map = lock_sessions(&sessions);
                    let Some(entry) = map.get_mut(&id) else { break };
                    push_output(&mut entry.info.output, vec![format!("! {}", line)]);
                }
            });
        }

        Ok(())
    }
}

fn lock_sessions(sessions: &SessionMap) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
    sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn push_output(output: &mut Vec<String>, lines: Vec<String>) {
    output.extend(lines);
    if output.len() > MAX_OUTPUT_LINES {
        let excess = output.len() - MAX_OUTPUT_LINES;
        output.drain(..excess);
    }
}

/// Reap the turn's process once stdout closes. A clean exit leaves the
/// session idle, waiting for a follow-up.
fn finish_turn(sessions: &SessionMap, id: &str) {
    let child = {
        let mut map = lock_sessions(sessions);
        map.get_mut(id).and_then(|entry| entry.child.take())
    };
    // Stopped or completed sessions already reaped their child.
    let Some(mut child) = child else { return };

    let exit = child.wait();
    let mut map = lock_sessions(sessions);
    let Some(entry) = map.get_mut(id) else { return };
    if entry.info.status.is_terminal() {
        return;
    }
    entry.info.status = match exit {
        Ok(status) if status.success() => SessionStatus::Idle,
        Ok(status) => {
            warn!(session = id, %status, "agent turn exited with failure");
            SessionStatus::Failed
        }
        Err(e) => {
            warn!(session = id, error = %e, "failed to wait for agent turn");
            SessionStatus::Failed
        }
    };
    info!(session = id, status = entry.info.status.label(), "agent turn finished");
}

impl SessionManager for ProcessSessionManager {
    fn start_session(
        &self,
        kind: SessionKind,
        worktree_path: &Path,
        prompt: &str,
        model: &str,
    ) -> Result<String, SessionError> {
        let id = format!("s{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().insert(
            id.clone(),
            SessionEntry {
                info: SessionInfo {
                    id: id.clone(),
                    kind,
                    worktree_path: PathBuf::from(worktree_path),
                    status: SessionStatus::Pending,
                    model: model.to_string(),
                    prompt: prompt.to_string(),
                    started_at: Local::now(),
                    output: vec![format!("> {}", prompt)],
                },
                child: None,
                conversation: None,
            },
        );

        match self.spawn_turn(&id, kind, worktree_path, prompt, model, None) {
            Ok(()) => {
                info!(session = %id, kind = kind.label(), path = %worktree_path.display(), "session started");
                Ok(id)
            }
            Err(e) => {
                self.lock().remove(&id);
                Err(e)
            }
        }
    }

    fn stop_session(&self, id: &str) -> Result<(), SessionError> {
        let child = {
            let mut map = self.lock();
            let entry = map
                .get_mut(id)
                .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
            entry.info.status = SessionStatus::Stopped;
            entry.child.take()
        };
        if let Some(mut child) = child {
            let _ = child.kill();
            let _ = child.wait();
        }
        info!(session = id, "session stopped");
        Ok(())
    }

    fn send_follow_up(&self, id: &str, text: &str) -> Result<(), SessionError> {
        let (kind, cwd, model, conversation) = {
            let mut map = self.lock();
            let entry = map
                .get_mut(id)
                .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
            if entry.info.status.is_active() {
                return Err(SessionError::Busy(id.to_string()));
            }
            if entry.info.status.is_terminal() {
                return Err(SessionError::Finished(id.to_string()));
            }
            entry.info.status = SessionStatus::Pending;
            push_output(&mut entry.info.output, vec![String::new(), format!("> {}", text)]);
            (
                entry.info.kind,
                entry.info.worktree_path.clone(),
                entry.info.model.clone(),
                entry.conversation.clone(),
            )
        };

        match self.spawn_turn(id, kind, &cwd, text, &model, conversation.as_deref()) {
            Ok(()) => {
                debug!(session = id, "follow-up sent");
                Ok(())
            }
            Err(e) => {
                if let Some(entry) = self.lock().get_mut(id) {
                    entry.info.status = SessionStatus::Idle;
                }
                Err(e)
            }
        }
    }

    fn complete_session(&self, id: &str) -> Result<(), SessionError> {
        let child = {
            let mut map = self.lock();
            let entry = map
                .get_mut(id)
                .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
            entry.info.status = SessionStatus::Completed;
            entry.child.take()
        };
        if let Some(mut child) = child {
            let _ = child.kill();
            let _ = child.wait();
        }
        info!(session = id, "session completed");
        Ok(())
    }

    fn all_sessions(&self) -> Vec<SessionInfo> {
        let mut sessions: Vec<SessionInfo> =
            self.lock().values().map(|entry| entry.info.clone()).collect();
        sessions.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        sessions
    }
}

// ---------------------------------------------------------------------------
// stream-json parsing
// ---------------------------------------------------------------------------

/// A single line of `--output-format stream-json`.
#[derive(Debug, Deserialize)]
struct StreamEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    message: Option<StreamMessage>,
    #[serde(default)]
    result: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamMessage {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        input: Option<Value>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, PartialEq)]
struct ParsedLine {
    conversation: Option<String>,
    text: Vec<String>,
}

/// Turn one stream-json line into displayable output. Lines that are not
/// JSON are shown verbatim.
fn parse_stream_line(line: &str) -> ParsedLine {
    let Ok(envelope) = serde_json::from_str::<StreamEnvelope>(line) else {
        return ParsedLine {
            conversation: None,
            text: vec![line.to_string()],
        };
    };

    let mut text = Vec::new();
    match envelope.kind.as_str() {
        "assistant" => {
            for block in envelope.message.map(|m| m.content).unwrap_or_default() {
                match block {
                    ContentBlock::Text { text: t } => {
                        text.extend(t.lines().map(String::from));
                    }
                    ContentBlock::ToolUse { name, input } => {
                        let target = input
                            .as_ref()
                            .and_then(|i| {
                                i.get("file_path")
                                    .or_else(|| i.get("command"))
                                    .or_else(|| i.get("pattern"))
                            })
                            .and_then(|v| v.as_str())
                            .unwrap_or("");
                        text.push(format!(
                            "[{}] {}",
                            name.as_deref().unwrap_or("tool"),
                            target
                        ));
                    }
                    ContentBlock::Other => {}
                }
            }
        }
        "result" => {
            if let Some(result) = envelope.result.filter(|r| !r.is_empty()) {
                text.push(String::new());
                text.extend(result.lines().map(String::from));
            }
        }
        _ => {}
    }

    ParsedLine {
        conversation: envelope.session_id,
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_text_and_tool_use() {
        let line = r#"{"type":"assistant","session_id":"abc","message":{"content":[{"type":"text","text":"Reading files\nnow"},{"type":"tool_use","name":"Read","input":{"file_path":"src/main.rs"}}]}}"#;
        let parsed = parse_stream_line(line);
        assert_eq!(parsed.conversation.as_deref(), Some("abc"));
        assert_eq!(parsed.text, vec!["Reading files", "now", "[Read] src/main.rs"]);
    }

    #[test]
    fn system_lines_are_silent_but_carry_session() {
        let parsed = parse_stream_line(r#"{"type":"system","subtype":"init","session_id":"xyz"}"#);
        assert!(parsed.text.is_empty());
        assert_eq!(parsed.conversation.as_deref(), Some("xyz"));
    }

    #[test]
    fn non_json_is_verbatim() {
        let parsed = parse_stream_line("plain output");
        assert_eq!(parsed.text, vec!["plain output"]);
    }

    #[test]
    fn output_is_capped() {
        let mut output = Vec::new();
        push_output(&mut output, (0..MAX_OUTPUT_LINES + 10).map(|i| i.to_string()).collect());
        assert_eq!(output.len(), MAX_OUTPUT_LINES);
        assert_eq!(output[0], "10");
    }

    #[test]
    fn unknown_session_errors() {
        let manager = ProcessSessionManager::new("claude");
        assert!(matches!(
            manager.stop_session("nope"),
            Err(SessionError::NotFound(_))
        ));
        assert!(manager.all_sessions().is_empty());
    }

    #[test]
    fn spawn_failure_leaves_no_session() {
        let manager = ProcessSessionManager::new("/nonexistent/agent-binary");
        let dir = tempfile::tempdir().unwrap();
        let result = manager.start_session(SessionKind::Planner, dir.path(), "plan it", "opus");
        assert!(matches!(result, Err(SessionError::Spawn { .. })));
        assert!(manager.all_sessions().is_empty());
    }
}
