use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use anyhow::Result;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use tracing::{debug, warn};

use crate::config::DEBOUNCE_MS;
use crate::event::AppEvent;

/// Start the file watcher. Changes to the repository's git metadata post
/// `GitChanged`; edits to the settings file post `SettingsChanged`.
pub fn start_watcher(
    git_dir: PathBuf,
    settings_path: PathBuf,
    tx: mpsc::Sender<AppEvent>,
) -> Result<notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>> {
    let settings_clone = settings_path.clone();

    let mut debouncer = new_debouncer(
        Duration::from_millis(DEBOUNCE_MS),
        move |res: Result<Vec<notify_debouncer_mini::DebouncedEvent>, notify::Error>| {
            let events = match res {
                Ok(events) => events,
                Err(e) => {
                    warn!(error = %e, "file watcher error");
                    return;
                }
            };

            let mut git_changed = false;
            let mut settings_changed = false;
            for event in events {
                if event.kind != DebouncedEventKind::Any {
                    continue;
                }
                match classify_change(&event.path, &settings_clone) {
                    Some(Change::Git) => git_changed = true,
                    Some(Change::Settings) => settings_changed = true,
                    None => {}
                }
            }
            // One event per burst; the reducer refetches everything anyway.
            if git_changed {
                let _ = tx.send(AppEvent::GitChanged);
            }
            if settings_changed {
                let _ = tx.send(AppEvent::SettingsChanged);
            }
        },
    )?;

    let watcher = debouncer.watcher();

    if git_dir.exists() {
        if let Err(e) = watcher.watch(&git_dir, notify::RecursiveMode::NonRecursive) {
            warn!(path = %git_dir.display(), error = %e, "cannot watch git dir");
        }
        let refs = git_dir.join("refs").join("heads");
        if refs.exists() {
            let _ = watcher.watch(&refs, notify::RecursiveMode::Recursive);
        }
    }

    // The settings file is replaced by rename on save, so watch its directory.
    if let Some(settings_dir) = settings_path.parent().filter(|d| d.exists()) {
        if let Err(e) = watcher.watch(settings_dir, notify::RecursiveMode::NonRecursive) {
            warn!(path = %settings_dir.display(), error = %e, "cannot watch settings dir");
        }
    }

    debug!(git = %git_dir.display(), settings = %settings_path.display(), "watcher started");
    Ok(debouncer)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Git,
    Settings,
}

fn classify_change(path: &Path, settings_path: &Path) -> Option<Change> {
    if path == settings_path {
        return Some(Change::Settings);
    }

    let normalized = path.to_string_lossy().replace('\\', "/");
    if normalized.ends_with("/index")
        || normalized.ends_with("/HEAD")
        || normalized.ends_with("/packed-refs")
        || normalized.contains("/refs/")
    {
        return Some(Change::Git);
    }
    // Lock files, objects and logs churn on every command.
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_git_metadata() {
        let settings = Path::new("/home/u/.config/arbor/settings.json");
        assert_eq!(
            classify_change(Path::new("/repo/.git/HEAD"), settings),
            Some(Change::Git)
        );
        assert_eq!(
            classify_change(Path::new("/repo/.git/refs/heads/feat"), settings),
            Some(Change::Git)
        );
        assert_eq!(classify_change(Path::new("/repo/.git/index.lock"), settings), None);
        assert_eq!(
            classify_change(Path::new("/repo/.git/objects/ab/cdef"), settings),
            None
        );
    }

    #[test]
    fn classifies_settings_file_only() {
        let settings = Path::new("/home/u/.config/arbor/settings.json");
        assert_eq!(classify_change(settings, settings), Some(Change::Settings));
        assert_eq!(
            classify_change(Path::new("/home/u/.config/arbor/settings.json.tmp"), settings),
            None
        );
    }
}
