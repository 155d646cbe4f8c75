mod app;
mod config;
mod data;
mod effect;
mod error;
mod event;
mod model;
mod runtime;
mod ui;
mod watcher;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self as ct_event, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};

use crate::app::update::update;
use crate::app::App;
use crate::config::{AGENT_PROVIDER, Settings};
use crate::data::cli_detect;
use crate::data::router::AgentTaskRouter;
use crate::data::sessions::{ProcessSessionManager, SessionManager};
use crate::data::worktree::GitWorktreeManager;
use crate::effect::Effect;
use crate::event::AppEvent;
use crate::model::toast::ToastLevel;
use crate::runtime::Runtime;

#[derive(Parser)]
#[command(
    name = "arbor",
    version,
    about = "Arbor - git worktrees, agent sessions and PR merges from one terminal"
)]
struct Cli {
    /// Repository to manage (defaults to the current directory)
    #[arg(long)]
    repo: Option<PathBuf>,

    /// Settings file (defaults to ~/.config/arbor/settings.json)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log file (defaults to arbor.log next to the default settings)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = cli.log_file.unwrap_or_else(config::default_log_path);
    init_logging(&log_path)?;

    let cwd = match cli.repo {
        Some(p) => std::fs::canonicalize(&p)
            .with_context(|| format!("cannot open repository directory {}", p.display()))?,
        None => std::env::current_dir()?,
    };
    let repo_root = cli_detect::detect_repo_root(&cwd)
        .with_context(|| format!("{} is not inside a git repository", cwd.display()))?;
    let settings_path = cli.settings.unwrap_or_else(config::default_settings_path);

    info!(repo = %repo_root.display(), settings = %settings_path.display(), "starting");
    run_tui(repo_root, settings_path)
}

fn init_logging(log_path: &Path) -> Result<()> {
    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(log_file))
        .init();
    Ok(())
}

fn run_tui(repo_root: PathBuf, settings_path: PathBuf) -> Result<()> {
    let project_config = config::load_project_config(&repo_root);
    let (settings, settings_error) = match config::load_settings(&settings_path) {
        Ok(s) => (s, None),
        Err(e) => {
            warn!(error = %e, "settings unreadable, using defaults");
            (Settings::default(), Some(e.to_string()))
        }
    };
    let gh_repo = if cli_detect::is_available("gh") {
        cli_detect::detect_gh_repo(&repo_root)
    } else {
        warn!("gh not found on PATH; PR status and merging are unavailable");
        None
    };

    let worktrees = Arc::new(GitWorktreeManager::new(
        repo_root.clone(),
        project_config.worktrees_dir(&repo_root),
    ));
    let sessions = Arc::new(ProcessSessionManager::new(AGENT_PROVIDER));
    let router = Arc::new(AgentTaskRouter::new(
        AGENT_PROVIDER,
        project_config.router_model(),
        repo_root.clone(),
    ));

    let (tx, rx) = mpsc::channel::<AppEvent>();
    let runtime = Runtime::new(
        worktrees,
        sessions.clone(),
        router,
        repo_root.clone(),
        settings_path.clone(),
        tx.clone(),
    );

    // Keep the debouncer alive for the whole session.
    let _debouncer = match watcher::start_watcher(
        cli_detect::git_common_dir(&repo_root),
        settings_path,
        tx,
    ) {
        Ok(d) => Some(d),
        Err(e) => {
            warn!(error = %e, "file watcher unavailable; relying on polling");
            None
        }
    };

    let mut app = App::new(repo_root, project_config, settings, gh_repo);
    if let Some(e) = settings_error {
        app.toast(ToastLevel::Warning, format!("Settings file ignored: {}", e));
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, app, &runtime, rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    stop_live_sessions(sessions.as_ref());

    if let Err(ref e) = result {
        eprintln!("Error: {}", e);
    }
    result
}

/// Agent processes must not outlive the app that supervises them.
fn stop_live_sessions(sessions: &dyn SessionManager) {
    for session in sessions.all_sessions() {
        if session.status.is_terminal() {
            continue;
        }
        if let Err(e) = sessions.stop_session(&session.id) {
            warn!(session = %session.id, error = %e, "failed to stop session on exit");
        }
    }
}

/// Hand effects to the runtime. Returns `true` once the reducer asked to quit.
fn dispatch(runtime: &Runtime, effects: Vec<Effect>) -> bool {
    let mut quit = false;
    for effect in effects {
        if effect == Effect::Quit {
            quit = true;
        } else {
            runtime.execute(effect);
        }
    }
    quit
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    runtime: &Runtime,
    rx: mpsc::Receiver<AppEvent>,
) -> Result<()> {
    let tick_rate = Duration::from_millis(app.config.tick_rate());

    let mut startup = app.startup_effects();
    startup.extend(app.take_effects());
    dispatch(runtime, startup);

    let mut dirty = true;
    loop {
        // Draw only when dirty
        if dirty {
            terminal.draw(|f| ui::draw(f, &app))?;
            dirty = false;
        }

        if ct_event::poll(tick_rate)? {
            match ct_event::read()? {
                Event::Key(key) => {
                    dirty = true;
                    if dispatch(runtime, update(&mut app, AppEvent::Key(key))) {
                        return Ok(());
                    }
                }
                Event::Resize(..) => dirty = true,
                _ => {}
            }
        } else {
            // Session ages tick even when nothing else happens.
            dirty = true;
        }

        while let Ok(evt) = rx.try_recv() {
            dirty = true;
            if dispatch(runtime, update(&mut app, evt)) {
                return Ok(());
            }
        }
    }
}
