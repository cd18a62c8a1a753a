mod actions;
mod app;
mod input;
mod persistence;
mod view;

pub use persistence::{default_state_path, JsonFileStore};

use anyhow::{Context, Result};
use app::App;
use crossterm::event::{self, Event as CEvent, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, ExecutableCommand};
use heropick_core::PickerConfig;
use heropick_data::catalog_path;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::fs::OpenOptions;
use std::io::{self, stdout, IsTerminal};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const FALLBACK_STATE_FILE: &str = ".heropick_state.json";
const LOG_FILE: &str = "heropick.log";

#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub assets_dir: PathBuf,
    pub state_path: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
    pub seed: Option<u64>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("assets"),
            state_path: None,
            log_path: None,
            seed: None,
        }
    }
}

impl LaunchOptions {
    /// Reads `HEROPICK_ASSETS`, `HEROPICK_STATE`, `HEROPICK_LOG_FILE` and
    /// `HEROPICK_SEED`.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Some(dir) = std::env::var_os("HEROPICK_ASSETS") {
            options.assets_dir = PathBuf::from(dir);
        }
        options.state_path = default_state_path();
        options.log_path = std::env::var_os("HEROPICK_LOG_FILE").map(PathBuf::from);
        options.seed = std::env::var("HEROPICK_SEED")
            .ok()
            .and_then(|value| value.parse::<u64>().ok());
        options
    }

    pub fn resolved_state_path(&self) -> PathBuf {
        self.state_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(FALLBACK_STATE_FILE))
    }

    pub fn resolved_log_path(&self) -> PathBuf {
        self.log_path
            .clone()
            .unwrap_or_else(|| self.resolved_state_path().with_file_name(LOG_FILE))
    }

    pub fn picker_config(&self) -> PickerConfig {
        PickerConfig {
            seed: self.seed,
            ..PickerConfig::default()
        }
    }
}

pub fn run(options: LaunchOptions) -> Result<()> {
    let mut app = prepare(&options, ensure_interactive_terminal)?;

    enable_raw_mode().map_err(|err| {
        anyhow::anyhow!(
            "failed to enable raw mode; ensure the process owns an interactive terminal: {err}"
        )
    })?;
    let mut stdout = stdout();
    stdout
        .execute(EnterAlternateScreen)
        .context("enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let run_result = run_loop(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;
    app.shutdown();
    run_result
}

/// Checks the terminal before anything touches the log or state files.
fn prepare(options: &LaunchOptions, terminal_check: fn() -> Result<()>) -> Result<App> {
    terminal_check()?;
    init_file_logging(&options.resolved_log_path())?;
    let store = JsonFileStore::open(options.resolved_state_path());
    Ok(App::bootstrap(
        options.picker_config(),
        store,
        catalog_path(&options.assets_dir),
    ))
}

fn init_file_logging(path: &std::path::Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;
    let filter =
        EnvFilter::try_from_env("HEROPICK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;
    Ok(())
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(50);
    while !app.should_quit {
        terminal.draw(|frame| view::draw(frame, app))?;
        if event::poll(tick_rate)? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if !app.handle_search_key(key) {
                    let action = input::map_key(key);
                    actions::dispatch(app, action);
                }
            }
        }
        app.on_tick();
    }
    Ok(())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("leave alternate screen")?;
    terminal.show_cursor().context("show cursor")?;
    Ok(())
}

fn ensure_interactive_terminal() -> Result<()> {
    if io::stdin().is_terminal() && io::stdout().is_terminal() {
        return Ok(());
    }
    anyhow::bail!(
        "heropick requires an interactive TTY for the picker UI (use `heropick list`/`pick` for headless use)"
    );
}
