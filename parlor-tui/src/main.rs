use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use parlor_core::{ensure_data_dir, get_config_paths, ParlorConfig};
use parlor_tui::app::App;
use parlor_tui::services::Services;
use parlor_tui::theme::ThemeStore;
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "parlor-tui", version, about = "Terminal chat rooms with an @ai assistant")]
struct Args {
    /// Run against an in-memory backend with seeded rooms and a local identity
    #[arg(long)]
    offline: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.offline)?;
    setup_logging(&config)?;

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, args.offline, &config);
    restore_terminal(&mut terminal)?;

    if let Err(e) = result {
        eprintln!("Application error: {e}");
        return Err(e);
    }

    Ok(())
}

fn load_config(offline: bool) -> Result<ParlorConfig> {
    if offline {
        let mut config = ParlorConfig::offline();
        // The assistant key may still come from the usual sources.
        if let Ok(layered) = ParlorConfig::load_layers(get_config_paths()) {
            config.assistant = layered.assistant;
            config.logging = layered.logging;
            config.tui = layered.tui;
        }
        return Ok(config);
    }
    ParlorConfig::load().context("Failed to load configuration (try --offline)")
}

/// Logs go to a file since the terminal belongs to the UI.
fn setup_logging(config: &ParlorConfig) -> Result<()> {
    let path = if config.logging.file_path.is_empty() {
        ensure_data_dir()?.join("parlor-tui.log")
    } else {
        config.logging.file_path.clone().into()
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "parlor_tui={0},parlor_core={0}",
            config.log_level()
        ))
    });
    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file));

    if config.logging.json_format {
        tracing_subscriber::registry()
            .with(layer.json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry().with(layer).with(filter).init();
    }
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    offline: bool,
    config: &ParlorConfig,
) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let services = if offline {
            Services::offline(config)?
        } else {
            Services::connect(config)?
        };
        let mut app = App::new(services, config, ThemeStore::new());
        app.run(terminal).await
    })
}
