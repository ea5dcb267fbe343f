//! streamscout - where does this movie stream?
//!
//! Search a movie, pick a candidate, and see every streaming offer for it
//! across all regions.
//!
//! # Usage
//!
//! ```bash
//! # Launch interactive TUI
//! streamscout
//!
//! # CLI mode (for automation)
//! streamscout search "interstellar"
//! streamscout offers tm92641 --region US --json
//! ```

use std::io::{stdout, Stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use streamscout::app::{Action, App, RequestId};
use streamscout::catalog::ServiceTable;
use streamscout::cli::{Cli, Command, ExitCode, Output};
use streamscout::config::Config;
use streamscout::models::{NormalizedOfferTable, TitleRecord};
use streamscout::{browser, commands, logging, lookup, normalize, ui, JustWatchClient};

/// Terminal type alias for convenience
type Tui = Terminal<CrosstermBackend<Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging first, so config problems are reported
    if cli.is_cli_mode() {
        logging::init_cli_logger(cli.verbose);
    } else if let Some(dir) = Config::log_dir() {
        logging::init_file_logger(&dir, cli.verbose);
    }

    let (config, config_error) = load_config(&cli);

    if cli.is_cli_mode() {
        let exit_code = run_cli(cli, &config).await;
        std::process::exit(exit_code.into());
    } else {
        run_tui(config, config_error).await
    }
}

/// Config from `--config` or the default path, plus the reason an explicit
/// file was ignored
fn load_config(cli: &Cli) -> (Config, Option<String>) {
    let Some(path) = &cli.config else {
        return (Config::load(), None);
    };
    match Config::read(path) {
        Ok(config) => (config.with_env(), None),
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring config: {:#}", e);
            (
                Config::default().with_env(),
                Some(format!("Ignoring config: {:#}", e)),
            )
        }
    }
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli, config: &Config) -> ExitCode {
    let output = Output::new(&cli);

    match cli.command {
        Some(Command::Search(cmd)) => commands::search_cmd(cmd, config, &output).await,
        Some(Command::Offers(cmd)) => commands::offers_cmd(cmd, config, &output).await,
        Some(Command::Info(cmd)) => commands::info_cmd(cmd, config, &output).await,
        Some(Command::Regions(cmd)) => commands::regions_cmd(cmd, &output),
        None => ExitCode::Success,
    }
}

// =============================================================================
// TUI Mode
// =============================================================================

/// Finished lookup, tagged with the request that started it
enum Completion {
    Search(RequestId, Result<Vec<TitleRecord>, String>),
    Offers(RequestId, Result<NormalizedOfferTable, String>),
}

/// Everything spawned lookups need
struct Backend {
    client: JustWatchClient,
    regions: Vec<String>,
    services: ServiceTable,
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_tui(config: Config, config_error: Option<String>) -> Result<()> {
    let backend = Arc::new(Backend {
        client: commands::client(&config),
        regions: config.regions(),
        services: ServiceTable::default(),
    });
    let mut app = App::new(config.country(), config.language());
    if let Some(msg) = config_error {
        app.set_error(msg);
    }

    let mut terminal = init_terminal()?;
    let result = run_event_loop(&mut terminal, &mut app, backend).await;

    // Always restore terminal, even on error
    restore_terminal(&mut terminal)?;
    result
}

/// Main event loop: render, handle input, apply finished lookups
async fn run_event_loop(terminal: &mut Tui, app: &mut App, backend: Arc<Backend>) -> Result<()> {
    const TICK_RATE: Duration = Duration::from_millis(100);
    let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();

    while app.running {
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events (ignore releases on Windows)
                if key.kind == KeyEventKind::Press {
                    let action = app.handle_key(key);
                    dispatch(action, app, &backend, &tx);
                }
            }
        }

        while let Ok(completion) = rx.try_recv() {
            match completion {
                Completion::Search(id, result) => {
                    app.complete_search(id, result);
                }
                Completion::Offers(id, result) => {
                    app.complete_offers(id, result);
                }
            }
        }
    }

    Ok(())
}

/// Carry out the side effect a key press asked for
fn dispatch(
    action: Action,
    app: &mut App,
    backend: &Arc<Backend>,
    tx: &mpsc::UnboundedSender<Completion>,
) {
    match action {
        Action::None | Action::Quit => {}
        Action::Search {
            id,
            query,
            country,
            language,
        } => {
            let backend = Arc::clone(backend);
            let tx = tx.clone();
            tokio::spawn(async move {
                let result =
                    lookup::search_titles(&backend.client, &query, &country, &language).await;
                let _ = tx.send(Completion::Search(id, result.map_err(|e| e.to_string())));
            });
        }
        Action::LoadOffers { id, title_id } => {
            let backend = Arc::clone(backend);
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = normalize::get_offers_with(
                    &backend.client,
                    &title_id,
                    &backend.regions,
                    &backend.services,
                )
                .await;
                let _ = tx.send(Completion::Offers(id, result.map_err(|e| e.to_string())));
            });
        }
        Action::OpenUrl(url) => {
            if let Err(e) = browser::open_url(&url) {
                tracing::warn!(%url, "could not open browser: {}", e);
                app.set_error(e.to_string());
            }
        }
    }
}
