use anyhow::{Context, Result};
use clap::Parser;
use common::{DirectorConfig, EngineConfig, DEFAULT_TRAIL_CAP};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::info;
use url::Url;

use terminal::app::{App, AppCommand, ViewerOptions};

#[derive(Parser, Debug)]
#[command(
    name = "replay-terminal",
    about = "Play back recorded or live match events in the terminal"
)]
struct Args {
    /// Match log to open, or a directory to choose one from
    #[arg(env = "REPLAY_DIR")]
    path: Option<PathBuf>,

    /// WebSocket URL of a live event feed (e.g. ws://localhost:8765/ws/replay)
    #[arg(long, env = "REPLAY_LIVE_URL")]
    live: Option<Url>,

    /// Initial playback speed
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Positions kept per entity trail
    #[arg(long, env = "REPLAY_TRAIL_CAP", default_value_t = DEFAULT_TRAIL_CAP)]
    trail_cap: usize,

    /// Replay onto the current world on seek instead of rebuilding from empty
    #[arg(long)]
    overlay_seek: bool,

    /// Log file; the terminal itself is taken by the UI
    #[arg(long, env = "REPLAY_LOG_FILE", default_value = "replay-terminal.log")]
    log_file: PathBuf,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let log_file = File::create(&args.log_file)
        .with_context(|| format!("Failed to create log file {:?}", args.log_file))?;
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();

    // The live feed runs here; the UI loop stays on the main thread
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    let options = ViewerOptions {
        engine: EngineConfig {
            trail_cap: args.trail_cap,
            clear_on_seek: !args.overlay_seek,
        },
        director: DirectorConfig::default(),
        speed: args.speed,
        live: args.live.clone(),
    };

    let mut app = match (args.path, args.live.is_some()) {
        (Some(path), _) => {
            info!("Opening {:?}", path);
            App::new(path, options, runtime.handle().clone())?
        }
        (None, true) => App::live(PathBuf::from("."), options, runtime.handle().clone()),
        (None, false) => App::new(PathBuf::from("."), options, runtime.handle().clone())?,
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Stop any feed before the runtime goes away
    drop(app);
    runtime.shutdown_timeout(Duration::from_secs(1));

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let mut last_update = Instant::now();

    loop {
        let now = Instant::now();
        let dt = now.duration_since(last_update);
        last_update = now;

        app.update(dt);
        terminal.draw(|f| app.render(f))?;

        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if let Some(command) = app.handle_input(key) {
                    match command {
                        AppCommand::Quit => return Ok(()),
                        _ => app.handle_command(command)?,
                    }
                }
            }
        }
    }
}
