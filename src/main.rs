use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;
use taskboard::cli::{self, Cli};
use taskboard::config::Config;
use taskboard::{ui, FileStorage, KanbanBoard};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logs go to a file in the data directory since the board owns the
/// terminal. Falls back to stderr if the file cannot be opened.
fn init_tracing(config: &Config, debug: bool) {
    let filter = if debug {
        EnvFilter::new("taskboard=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("taskboard=info"))
    };

    let file = fs::create_dir_all(config.data_dir()).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(config.log_file())
    });

    match file {
        Ok(file) => tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(filter)
            .init(),
        Err(_) => tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_writer(io::stderr))
            .with(filter)
            .init(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.data_dir);
    init_tracing(&config, cli.debug);

    let storage = FileStorage::new(config.data_dir());
    tracing::debug!("Using data directory {}", storage.dir().display());
    let mut board = KanbanBoard::load(storage);

    if let Some(command) = cli.command {
        cli::execute(command, &mut board, &mut io::stdout())?;
        return Ok(());
    }

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = ui::run_app(&mut terminal, &mut board);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        tracing::error!("Board exited with error: {}", err);
        eprintln!("{:?}", err);
    }
    Ok(())
}
