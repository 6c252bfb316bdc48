mod app;
mod tracing_setup;
mod ui;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use crossterm::{
    event, execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use vimline_core::Config;

use app::App;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let path = std::env::args_os().nth(1).map(PathBuf::from);

    let config = Config::load().context("Failed to load configuration")?;
    tracing_setup::init(&config.logging)?;

    let mut app = App::open(path, &config).await?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|frame| {
            app.render(frame);
        })?;

        if app.should_quit() {
            return Ok(());
        }

        // Wake up in time to resolve a pending mapping.
        if event::poll(app.poll_timeout())? {
            let ev = event::read()?;
            app.handle_event(ev).await;
        }

        app.tick().await;
    }
}
