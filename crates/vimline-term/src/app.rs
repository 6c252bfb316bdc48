use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{Event, KeyEventKind};
use ratatui::Frame;
use tokio::time::Instant;
use tracing::info;

use vimline_core::{
    Config, Engine, Environment, HostIntegration, MemoryBuffer, SessionState,
};

use crate::ui;

/// How long to wait for input when no mapping is pending.
const IDLE_POLL: Duration = Duration::from_millis(250);

/// The main application state.
pub struct App {
    engine: Engine,
    /// Name shown in the status bar.
    file_name: String,
    /// First buffer line on screen.
    top: usize,
}

impl App {
    /// Open `path` (or an empty buffer) with the user's configuration.
    pub async fn open(path: Option<PathBuf>, config: &Config) -> Result<Self> {
        let text = match &path {
            Some(path) if path.exists() => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?,
            _ => String::new(),
        };
        let mut buffer = MemoryBuffer::from_text(&text);
        if let Some(path) = &path {
            buffer = buffer.with_path(path);
        }
        let cwd = std::env::current_dir().context("Could not determine the current directory")?;

        let mut session = SessionState::new(Box::new(buffer))
            .with_options(config.options())
            .with_capabilities(config.capabilities(HostIntegration::Full))
            .with_workspace_root(cwd);
        config.install_mappings(&mut session.remaps)?;

        let env = Environment::system(config.shell.clone());
        let engine = Engine::new(session, env)?.configured(config);
        info!(path = ?path, lines = engine.session.buffer.line_count(), "buffer opened");

        Ok(Self {
            engine,
            file_name: path.map_or_else(|| "[No Name]".to_string(), |p| p.display().to_string()),
            top: 0,
        })
    }

    pub fn should_quit(&self) -> bool {
        self.engine.should_quit()
    }

    /// Time until the pending remap deadline, or the idle poll interval.
    pub fn poll_timeout(&self) -> Duration {
        match self.engine.pending_deadline() {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => IDLE_POLL,
        }
    }

    /// Handle a terminal event.
    pub async fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            if key.kind == KeyEventKind::Press {
                self.engine.handle_event(&key).await;
            }
        }
    }

    /// Called when polling timed out without input.
    pub async fn tick(&mut self) {
        if self
            .engine
            .pending_deadline()
            .is_some_and(|deadline| deadline <= Instant::now())
        {
            self.engine.expire_timeout().await;
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let (content_area, status_area, command_area) = ui::layout(frame.area());

        // Keep the cursor line on screen.
        let height = content_area.height.max(1) as usize;
        let cursor = self.engine.session.buffer.cursor();
        if cursor.line < self.top {
            self.top = cursor.line;
        } else if cursor.line >= self.top + height {
            self.top = cursor.line + 1 - height;
        }

        let session = &self.engine.session;
        ui::render_buffer(frame, content_area, session, self.top);
        ui::render_status_bar(frame, status_area, session, &self.file_name);
        ui::render_bottom_line(frame, command_area, session);
    }
}
