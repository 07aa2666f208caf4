use anyhow::Result;
use common::{DirectorConfig, EngineConfig};
use crossterm::event::KeyEvent;
use feed::{spawn_feed, FeedOptions, WsConnector};
use ratatui::Frame;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::info;
use url::Url;

use crate::replay::reader::ReplayReader;
use crate::replay::ReplayData;
use crate::views::{ReplaySelectorState, ReplayViewerState, View};

#[derive(Debug)]
pub enum AppCommand {
    Quit,
    BackToSelector,
    OpenReplay(PathBuf),
}

/// Settings every opened viewer starts from.
#[derive(Debug, Clone)]
pub struct ViewerOptions {
    pub engine: EngineConfig,
    pub director: DirectorConfig,
    pub speed: f64,
    /// Live event source attached to each opened viewer.
    pub live: Option<Url>,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            director: DirectorConfig::default(),
            speed: 1.0,
            live: None,
        }
    }
}

pub enum AppState {
    ReplaySelector(Box<ReplaySelectorState>),
    ReplayViewer(Box<ReplayViewerState>),
}

pub struct App {
    pub state: AppState,
    pub replay_dir: PathBuf,
    options: ViewerOptions,
    runtime: Handle,
}

impl App {
    /// Starts in the selector for a directory, or straight in the viewer
    /// when `source` is a single match log.
    pub fn new(source: PathBuf, options: ViewerOptions, runtime: Handle) -> Result<Self> {
        if source.is_file() {
            let replay_dir = source
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let mut app = Self {
                state: AppState::ReplaySelector(Box::new(ReplaySelectorState::new(
                    replay_dir.clone(),
                )?)),
                replay_dir,
                options,
                runtime,
            };
            app.handle_command(AppCommand::OpenReplay(source))?;
            return Ok(app);
        }

        let selector = ReplaySelectorState::new(source.clone())?;
        Ok(Self {
            state: AppState::ReplaySelector(Box::new(selector)),
            replay_dir: source,
            options,
            runtime,
        })
    }

    /// Viewer over the live feed alone, with no recorded history.
    pub fn live(replay_dir: PathBuf, options: ViewerOptions, runtime: Handle) -> Self {
        let mut app = Self {
            state: AppState::ReplaySelector(Box::new(ReplaySelectorState::empty(
                replay_dir.clone(),
            ))),
            replay_dir,
            options,
            runtime,
        };
        let name = app
            .options
            .live
            .as_ref()
            .map(|url| url.to_string())
            .unwrap_or_else(|| "live".to_string());
        app.state = AppState::ReplayViewer(Box::new(app.open_viewer(ReplayData::live(name))));
        app
    }

    pub fn handle_input(&mut self, key: KeyEvent) -> Option<AppCommand> {
        match &mut self.state {
            AppState::ReplaySelector(selector) => selector.handle_input(key),
            AppState::ReplayViewer(viewer) => viewer.handle_input(key),
        }
    }

    pub fn update(&mut self, dt: Duration) {
        match &mut self.state {
            AppState::ReplaySelector(selector) => selector.update(dt),
            AppState::ReplayViewer(viewer) => viewer.update(dt),
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        match &self.state {
            AppState::ReplaySelector(selector) => selector.render(frame),
            AppState::ReplayViewer(viewer) => viewer.render(frame),
        }
    }

    pub fn handle_command(&mut self, command: AppCommand) -> Result<()> {
        match command {
            AppCommand::OpenReplay(path) => {
                let replay = ReplayReader::load_replay(&path)?;
                info!("Opening {} ({} events)", replay.name, replay.events.len());
                let viewer = self.open_viewer(replay);
                self.state = AppState::ReplayViewer(Box::new(viewer));
            }
            AppCommand::BackToSelector => {
                // Dropping the viewer stops its feed
                let selector = ReplaySelectorState::new(self.replay_dir.clone())?;
                self.state = AppState::ReplaySelector(Box::new(selector));
            }
            AppCommand::Quit => {
                // Handled in main loop
            }
        }
        Ok(())
    }

    fn open_viewer(&self, replay: ReplayData) -> ReplayViewerState {
        let viewer = ReplayViewerState::new(replay, &self.options);
        match &self.options.live {
            Some(url) => {
                let _guard = self.runtime.enter();
                let feed = spawn_feed(url.clone(), Arc::new(WsConnector), FeedOptions::default());
                viewer.with_feed(feed)
            }
            None => viewer,
        }
    }
}
