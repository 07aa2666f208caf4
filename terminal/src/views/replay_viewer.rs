use super::View;
use crate::app::{AppCommand, ViewerOptions};
use crate::render::pitch::PitchRenderer;
use crate::render::standard_renderer::{team_color, StandardRenderer};
use crate::render::types::{CharDimensions, RenderConfig};
use crate::replay::ReplayData;
use common::{
    format_clock, timeline, CameraDirector, EntityState, Event, EventConsumer, EventKind, Pass,
    ReplayEngine, Step, Team, Timeline, Viewpoint,
};
use crossterm::event::{KeyCode, KeyEvent};
use feed::{FeedHandle, FeedState};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, info};

/// Applied events kept for the log panel.
const EVENT_LOG_CAPACITY: usize = 500;

const COARSE_SEEK_PERCENT: f64 = 5.0;
const FINE_SEEK_PERCENT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum LayoutMode {
    SingleColumn,
    TwoColumn,
}

impl LayoutMode {
    fn from_dimensions(width: u16, height: u16) -> Self {
        const MIN_WIDTH_FOR_TWO_COLUMN: u16 = 100;
        const ASPECT_RATIO_THRESHOLD: f32 = 1.8;

        let aspect_ratio = width as f32 / height.max(1) as f32;
        if width >= MIN_WIDTH_FOR_TWO_COLUMN && aspect_ratio >= ASPECT_RATIO_THRESHOLD {
            LayoutMode::TwoColumn
        } else {
            LayoutMode::SingleColumn
        }
    }
}

pub struct ReplayViewerState {
    title: String,
    engine: ReplayEngine,
    director: CameraDirector,
    feed: Option<FeedHandle>,
    event_log: VecDeque<String>,
    round: Option<u32>,
    file_malformed: usize,
    event_log_scroll: u16,
    event_log_total_lines: Cell<u16>,
    event_log_scrollbar_state: RefCell<ScrollbarState>,
}

impl ReplayViewerState {
    pub fn new(replay: ReplayData, options: &ViewerOptions) -> Self {
        let mut engine = ReplayEngine::new(options.engine.clone());
        engine.load(replay.events);
        engine.set_speed(options.speed);

        Self {
            title: replay.name,
            engine,
            director: CameraDirector::new(options.director.clone()),
            feed: None,
            event_log: VecDeque::new(),
            round: None,
            file_malformed: replay.malformed,
            event_log_scroll: 0,
            event_log_total_lines: Cell::new(0),
            event_log_scrollbar_state: RefCell::new(ScrollbarState::default()),
        }
    }

    /// Events from `feed` are appended to the log ahead of every tick.
    pub fn with_feed(mut self, feed: FeedHandle) -> Self {
        self.feed = Some(feed);
        self
    }

    pub fn engine(&self) -> &ReplayEngine {
        &self.engine
    }

    pub fn director(&self) -> &CameraDirector {
        &self.director
    }

    /// Newest first.
    pub fn event_log(&self) -> impl Iterator<Item = &str> {
        self.event_log.iter().map(String::as_str)
    }

    pub fn round(&self) -> Option<u32> {
        self.round
    }

    fn absorb(&mut self, step: Step) {
        if step.pass == Pass::Rebuild {
            self.event_log.clear();
            self.round = None;
            self.event_log_scroll = 0;
        }

        step.deliver(self.engine.state(), &mut [&mut self.director]);

        for event in &step.applied {
            if event.kind == EventKind::RoundStart {
                self.round = event.round.or(self.round.map(|r| r + 1)).or(Some(1));
            }
            let relative = self.engine.log().relative_time(event);
            self.event_log.push_front(describe_event(event, relative));
        }
        self.event_log.truncate(EVENT_LOG_CAPACITY);
    }

    fn seek_to(&mut self, percent: f64) {
        let step = Timeline::new(&mut self.engine).seek(percent);
        debug!("Seek to {:.1}% applied {} events", percent, step.applied.len());
        self.absorb(step);
    }

    fn seek_by(&mut self, delta: f64) {
        let step = Timeline::new(&mut self.engine).seek_by(delta);
        self.absorb(step);
    }

    fn reset(&mut self) {
        self.engine.reset();
        self.director.on_reset();
        self.event_log.clear();
        self.round = None;
        self.event_log_scroll = 0;
        info!("Replay reset to 00:00");
    }

    fn change_speed(&mut self, factor: f64) {
        let speed = self.engine.set_speed(self.engine.speed() * factor);
        debug!("Playback speed {}x", speed);
    }

    fn scroll_event_log_up(&mut self, lines: u16) {
        self.event_log_scroll = self.event_log_scroll.saturating_sub(lines);
        let mut scrollbar_state = self.event_log_scrollbar_state.borrow_mut();
        *scrollbar_state = scrollbar_state.position(self.event_log_scroll as usize);
    }

    fn scroll_event_log_down(&mut self, lines: u16) {
        let max_scroll = self.event_log_total_lines.get().saturating_sub(1);
        self.event_log_scroll = self.event_log_scroll.saturating_add(lines).min(max_scroll);
        let mut scrollbar_state = self.event_log_scrollbar_state.borrow_mut();
        *scrollbar_state = scrollbar_state.position(self.event_log_scroll as usize);
    }
}

impl View for ReplayViewerState {
    fn handle_input(&mut self, key: KeyEvent) -> Option<AppCommand> {
        match key.code {
            KeyCode::Char(' ') => {
                self.engine.toggle_pause();
                None
            }
            KeyCode::Char('r') => {
                self.reset();
                None
            }
            KeyCode::Char('h') | KeyCode::Left => {
                self.seek_by(-COARSE_SEEK_PERCENT);
                None
            }
            KeyCode::Char('l') | KeyCode::Right => {
                self.seek_by(COARSE_SEEK_PERCENT);
                None
            }
            KeyCode::Char('H') => {
                self.seek_by(-FINE_SEEK_PERCENT);
                None
            }
            KeyCode::Char('L') => {
                self.seek_by(FINE_SEEK_PERCENT);
                None
            }
            KeyCode::Char(digit @ '0'..='9') => {
                let decile = digit.to_digit(10).unwrap_or(0);
                self.seek_to(f64::from(decile) * 10.0);
                None
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.change_speed(2.0);
                None
            }
            KeyCode::Char('-') => {
                self.change_speed(0.5);
                None
            }
            KeyCode::Char('J') | KeyCode::Char('j') => {
                self.scroll_event_log_down(1);
                None
            }
            KeyCode::Char('K') | KeyCode::Char('k') => {
                self.scroll_event_log_up(1);
                None
            }
            KeyCode::PageUp => {
                self.scroll_event_log_up(5);
                None
            }
            KeyCode::PageDown => {
                self.scroll_event_log_down(5);
                None
            }
            KeyCode::Char('q') | KeyCode::Esc => Some(AppCommand::BackToSelector),
            _ => None,
        }
    }

    fn update(&mut self, dt: Duration) {
        if let Some(feed) = self.feed.as_mut() {
            for event in feed.drain() {
                self.engine.append(event);
            }
        }

        let dt = dt.as_secs_f64();
        let step = self.engine.tick(dt);
        self.absorb(step);
        self.director.update(dt);
    }

    fn render(&self, frame: &mut Frame) {
        match LayoutMode::from_dimensions(frame.area().width, frame.area().height) {
            LayoutMode::SingleColumn => self.render_single_column(frame),
            LayoutMode::TwoColumn => self.render_two_column(frame),
        }
    }
}

impl ReplayViewerState {
    fn render_single_column(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Min(16),
                Constraint::Length(10),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(6),
                Constraint::Length(4),
            ])
            .split(frame.area());

        self.render_pitch(frame, chunks[0]);
        self.render_event_log(frame, chunks[1]);
        frame.render_widget(self.render_header(), chunks[2]);
        frame.render_widget(self.render_scrubber(), chunks[3]);
        frame.render_widget(self.render_status(), chunks[4]);
        frame.render_widget(self.render_controls(), chunks[5]);
    }

    fn render_two_column(&self, frame: &mut Frame) {
        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .margin(1)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(frame.area());

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10), Constraint::Length(3)])
            .split(main_chunks[0]);
        self.render_pitch(frame, left[0]);
        frame.render_widget(self.render_scrubber(), left[1]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(6),
                Constraint::Min(6),
                Constraint::Length(4),
            ])
            .split(main_chunks[1]);
        frame.render_widget(self.render_header(), right[0]);
        frame.render_widget(self.render_status(), right[1]);
        self.render_event_log(frame, right[2]);
        frame.render_widget(self.render_controls(), right[3]);
    }

    fn render_header(&self) -> Paragraph {
        let round = self
            .round
            .map(|r| format!(" | Round {}", r))
            .unwrap_or_default();
        let title = format!(
            "{} / {} | Speed: {}x | {}{} | {}",
            format_clock(self.engine.current_time()),
            format_clock(self.engine.duration()),
            self.engine.speed(),
            if self.engine.is_paused() { "⏸ Paused" } else { "▶ Playing" },
            round,
            self.title,
        );

        Paragraph::new(title)
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL))
    }

    fn render_scrubber(&self) -> Gauge {
        let progress = timeline::progress(&self.engine);
        Gauge::default()
            .block(Block::default().borders(Borders::ALL))
            .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
            .ratio(progress)
            .label(format!("{:.0}%", progress * 100.0))
    }

    fn render_pitch(&self, frame: &mut Frame, area: Rect) {
        let state = self.engine.state();
        let block = Block::default()
            .title(format!("Pitch ({} entities)", state.len()))
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let char_dims = CharDimensions::new(2, 1);
        let config = RenderConfig {
            chars_per_point: char_dims,
        };
        let renderer = PitchRenderer::new(StandardRenderer::new(char_dims));

        let width = inner.width as usize / char_dims.horizontal;
        let height = inner.height as usize / char_dims.vertical;
        let focus = match self.director.viewpoint() {
            Viewpoint::Follow(id) => Some(id),
            Viewpoint::Overview => None,
        };
        let grid = renderer.render(state, focus, width, height, &config);

        let lines: Vec<Line> = grid
            .into_styled_lines()
            .into_iter()
            .map(|(chars, styles)| {
                Line::from(
                    chars
                        .into_iter()
                        .zip(styles)
                        .map(|(ch, style)| Span::styled(ch.to_string(), style))
                        .collect::<Vec<_>>(),
                )
            })
            .collect();

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_status(&self) -> Paragraph {
        let state = self.engine.state();
        let stats = self.engine.stats();

        let camera = match self.director.viewpoint() {
            Viewpoint::Overview => "Overview".to_string(),
            Viewpoint::Follow(id) => format!("Following {}", id),
        };
        let cooldown = self.director.cooldown_remaining();
        let camera = if cooldown > 0.0 {
            format!("{} ({:.1}s hold)", camera, cooldown)
        } else {
            camera
        };

        let feed = match &self.feed {
            None => Span::styled("off", Style::default().fg(Color::DarkGray)),
            Some(handle) => {
                let status = handle.status();
                let (label, color) = match status.state {
                    FeedState::Connecting => ("connecting".to_string(), Color::Yellow),
                    FeedState::Open => ("open".to_string(), Color::Green),
                    FeedState::Closed { retry_in } => (
                        format!("retry in {:.0}s", retry_in.as_secs_f64()),
                        Color::Red,
                    ),
                    FeedState::Stopped => ("stopped".to_string(), Color::DarkGray),
                };
                Span::styled(
                    format!(
                        "{} ({} received, {} malformed)",
                        label, status.stats.received, status.stats.malformed
                    ),
                    Style::default().fg(color),
                )
            }
        };

        let lines = vec![
            Line::from(vec![
                Span::raw("Alive: "),
                team_span(state, Team::A),
                Span::raw("  "),
                team_span(state, Team::B),
                Span::raw(format!("  ({} / {})", state.alive_count(), state.len())),
            ]),
            Line::from(vec![
                Span::raw("Camera: "),
                Span::styled(camera, Style::default().fg(Color::Yellow)),
            ]),
            Line::from(vec![Span::raw("Live: "), feed]),
            Line::from(format!(
                "Log: {} events | {} duplicates | {} malformed",
                self.engine.log().len(),
                stats.duplicates,
                stats.malformed + self.file_malformed as u64,
            )),
        ];

        Paragraph::new(lines).block(Block::default().borders(Borders::ALL))
    }

    fn render_controls(&self) -> Paragraph {
        let lines = vec![
            Line::from("Space: Play/Pause | r: Reset | h/l: ±5% | H/L: ±1% | 0-9: Jump | +/-: Speed"),
            Line::from("j/k: Scroll event log | PageUp/Down: Scroll 5 lines | q: Back to menu"),
        ];

        Paragraph::new(lines)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL))
    }

    fn render_event_log(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = self
            .event_log
            .iter()
            .map(|line| Line::from(line.as_str()))
            .collect();

        let total_lines = lines.len();
        self.event_log_total_lines
            .set(total_lines.min(u16::MAX as usize) as u16);

        let mut scrollbar_state = self.event_log_scrollbar_state.borrow_mut();
        *scrollbar_state = scrollbar_state
            .content_length(total_lines)
            .position(self.event_log_scroll as usize);

        let event_log = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(format!("Event Log ({} applied)", total_lines))
                    .borders(Borders::ALL),
            )
            .style(Style::default().fg(Color::White))
            .scroll((self.event_log_scroll, 0));
        frame.render_widget(event_log, area);

        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));
        frame.render_stateful_widget(
            scrollbar,
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut *scrollbar_state,
        );
    }
}

fn team_span(state: &EntityState, team: Team) -> Span<'static> {
    let alive = state
        .iter()
        .filter(|(_, e)| e.is_alive() && e.team.as_ref() == Some(&team))
        .count();
    Span::styled(
        format!("{} {}", team, alive),
        Style::default().fg(team_color(Some(&team))),
    )
}

/// One log line: relative time, kind, who did it to whom.
pub fn describe_event(event: &Event, relative: f64) -> String {
    let mut line = format!("{} {:<10}", format_clock(relative), event.kind.as_str());
    match (&event.actor, &event.target) {
        (Some(actor), Some(target)) => line.push_str(&format!(" {} → {}", actor, target)),
        (Some(actor), None) => line.push_str(&format!(" {}", actor)),
        (None, Some(target)) => line.push_str(&format!(" → {}", target)),
        (None, None) => {}
    }
    if let Some(round) = event.round {
        line.push_str(&format!(" (round {})", round));
    }
    line.trim_end().to_string()
}
