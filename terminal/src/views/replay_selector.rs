use super::View;
use crate::app::AppCommand;
use crate::replay::reader::ReplayReader;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

pub struct ReplaySelectorState {
    replay_dir: PathBuf,
    replay_files: Vec<PathBuf>,
    selected_index: usize,
}

impl ReplaySelectorState {
    pub fn new(replay_dir: PathBuf) -> Result<Self> {
        let replay_files = ReplayReader::list_replays(&replay_dir)?;
        Ok(Self {
            replay_dir,
            replay_files,
            selected_index: 0,
        })
    }

    /// Selector that has not scanned its directory yet.
    pub fn empty(replay_dir: PathBuf) -> Self {
        Self {
            replay_dir,
            replay_files: Vec::new(),
            selected_index: 0,
        }
    }

    pub fn replay_files(&self) -> &[PathBuf] {
        &self.replay_files
    }

    pub fn selected(&self) -> Option<&PathBuf> {
        self.replay_files.get(self.selected_index)
    }

    fn move_selection_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    fn move_selection_down(&mut self) {
        if self.selected_index + 1 < self.replay_files.len() {
            self.selected_index += 1;
        }
    }

    fn describe(path: &Path) -> String {
        let Ok(metadata) = path.metadata() else {
            return String::new();
        };

        let size = metadata.len();
        let size_str = if size < 1024 {
            format!("{} B", size)
        } else if size < 1024 * 1024 {
            format!("{:.1} KB", size as f64 / 1024.0)
        } else {
            format!("{:.1} MB", size as f64 / (1024.0 * 1024.0))
        };

        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .map(|age| match age.as_secs() {
                s if s < 60 => "just now".to_string(),
                s if s < 3600 => format!("{}m ago", s / 60),
                s if s < 86400 => format!("{}h ago", s / 3600),
                s => format!("{}d ago", s / 86400),
            })
            .unwrap_or_else(|| "unknown".to_string());

        format!(" ({}, {})", size_str, age)
    }
}

impl View for ReplaySelectorState {
    fn handle_input(&mut self, key: KeyEvent) -> Option<AppCommand> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(AppCommand::Quit),
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection_down();
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection_up();
                None
            }
            KeyCode::Enter => self.selected().cloned().map(AppCommand::OpenReplay),
            _ => None,
        }
    }

    fn update(&mut self, _dt: Duration) {}

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(frame.area());

        let title = Paragraph::new(format!("Match Replays: {}", self.replay_dir.display()))
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, chunks[0]);

        let list_area = chunks[1];
        let visible_height = (list_area.height.saturating_sub(2) as usize).max(1);
        // Keep the selection on screen
        let scroll_offset = self.selected_index.saturating_sub(visible_height - 1);

        let items: Vec<ListItem> = self
            .replay_files
            .iter()
            .enumerate()
            .skip(scroll_offset)
            .take(visible_height)
            .map(|(i, path)| {
                let filename = path
                    .strip_prefix(&self.replay_dir)
                    .unwrap_or(path)
                    .display()
                    .to_string();

                let style = if i == self.selected_index {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };

                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:>3} ", i + 1), Style::default().fg(Color::DarkGray)),
                    Span::styled(filename, style),
                    Span::styled(Self::describe(path), Style::default().fg(Color::DarkGray)),
                ]))
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .title(format!("Select Match Log ({})", self.replay_files.len()))
                .borders(Borders::ALL),
        );
        frame.render_widget(list, list_area);

        let help_text = if self.replay_files.is_empty() {
            "No .json/.jsonl match logs found. Press 'q' to quit."
        } else {
            "↑/k: Up | ↓/j: Down | Enter: Open | q: Quit"
        };

        let help = Paragraph::new(help_text)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(help, chunks[2]);
    }
}
