use ratatui::style::Style;

#[derive(Clone, Copy, Debug)]
pub struct RenderConfig {
    pub chars_per_point: CharDimensions,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharDimensions {
    pub horizontal: usize,
    pub vertical: usize,
}

impl CharDimensions {
    pub fn new(horizontal: usize, vertical: usize) -> Self {
        Self {
            horizontal: horizontal.max(1),
            vertical: vertical.max(1),
        }
    }
}

/// Terminal cells for a pitch of `logical_width` x `logical_height` points,
/// each point covering `char_dims` characters.
pub struct CharGrid {
    grid: Vec<Vec<(char, Style)>>,
    logical_width: usize,
    logical_height: usize,
    char_dims: CharDimensions,
}

impl CharGrid {
    pub fn new(logical_width: usize, logical_height: usize, char_dims: CharDimensions) -> Self {
        let physical_width = logical_width * char_dims.horizontal;
        let physical_height = logical_height * char_dims.vertical;
        let grid = vec![vec![(' ', Style::default()); physical_width]; physical_height];
        Self {
            grid,
            logical_width,
            logical_height,
            char_dims,
        }
    }

    /// Out of range points are ignored.
    pub fn set_logical_point(&mut self, x: usize, y: usize, pattern: &CharPattern) {
        let start_x = x * self.char_dims.horizontal;
        let start_y = y * self.char_dims.vertical;

        for (dy, row) in pattern.chars.iter().enumerate() {
            for (dx, &ch) in row.iter().enumerate() {
                if let Some(cell) = self
                    .grid
                    .get_mut(start_y + dy)
                    .and_then(|grid_row| grid_row.get_mut(start_x + dx))
                {
                    *cell = (ch, pattern.style);
                }
            }
        }
    }

    pub fn cell(&self, column: usize, row: usize) -> Option<(char, Style)> {
        self.grid.get(row).and_then(|r| r.get(column)).copied()
    }

    pub fn into_lines(self) -> Vec<Vec<char>> {
        self.grid
            .into_iter()
            .map(|row| row.into_iter().map(|(ch, _)| ch).collect())
            .collect()
    }

    pub fn into_styled_lines(self) -> Vec<(Vec<char>, Vec<Style>)> {
        self.grid
            .into_iter()
            .map(|row| row.into_iter().unzip())
            .collect()
    }

    pub fn physical_width(&self) -> usize {
        self.logical_width * self.char_dims.horizontal
    }

    pub fn physical_height(&self) -> usize {
        self.logical_height * self.char_dims.vertical
    }
}

#[derive(Clone, Debug)]
pub struct CharPattern {
    pub chars: Vec<Vec<char>>,
    pub style: Style,
}

impl CharPattern {
    /// `ch` in the first column of each row, padding after it.
    pub fn leading(ch: char, dims: CharDimensions, style: Style) -> Self {
        let mut row = vec![' '; dims.horizontal];
        if let Some(first) = row.first_mut() {
            *first = ch;
        }
        Self {
            chars: vec![row; dims.vertical],
            style,
        }
    }
}
