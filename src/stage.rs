//! Stage data and brick layouts
//!
//! A layout is a grid of cells built either from a text pattern or by
//! sampling an image alpha mask. Stages come from a JSON table; when none is
//! supplied a single built-in fish stage is used.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{ConfigError, require_positive};

/// Average alpha above which a mask cell becomes a brick
const MASK_THRESHOLD: f32 = 0.3;
/// Sample offsets inside each mask cell (fractions of the cell size)
const MASK_SAMPLES: [f32; 3] = [0.2, 0.5, 0.8];

/// One slot in the brick grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Brick { hp: u8, score: u32 },
    /// Power-up fish; does not count toward the brick total
    PowerUp,
}

/// Grayscale alpha image, row 0 at the bottom
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlphaMask {
    pub width: usize,
    pub height: usize,
    /// `width * height` samples in [0, 1], indexed `y * width + x`
    pub alpha: Vec<f32>,
}

impl AlphaMask {
    fn validate(&self) -> Result<(), ConfigError> {
        let expected = self.width * self.height;
        if expected == 0 || self.alpha.len() != expected {
            return Err(ConfigError::MaskSize {
                expected,
                got: self.alpha.len(),
            });
        }
        Ok(())
    }

    #[inline]
    fn sample(&self, x: usize, y: usize) -> f32 {
        self.alpha[y.min(self.height - 1) * self.width + x.min(self.width - 1)]
    }
}

/// Grid of cells plus the brick size used to place them
#[derive(Debug, Clone, PartialEq)]
pub struct BrickLayout {
    pub cols: usize,
    pub rows: usize,
    pub brick_size: Vec2,
    pub spacing: f32,
    /// Row-major, row 0 at the top
    cells: Vec<Cell>,
}

impl BrickLayout {
    /// Build from text rows
    ///
    /// `#` is a 1-hit brick, `2`-`9` a brick with that many hit points,
    /// `F` a power-up fish, `.` or space an empty slot.
    pub fn from_pattern<S: AsRef<str>>(
        pattern: &[S],
        brick_size: Vec2,
        spacing: f32,
    ) -> Result<Self, ConfigError> {
        check_brick_size(brick_size, spacing)?;

        let rows = pattern.len();
        let cols = pattern.first().map_or(0, |r| r.as_ref().chars().count());
        if rows == 0 || cols == 0 {
            return Err(ConfigError::EmptyLayout);
        }

        let mut cells = Vec::with_capacity(rows * cols);
        for (row, line) in pattern.iter().enumerate() {
            let line = line.as_ref();
            let got = line.chars().count();
            if got != cols {
                return Err(ConfigError::RaggedPattern {
                    row,
                    expected: cols,
                    got,
                });
            }
            for (col, ch) in line.chars().enumerate() {
                let cell = match ch {
                    '.' | ' ' => Cell::Empty,
                    '#' => Cell::Brick {
                        hp: 1,
                        score: BRICK_SCORE,
                    },
                    '2'..='9' => Cell::Brick {
                        hp: ch as u8 - b'0',
                        score: BRICK_SCORE,
                    },
                    'F' => Cell::PowerUp,
                    _ => return Err(ConfigError::UnknownCell { row, col, ch }),
                };
                cells.push(cell);
            }
        }

        Self::finish(cols, rows, brick_size, spacing, cells)
    }

    /// Build by sampling an alpha mask on a `cols x rows` grid
    pub fn from_alpha_mask(
        mask: &AlphaMask,
        cols: usize,
        rows: usize,
        brick_size: Vec2,
        spacing: f32,
    ) -> Result<Self, ConfigError> {
        check_brick_size(brick_size, spacing)?;
        mask.validate()?;
        if cols == 0 || rows == 0 {
            return Err(ConfigError::EmptyLayout);
        }

        let pixel_w = mask.width as f32 / cols as f32;
        let pixel_h = mask.height as f32 / rows as f32;

        let mut cells = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                let mut total = 0.0;
                for dx in MASK_SAMPLES {
                    for dy in MASK_SAMPLES {
                        let px = ((col as f32 + dx) * pixel_w).round() as usize;
                        // Mask rows run bottom-up, layout rows top-down
                        let py = (((rows - 1 - row) as f32 + dy) * pixel_h).round() as usize;
                        total += mask.sample(px, py);
                    }
                }
                let avg = total / (MASK_SAMPLES.len() * MASK_SAMPLES.len()) as f32;
                cells.push(if avg > MASK_THRESHOLD {
                    Cell::Brick {
                        hp: 1,
                        score: BRICK_SCORE,
                    }
                } else {
                    Cell::Empty
                });
            }
        }

        Self::finish(cols, rows, brick_size, spacing, cells)
    }

    fn finish(
        cols: usize,
        rows: usize,
        brick_size: Vec2,
        spacing: f32,
        cells: Vec<Cell>,
    ) -> Result<Self, ConfigError> {
        let layout = Self {
            cols,
            rows,
            brick_size,
            spacing,
            cells,
        };
        if layout.brick_count() == 0 {
            return Err(ConfigError::EmptyLayout);
        }
        Ok(layout)
    }

    pub fn cell(&self, col: usize, row: usize) -> Option<Cell> {
        (col < self.cols && row < self.rows).then(|| self.cells[row * self.cols + col])
    }

    /// Destructible bricks (power-ups excluded)
    pub fn brick_count(&self) -> u32 {
        self.cells
            .iter()
            .filter(|c| matches!(c, Cell::Brick { .. }))
            .count() as u32
    }

    pub fn powerup_count(&self) -> u32 {
        self.cells.iter().filter(|c| **c == Cell::PowerUp).count() as u32
    }

    /// Total width and height of the laid-out grid
    pub fn extent(&self) -> Vec2 {
        let step = self.brick_size + Vec2::splat(self.spacing);
        Vec2::new(
            self.cols as f32 * step.x - self.spacing,
            self.rows as f32 * step.y - self.spacing,
        )
    }

    /// Y of the grid's top edge (the grid is centered slightly above the origin)
    pub fn top(&self) -> f32 {
        self.extent().y / 2.0 + LAYOUT_CENTER_Y
    }

    /// World-space center of every non-empty cell
    pub fn placements(&self) -> impl Iterator<Item = (Vec2, Cell)> + '_ {
        let extent = self.extent();
        let step = self.brick_size + Vec2::splat(self.spacing);
        let origin = Vec2::new(
            -extent.x / 2.0 + self.brick_size.x / 2.0,
            self.top() - self.brick_size.y / 2.0,
        );

        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| **c != Cell::Empty)
            .map(move |(i, c)| {
                let col = (i % self.cols) as f32;
                let row = (i / self.cols) as f32;
                (origin + Vec2::new(col * step.x, -row * step.y), *c)
            })
    }
}

fn check_brick_size(brick_size: Vec2, spacing: f32) -> Result<(), ConfigError> {
    require_positive("brick_width", brick_size.x)?;
    require_positive("brick_height", brick_size.y)?;
    if !(spacing >= 0.0 && spacing.is_finite()) {
        return Err(ConfigError::OutOfRange {
            name: "spacing",
            value: spacing,
            range: "[0, inf)",
        });
    }
    Ok(())
}

/// One stage entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageData {
    pub id: u32,
    pub name: String,
    /// Grid size used when sampling `mask`
    pub cols: usize,
    pub rows: usize,
    pub brick_width: f32,
    pub brick_height: f32,
    pub spacing: f32,
    /// Seconds on the clock
    pub time_limit: f32,
    /// Text rows (ignored when `mask` is present)
    pub pattern: Vec<String>,
    pub mask: Option<AlphaMask>,
}

impl Default for StageData {
    fn default() -> Self {
        Self {
            id: 1,
            name: "Aji".to_string(),
            cols: 0,
            rows: 0,
            brick_width: BRICK_WIDTH,
            brick_height: BRICK_HEIGHT,
            spacing: BRICK_SPACING,
            time_limit: TIME_LIMIT,
            pattern: [
                "...######....",
                ".#########..#",
                "##.##2####.##",
                "#F#######2###",
                "#############",
                ".#########.##",
                "...######...#",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            mask: None,
        }
    }
}

impl StageData {
    pub fn brick_size(&self) -> Vec2 {
        Vec2::new(self.brick_width, self.brick_height)
    }

    /// Build this stage's brick layout
    pub fn layout(&self) -> Result<BrickLayout, ConfigError> {
        match &self.mask {
            Some(mask) => {
                BrickLayout::from_alpha_mask(mask, self.cols, self.rows, self.brick_size(), self.spacing)
            }
            None => BrickLayout::from_pattern(&self.pattern, self.brick_size(), self.spacing),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("time_limit", self.time_limit)?;
        self.layout().map(|_| ())
    }
}

/// All stages, in file order
#[derive(Debug, Clone)]
pub struct StageTable {
    stages: Vec<StageData>,
}

impl Default for StageTable {
    fn default() -> Self {
        Self {
            stages: vec![StageData::default()],
        }
    }
}

impl StageTable {
    /// Parse a JSON array of stages. An empty array falls back to the default table
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let stages: Vec<StageData> = serde_json::from_str(json)?;
        Self::from_stages(stages)
    }

    /// Validate and wrap stages. An empty list falls back to the default table
    pub fn from_stages(stages: Vec<StageData>) -> Result<Self, ConfigError> {
        if stages.is_empty() {
            log::warn!("Stage table is empty, using the built-in stage");
            return Ok(Self::default());
        }
        for stage in &stages {
            stage.validate()?;
        }
        log::info!("Loaded {} stage(s)", stages.len());
        Ok(Self { stages })
    }

    pub fn get(&self, id: u32) -> Result<&StageData, ConfigError> {
        self.stages
            .iter()
            .find(|s| s.id == id)
            .ok_or(ConfigError::UnknownStage(id))
    }

    pub fn first(&self) -> &StageData {
        &self.stages[0]
    }

    /// Stage by play order (0 = first)
    pub fn at(&self, index: usize) -> Option<&StageData> {
        self.stages.get(index)
    }

    /// Play order of the stage with this id
    pub fn position(&self, id: u32) -> Result<usize, ConfigError> {
        self.stages
            .iter()
            .position(|s| s.id == id)
            .ok_or(ConfigError::UnknownStage(id))
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageData> {
        self.stages.iter()
    }
}

/// Where a run is in the stage table
#[derive(Debug, Clone, Default)]
pub struct StageProgress {
    table: StageTable,
    index: usize,
}

impl StageProgress {
    pub fn new(table: StageTable) -> Self {
        Self { table, index: 0 }
    }

    pub fn current(&self) -> &StageData {
        self.table.at(self.index).unwrap_or(self.table.first())
    }

    /// 1-based stage number
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn total(&self) -> usize {
        self.table.len()
    }

    pub fn is_last(&self) -> bool {
        self.number() >= self.total()
    }

    /// The stage after the current one, if any
    pub fn peek_next(&self) -> Option<&StageData> {
        self.table.at(self.index + 1)
    }

    /// Step to the next stage; false on the last one
    pub fn advance(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.index += 1;
        true
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// "2 / 3" style progress text
    pub fn progress_text(&self) -> String {
        format!("{} / {}", self.number(), self.total())
    }
}
