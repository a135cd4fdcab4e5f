//! Configuration errors.
//!
//! Only stage/tuning loading can fail. Once a stage is configured the tick
//! loop never returns an error: anomalies found while simulating are clamped
//! locally and logged instead.

use std::fmt;

/// Errors surfaced when loading tuning, stage tables or brick layouts.
#[derive(Debug)]
pub enum ConfigError {
    /// A size, speed or count that must be strictly positive was not.
    InvalidDimension {
        /// Name of the offending field (for logging).
        name: &'static str,
        /// The value that was rejected.
        value: f32,
    },

    /// A ratio that must lie in an open range did not.
    OutOfRange {
        name: &'static str,
        value: f32,
        range: &'static str,
    },

    /// The layout contains no destructible bricks.
    EmptyLayout,

    /// Pattern rows differ in length.
    RaggedPattern {
        /// Zero-based row index that broke the width.
        row: usize,
        expected: usize,
        got: usize,
    },

    /// Pattern contains a character with no cell meaning.
    UnknownCell { row: usize, col: usize, ch: char },

    /// An alpha mask's sample count does not match `width * height`.
    MaskSize { expected: usize, got: usize },

    /// Declared brick total disagrees with the layout.
    BrickCountMismatch { declared: u32, layout: u32 },

    /// The laid-out bricks do not fit inside the play field.
    LayoutTooLarge { width: f32, height: f32 },

    /// Combo tiers must have non-decreasing multipliers.
    NonMonotonicCombo { min_count: u32 },

    /// No stage with this id exists in the table.
    UnknownStage(u32),

    /// JSON could not be parsed into the expected shape.
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidDimension { name, value } => {
                write!(f, "'{}' must be positive, got {}", name, value)
            }
            ConfigError::OutOfRange { name, value, range } => {
                write!(f, "'{}' = {} is outside {}", name, value, range)
            }
            ConfigError::EmptyLayout => write!(f, "brick layout contains no bricks"),
            ConfigError::RaggedPattern { row, expected, got } => write!(
                f,
                "pattern row {} has {} cells, expected {}",
                row, got, expected
            ),
            ConfigError::UnknownCell { row, col, ch } => {
                write!(f, "unknown pattern cell {:?} at row {}, col {}", ch, row, col)
            }
            ConfigError::MaskSize { expected, got } => write!(
                f,
                "alpha mask has {} samples, expected {}",
                got, expected
            ),
            ConfigError::BrickCountMismatch { declared, layout } => write!(
                f,
                "stage declares {} bricks but the layout holds {}",
                declared, layout
            ),
            ConfigError::LayoutTooLarge { width, height } => write!(
                f,
                "brick layout ({:.2} x {:.2}) does not fit the play field",
                width, height
            ),
            ConfigError::NonMonotonicCombo { min_count } => write!(
                f,
                "combo tier at {} lowers the multiplier",
                min_count
            ),
            ConfigError::UnknownStage(id) => write!(f, "stage {} not found", id),
            ConfigError::Parse(err) => write!(f, "invalid JSON: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

/// Reject non-positive (or NaN) values.
pub(crate) fn require_positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidDimension { name, value })
    }
}

/// Reject negative, infinite or NaN values; zero is allowed.
pub(crate) fn require_non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            range: "[0, inf)",
        })
    }
}
