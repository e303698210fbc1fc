//! Error types for the merge-puzzle engine.

use std::fmt;

/// Precondition violations on the engine's public API.
///
/// All variants indicate caller misuse, not runtime failure: they are
/// surfaced immediately and there is no degraded mode to fall back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// Coordinate outside the grid.
    OutOfBounds {
        /// X coordinate that was requested.
        x: u16,
        /// Y coordinate that was requested.
        y: u16,
        /// Side length of the grid.
        size: u16,
    },
    /// Tile value that is neither empty (0) nor a power of two.
    InvalidValue(u32),
    /// Grid dimensions that are below the minimum or not square.
    InvalidDimensions {
        /// Requested width.
        width: u16,
        /// Requested height.
        height: u16,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::OutOfBounds { x, y, size } => {
                write!(f, "coordinate ({x}, {y}) outside {size}x{size} grid")
            }
            EngineError::InvalidValue(value) => {
                write!(f, "invalid tile value: {value} (must be 0 or a power of two)")
            }
            EngineError::InvalidDimensions { width, height } => {
                write!(
                    f,
                    "invalid grid dimensions: {width}x{height} (must be square, at least 2x2)"
                )
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
