//! The game engine: move processing, tile spawning, and terminal-state
//! detection.
//!
//! A move extracts each row or column as a line in front-to-back order
//! (the front being the edge tiles slide toward), applies one
//! compact-and-merge pass, and writes the result back. Lines are
//! independent, so the order they are processed in does not affect the
//! outcome.

use rand::{Rng, SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::game::grid::{Coord, Grid};

/// Value of every spawned tile.
pub const SPAWN_VALUE: u32 = 2;

/// Win threshold of the standard game.
pub const DEFAULT_WIN_THRESHOLD: u32 = 2048;

/// Smallest accepted win threshold (one merge above the spawn value would
/// make every game an instant win).
const MIN_WIN_THRESHOLD: u32 = 8;

/// A direction tiles slide toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Slide toward the top edge.
    Up,
    /// Slide toward the bottom edge.
    Down,
    /// Slide toward the left edge.
    Left,
    /// Slide toward the right edge.
    Right,
}

impl Direction {
    /// All four directions, for drivers that enumerate or sample moves.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];
}

/// What a single [`GameEngine::apply_move`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveResult {
    /// Did any cell value change?
    pub changed: bool,
    /// Did any merge occur during this move?
    pub merged: bool,
    /// Was the win threshold newly reached by this call?
    pub won_now: bool,
    /// Was the loss condition newly detected by this call?
    pub game_over_now: bool,
}

/// The game engine: owns the grid and all gameplay mutation.
///
/// Single-threaded and synchronous; one engine per game session. The
/// `won` and `game_over` flags are latches: they transition false to
/// true exactly once and are never reset. Once `game_over` is latched,
/// [`GameEngine::apply_move`] is a permanent no-op.
#[derive(Debug, Clone)]
pub struct GameEngine {
    /// The board. Mutated only through engine operations.
    grid: Grid,
    /// RNG driving tile spawns. Seeded, so whole games replay from a seed.
    rng: SmallRng,
    /// Tile value that latches the win flag.
    win_threshold: u32,
    /// Win latch.
    won: bool,
    /// Loss latch.
    game_over: bool,
    /// Number of empty cells, maintained incrementally.
    empty_count: usize,
}

impl GameEngine {
    /// Create a new engine with an empty grid, seeded from entropy.
    ///
    /// The original game opens with two spawned tiles; callers place them
    /// with [`GameEngine::spawn_random_tile`] so that test positions can
    /// also be built from a truly empty board.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidDimensions`] if the grid is not
    /// square or either side is below 2, and [`EngineError::InvalidValue`]
    /// if `win_threshold` is not a power of two or is below 8.
    pub fn new(width: u16, height: u16, win_threshold: u32) -> EngineResult<Self> {
        Self::with_rng(width, height, win_threshold, SmallRng::from_entropy())
    }

    /// Create a new engine with a deterministic RNG seed.
    ///
    /// Identical seeds and identical move sequences produce identical
    /// games.
    ///
    /// # Errors
    ///
    /// Same as [`GameEngine::new`].
    pub fn with_seed(width: u16, height: u16, win_threshold: u32, seed: u64) -> EngineResult<Self> {
        Self::with_rng(width, height, win_threshold, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(width: u16, height: u16, win_threshold: u32, rng: SmallRng) -> EngineResult<Self> {
        if win_threshold < MIN_WIN_THRESHOLD || !win_threshold.is_power_of_two() {
            return Err(EngineError::InvalidValue(win_threshold));
        }

        let grid = Grid::new(width, height)?;
        let empty_count = grid.count_empty();

        Ok(Self {
            grid,
            rng,
            win_threshold,
            won: false,
            game_over: false,
            empty_count,
        })
    }

    /// Process one directional move.
    ///
    /// Applies compact-and-merge to every line, spawns a tile if anything
    /// changed, then re-evaluates the win/loss latches. A move that alters
    /// nothing consumes no turn: it returns all-false and spawns nothing.
    /// Once the loss latch is set this is a permanent no-op.
    pub fn apply_move(&mut self, direction: Direction) -> MoveResult {
        if self.game_over {
            return MoveResult::default();
        }

        let size = self.grid.size();
        let mut line = vec![0u32; usize::from(size)];
        let mut changed = false;
        let mut merges = 0;

        for index in 0..size {
            for slot in 0..size {
                let coord = line_coord(size, direction, index, slot);
                line[usize::from(slot)] = self.grid.cells()[cell_index(size, coord)];
            }

            merges += compact_and_merge(&mut line);

            // Write back in the same traversal order the line was read in
            let cells = self.grid.cells_mut();
            for slot in 0..size {
                let coord = line_coord(size, direction, index, slot);
                let idx = cell_index(size, coord);
                let value = line[usize::from(slot)];
                if cells[idx] != value {
                    cells[idx] = value;
                    changed = true;
                }
            }
        }

        if !changed {
            return MoveResult::default();
        }

        // Each merge turned an occupied cell into an empty one
        self.empty_count += merges;
        self.spawn_random_tile();
        let (won_now, game_over_now) = self.evaluate_terminal();

        MoveResult {
            changed: true,
            merged: merges > 0,
            won_now,
            game_over_now,
        }
    }

    /// Spawn a tile of value 2 on a uniformly random empty cell.
    ///
    /// Returns the chosen coordinate, or `None` if the grid is full (a
    /// defined no-op, not an error). The maintained empty count gives an
    /// O(1) "has space" check; only the placement itself scans the grid.
    pub fn spawn_random_tile(&mut self) -> Option<Coord> {
        if self.empty_count == 0 {
            return None;
        }

        let target = self.rng.gen_range(0..self.empty_count);
        let coord = self.grid.empty_cells().nth(target)?;
        let index = cell_index(self.grid.size(), coord);
        self.grid.cells_mut()[index] = SPAWN_VALUE;
        self.empty_count -= 1;
        Some(coord)
    }

    /// Write a tile value directly, keeping the empty count and the
    /// terminal-state latches consistent.
    ///
    /// This is the supported way to construct positions (tests, adapters
    /// restoring a board); gameplay itself only mutates through
    /// [`GameEngine::apply_move`]. Returns the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::OutOfBounds`] for coordinates outside the
    /// grid and [`EngineError::InvalidValue`] for values that are neither
    /// 0 nor a power of two.
    pub fn set_value(&mut self, x: u16, y: u16, value: u32) -> EngineResult<u32> {
        let previous = self.grid.set(Coord::new(x, y), value)?;
        if previous == 0 && value != 0 {
            self.empty_count -= 1;
        } else if previous != 0 && value == 0 {
            self.empty_count += 1;
        }
        self.evaluate_terminal();
        Ok(previous)
    }

    /// Get the tile value at the given position.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::OutOfBounds`] if the position is outside
    /// the grid.
    pub fn value_at(&self, x: u16, y: u16) -> EngineResult<u32> {
        self.grid.get(Coord::new(x, y))
    }

    /// Has the win threshold ever been reached?
    ///
    /// Latched: stays true even if the winning tile is later merged away
    /// or cleared.
    #[must_use]
    pub const fn is_won(&self) -> bool {
        self.won
    }

    /// Is the game lost (grid full, no merge possible anywhere)?
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Number of empty cells.
    #[must_use]
    pub const fn empty_cell_count(&self) -> usize {
        self.empty_count
    }

    /// Side length of the grid.
    #[must_use]
    pub const fn size(&self) -> u16 {
        self.grid.size()
    }

    /// The configured win threshold.
    #[must_use]
    pub const fn win_threshold(&self) -> u32 {
        self.win_threshold
    }

    /// The largest tile currently on the board.
    #[must_use]
    pub fn max_tile(&self) -> u32 {
        self.grid.cells().iter().copied().max().unwrap_or(0)
    }

    /// Read-only view of the grid, for presentation layers.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Re-evaluate the win and loss latches.
    ///
    /// Returns which of the two latched on this call. Loss is only
    /// checked on a full grid; any empty cell short-circuits it.
    fn evaluate_terminal(&mut self) -> (bool, bool) {
        let mut won_now = false;
        if !self.won && self.max_tile() >= self.win_threshold {
            self.won = true;
            won_now = true;
        }

        let mut game_over_now = false;
        if !self.game_over && self.empty_count == 0 && !self.has_available_merge() {
            self.game_over = true;
            game_over_now = true;
        }

        (won_now, game_over_now)
    }

    /// Does any pair of orthogonally-adjacent cells share a value?
    fn has_available_merge(&self) -> bool {
        let size = usize::from(self.grid.size());
        let cells = self.grid.cells();

        for y in 0..size {
            for x in 0..size {
                let value = cells[y * size + x];
                if value == 0 {
                    continue;
                }
                if x + 1 < size && cells[y * size + x + 1] == value {
                    return true;
                }
                if y + 1 < size && cells[(y + 1) * size + x] == value {
                    return true;
                }
            }
        }

        false
    }
}

/// Convert a (line, slot) pair to a grid coordinate for the given
/// direction. Slot 0 is the front: the edge tiles slide toward.
const fn line_coord(size: u16, direction: Direction, line: u16, slot: u16) -> Coord {
    match direction {
        Direction::Left => Coord::new(slot, line),
        Direction::Right => Coord::new(size - 1 - slot, line),
        Direction::Up => Coord::new(line, slot),
        Direction::Down => Coord::new(line, size - 1 - slot),
    }
}

/// Row-major index for a coordinate known to be in bounds.
fn cell_index(size: u16, coord: Coord) -> usize {
    usize::from(coord.y) * usize::from(size) + usize::from(coord.x)
}

/// One forward pass that both removes gaps and merges equal values.
///
/// At each slot: an occupied slot merges with the next occupied slot
/// behind it if the values match; an empty slot pulls the next occupied
/// value forward, then runs the same merge check. Each cell merges at
/// most once per pass, and the frontmost pair wins: `[2,2,2,0]` becomes
/// `[4,2,0,0]`, never `[8,0,0,0]`.
///
/// Returns the number of merges performed.
fn compact_and_merge(line: &mut [u32]) -> usize {
    let mut merges = 0;
    let mut i = 0;

    while i < line.len() {
        if line[i] == 0 {
            let Some(j) = next_occupied(line, i + 1) else {
                // Nothing left behind this slot
                break;
            };
            line[i] = line[j];
            line[j] = 0;
        }

        if let Some(j) = next_occupied(line, i + 1) {
            if line[j] == line[i] {
                line[i] *= 2;
                line[j] = 0;
                merges += 1;
            }
        }

        i += 1;
    }

    merges
}

/// Index of the first occupied slot at or after `from`.
fn next_occupied(line: &[u32], from: usize) -> Option<usize> {
    (from..line.len()).find(|&j| line[j] != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Engine with a fixed seed and no opening tiles, for hand-built
    /// positions.
    fn empty_engine(size: u16) -> GameEngine {
        GameEngine::with_seed(size, size, DEFAULT_WIN_THRESHOLD, 42).unwrap()
    }

    fn run_compact(mut line: Vec<u32>) -> (Vec<u32>, usize) {
        let merges = compact_and_merge(&mut line);
        (line, merges)
    }

    #[test]
    fn test_compact_pulls_tiles_forward() {
        assert_eq!(run_compact(vec![0, 0, 0, 2]), (vec![2, 0, 0, 0], 0));
        assert_eq!(run_compact(vec![0, 2, 0, 4]), (vec![2, 4, 0, 0], 0));
    }

    #[test]
    fn test_compact_noop_on_settled_line() {
        assert_eq!(run_compact(vec![4, 2, 0, 0]), (vec![4, 2, 0, 0], 0));
        assert_eq!(run_compact(vec![0, 0, 0, 0]), (vec![0, 0, 0, 0], 0));
        assert_eq!(run_compact(vec![8, 4, 2, 8]), (vec![8, 4, 2, 8], 0));
    }

    #[test]
    fn test_merge_across_gap() {
        assert_eq!(run_compact(vec![2, 0, 2, 0]), (vec![4, 0, 0, 0], 1));
        assert_eq!(run_compact(vec![2, 0, 2, 4]), (vec![4, 4, 0, 0], 1));
    }

    #[test]
    fn test_frontmost_pair_wins() {
        // The stray 2 must not re-merge into the fresh 4
        assert_eq!(run_compact(vec![2, 2, 2, 0]), (vec![4, 2, 0, 0], 1));
    }

    #[test]
    fn test_each_cell_merges_at_most_once() {
        assert_eq!(run_compact(vec![2, 2, 2, 2]), (vec![4, 4, 0, 0], 2));
        assert_eq!(run_compact(vec![4, 4, 8, 0]), (vec![8, 8, 0, 0], 1));
    }

    #[test]
    fn test_constructor_validates_threshold() {
        assert_eq!(
            GameEngine::new(4, 4, 100).err(),
            Some(EngineError::InvalidValue(100))
        );
        assert_eq!(
            GameEngine::new(4, 4, 4).err(),
            Some(EngineError::InvalidValue(4))
        );
        assert!(GameEngine::new(4, 4, 8).is_ok());
    }

    #[test]
    fn test_constructor_validates_dimensions() {
        assert_eq!(
            GameEngine::new(1, 1, 2048).err(),
            Some(EngineError::InvalidDimensions { width: 1, height: 1 })
        );
        assert_eq!(
            GameEngine::new(4, 3, 2048).err(),
            Some(EngineError::InvalidDimensions { width: 4, height: 3 })
        );
    }

    #[test]
    fn test_move_left_merges_opening_pair() {
        // (0,0)=2, (1,0)=2, move Left
        let mut engine = empty_engine(4);
        engine.set_value(0, 0, 2).unwrap();
        engine.set_value(1, 0, 2).unwrap();

        let result = engine.apply_move(Direction::Left);

        assert!(result.changed);
        assert!(result.merged);
        assert!(!result.won_now);
        assert!(!result.game_over_now);
        assert_eq!(engine.value_at(0, 0), Ok(4));
        assert_eq!(engine.value_at(1, 0), Ok(0));
        // One tile merged away, one spawned: 14 empties again
        assert_eq!(engine.empty_cell_count(), 14);
        assert_eq!(engine.grid().count_empty(), 14);
    }

    #[test]
    fn test_move_right_traversal() {
        let mut engine = empty_engine(4);
        engine.set_value(0, 1, 2).unwrap();
        engine.set_value(1, 1, 2).unwrap();

        let result = engine.apply_move(Direction::Right);

        assert!(result.merged);
        assert_eq!(engine.value_at(3, 1), Ok(4));
        assert_eq!(engine.value_at(0, 1), Ok(0));
        assert_eq!(engine.value_at(1, 1), Ok(0));
    }

    #[test]
    fn test_move_up_and_down_traversal() {
        let mut engine = empty_engine(4);
        engine.set_value(2, 1, 4).unwrap();
        engine.set_value(2, 3, 4).unwrap();

        let result = engine.apply_move(Direction::Up);
        assert!(result.merged);
        assert_eq!(engine.value_at(2, 0), Ok(8));

        let mut engine = empty_engine(4);
        engine.set_value(1, 0, 2).unwrap();
        engine.set_value(1, 2, 2).unwrap();

        let result = engine.apply_move(Direction::Down);
        assert!(result.merged);
        assert_eq!(engine.value_at(1, 3), Ok(4));
    }

    #[test]
    fn test_unchanged_move_spawns_nothing() {
        let mut engine = empty_engine(4);
        engine.set_value(0, 0, 2).unwrap();
        engine.set_value(0, 1, 4).unwrap();

        // Already flush against the left edge, nothing to merge
        let result = engine.apply_move(Direction::Left);

        assert_eq!(result, MoveResult::default());
        assert_eq!(engine.empty_cell_count(), 14);
        assert_eq!(engine.value_at(0, 0), Ok(2));
        assert_eq!(engine.value_at(0, 1), Ok(4));
    }

    #[test]
    fn test_changed_move_spawns_exactly_one_tile() {
        let mut engine = empty_engine(4);
        engine.set_value(3, 3, 2).unwrap();

        let sum_before: u32 = engine.grid().cells().iter().sum();
        let result = engine.apply_move(Direction::Up);

        assert!(result.changed);
        assert!(!result.merged);
        let sum_after: u32 = engine.grid().cells().iter().sum();
        assert_eq!(sum_after, sum_before + SPAWN_VALUE);
        assert_eq!(engine.empty_cell_count(), 14);
    }

    #[test]
    fn test_win_latch_set_and_reported_once() {
        let mut engine = GameEngine::with_seed(4, 4, 8, 7).unwrap();
        engine.set_value(0, 0, 4).unwrap();
        engine.set_value(1, 0, 4).unwrap();

        let result = engine.apply_move(Direction::Left);
        assert!(result.won_now);
        assert!(engine.is_won());
        assert_eq!(engine.value_at(0, 0), Ok(8));

        // Merge the winning tile away; the latch must hold
        engine.set_value(1, 0, 8).unwrap();
        let result = engine.apply_move(Direction::Left);
        assert!(!result.won_now);
        assert!(engine.is_won());
        assert_eq!(engine.value_at(0, 0), Ok(16));
    }

    #[test]
    fn test_win_latch_survives_clearing_the_cell() {
        let mut engine = GameEngine::with_seed(4, 4, 8, 7).unwrap();
        engine.set_value(2, 2, 8).unwrap();
        assert!(engine.is_won());

        engine.set_value(2, 2, 0).unwrap();
        assert!(engine.is_won());
    }

    /// Fill a 4x4 grid with alternating distinct powers of two so that no
    /// two adjacent cells match.
    fn fill_checkerboard(engine: &mut GameEngine) {
        for y in 0..4 {
            for x in 0..4 {
                let value = if (x + y) % 2 == 0 { 2 } else { 4 };
                engine.set_value(x, y, value).unwrap();
            }
        }
    }

    #[test]
    fn test_full_grid_without_merges_is_game_over() {
        let mut engine = empty_engine(4);
        fill_checkerboard(&mut engine);
        assert!(engine.is_game_over());
    }

    #[test]
    fn test_full_grid_with_adjacent_pair_is_not_game_over() {
        let mut engine = empty_engine(4);
        for y in 0..4 {
            for x in 0..4 {
                let value = if (x + y) % 2 == 0 { 2 } else { 4 };
                engine.set_value(x, y, value).unwrap();
            }
        }
        // Break the checkerboard: (3,3) now matches its left neighbor
        let mut engine2 = empty_engine(4);
        for y in 0..4 {
            for x in 0..4 {
                let value = if (x, y) == (3, 3) {
                    4
                } else if (x + y) % 2 == 0 {
                    2
                } else {
                    4
                };
                engine2.set_value(x, y, value).unwrap();
            }
        }

        assert!(engine.is_game_over());
        assert!(engine2.grid().is_full());
        assert!(!engine2.is_game_over());
    }

    #[test]
    fn test_loss_short_circuits_on_any_empty_cell() {
        let mut engine = empty_engine(4);
        // Checkerboard minus the last cell: one empty, not lost
        for y in 0..4 {
            for x in 0..4 {
                if (x, y) == (3, 3) {
                    continue;
                }
                let value = if (x + y) % 2 == 0 { 2 } else { 4 };
                engine.set_value(x, y, value).unwrap();
            }
        }
        assert!(!engine.is_game_over());

        // Completing the checkerboard latches the loss
        engine.set_value(3, 3, 2).unwrap();
        assert!(engine.is_game_over());
    }

    #[test]
    fn test_full_grid_with_merge_available_stays_live() {
        let mut engine = empty_engine(2);
        engine.set_value(0, 0, 2).unwrap();
        engine.set_value(1, 0, 2).unwrap();
        engine.set_value(0, 1, 4).unwrap();
        engine.set_value(1, 1, 8).unwrap();

        assert!(engine.grid().is_full());
        assert!(!engine.is_game_over());
    }

    #[test]
    fn test_game_over_detected_after_filling_move() {
        // 2x2 board: 2 4 / 0 8. Moving Left compacts row 1, the spawn
        // fills the only empty cell, and no merge remains anywhere.
        let mut engine = empty_engine(2);
        engine.set_value(0, 0, 2).unwrap();
        engine.set_value(1, 0, 4).unwrap();
        engine.set_value(1, 1, 8).unwrap();

        let result = engine.apply_move(Direction::Left);

        assert!(result.changed);
        assert!(result.game_over_now);
        assert!(engine.is_game_over());
        assert_eq!(engine.value_at(0, 1), Ok(8));
        assert_eq!(engine.value_at(1, 1), Ok(SPAWN_VALUE));
    }

    #[test]
    fn test_moves_after_game_over_are_noops() {
        let mut engine = empty_engine(4);
        fill_checkerboard(&mut engine);
        assert!(engine.is_game_over());

        let snapshot = engine.grid().clone();
        for direction in Direction::ALL {
            assert_eq!(engine.apply_move(direction), MoveResult::default());
        }
        assert_eq!(engine.grid(), &snapshot);
    }

    #[test]
    fn test_spawn_places_a_two_on_an_empty_cell() {
        let mut engine = empty_engine(4);
        let coord = engine.spawn_random_tile().unwrap();
        assert_eq!(engine.grid().get(coord), Ok(SPAWN_VALUE));
        assert_eq!(engine.empty_cell_count(), 15);
    }

    #[test]
    fn test_spawn_on_full_grid_is_noop() {
        let mut engine = empty_engine(4);
        fill_checkerboard(&mut engine);

        assert_eq!(engine.spawn_random_tile(), None);
        assert_eq!(engine.empty_cell_count(), 0);
    }

    #[test]
    fn test_same_seed_same_game() {
        let play = |seed: u64| {
            let mut engine = GameEngine::with_seed(4, 4, 2048, seed).unwrap();
            engine.spawn_random_tile();
            engine.spawn_random_tile();
            for _ in 0..200 {
                for direction in Direction::ALL {
                    engine.apply_move(direction);
                }
            }
            engine
        };

        let a = play(12345);
        let b = play(12345);
        assert_eq!(a.grid(), b.grid());
        assert_eq!(a.empty_cell_count(), b.empty_cell_count());
        assert_eq!(a.is_won(), b.is_won());
        assert_eq!(a.is_game_over(), b.is_game_over());
    }

    #[test]
    fn test_set_value_tracks_empty_count() {
        let mut engine = empty_engine(4);
        assert_eq!(engine.empty_cell_count(), 16);

        engine.set_value(1, 1, 2).unwrap();
        assert_eq!(engine.empty_cell_count(), 15);

        // Overwriting an occupied cell doesn't change the count
        engine.set_value(1, 1, 4).unwrap();
        assert_eq!(engine.empty_cell_count(), 15);

        engine.set_value(1, 1, 0).unwrap();
        assert_eq!(engine.empty_cell_count(), 16);
    }

    #[test]
    fn test_max_tile() {
        let mut engine = empty_engine(4);
        assert_eq!(engine.max_tile(), 0);
        engine.set_value(0, 3, 64).unwrap();
        engine.set_value(2, 1, 16).unwrap();
        assert_eq!(engine.max_tile(), 64);
    }
}
