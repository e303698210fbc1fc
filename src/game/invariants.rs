//! Engine invariants - sanity checks that detect bugs.
//!
//! These should NEVER trigger in a correctly implemented engine. They are
//! not gameplay rules; they are bug detectors run by the property and
//! integration tests after arbitrary move sequences.

use crate::game::GameEngine;

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all engine invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(engine: &GameEngine) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    // The incremental empty count must match a fresh scan
    let scanned = engine.grid().count_empty();
    if engine.empty_cell_count() != scanned {
        violations.push(InvariantViolation {
            message: format!(
                "empty count {} does not match scan {}",
                engine.empty_cell_count(),
                scanned
            ),
        });
    }

    // Every cell is 0 or a power of two; values only ever arise from
    // spawning 2 or doubling
    for (coord, value) in engine.grid().iter() {
        if value != 0 && !value.is_power_of_two() {
            violations.push(InvariantViolation {
                message: format!("cell {coord:?} holds non-power-of-two value {value}"),
            });
        }
    }

    // A reached threshold must have latched the win flag
    if engine.max_tile() >= engine.win_threshold() && !engine.is_won() {
        violations.push(InvariantViolation {
            message: format!(
                "max tile {} reached threshold {} but win is not latched",
                engine.max_tile(),
                engine.win_threshold()
            ),
        });
    }

    // Loss is only declared on a full grid
    if engine.is_game_over() && engine.empty_cell_count() != 0 {
        violations.push(InvariantViolation {
            message: format!(
                "game over latched with {} empty cells",
                engine.empty_cell_count()
            ),
        });
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Direction;

    #[test]
    fn test_fresh_engine_has_no_violations() {
        let engine = GameEngine::with_seed(4, 4, 2048, 1).unwrap();
        assert!(check_invariants(&engine).is_empty());
    }

    #[test]
    fn test_invariants_hold_through_play() {
        let mut engine = GameEngine::with_seed(4, 4, 2048, 99).unwrap();
        engine.spawn_random_tile();
        engine.spawn_random_tile();

        for _ in 0..50 {
            for direction in Direction::ALL {
                engine.apply_move(direction);
                let violations = check_invariants(&engine);
                assert!(violations.is_empty(), "violations: {violations:?}");
            }
        }
    }

    #[test]
    fn test_violation_message_format() {
        let violation = InvariantViolation {
            message: "something broke".to_string(),
        };
        assert_eq!(
            violation.to_string(),
            "Invariant violation: something broke"
        );
    }
}
