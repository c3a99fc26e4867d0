//! Compression policy: bounds per-branch memory.
//!
//! Once a branch holds more than the configured ceiling, only its root, its
//! checkpoints and the `RECENT_WINDOW` most recent states survive. Relative
//! order is preserved. The recency window is fixed and independent of the
//! ceiling, so with no checkpoints a branch settles at `1 + RECENT_WINDOW`
//! states even when the ceiling is lower.

use crate::model::State;

/// Number of most recent states always retained.
pub const RECENT_WINDOW: usize = 10;

/// Compress `states` in place if it exceeds `max_states`.
///
/// Returns the remapped cursor: the new index of the state at `cursor`, or
/// of the nearest earlier survivor when that state was discarded.
pub fn compress_states<T>(states: &mut Vec<State<T>>, cursor: usize, max_states: usize) -> usize {
    let len = states.len();
    if len <= max_states {
        return cursor;
    }

    let recent_start = len.saturating_sub(RECENT_WINDOW);
    let mut kept = Vec::with_capacity(states.len().min(max_states + RECENT_WINDOW));
    let mut new_cursor = 0;

    for (i, state) in std::mem::take(states).into_iter().enumerate() {
        if i == 0 || state.is_checkpoint || i >= recent_start {
            if i <= cursor {
                new_cursor = kept.len();
            }
            kept.push(state);
        }
    }

    log::debug!(
        "compressed branch: {len} -> {} states (ceiling {max_states})",
        kept.len()
    );
    *states = kept;
    new_cursor
}
