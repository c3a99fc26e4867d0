//! Integration tests: push / undo / redo / checkpoint / compression.
//!
//! Drives `HistoryManager` the way the editor does, with a canvas-like
//! snapshot type and a manual clock for deterministic batching.

use fd_history::{HistoryManager, HistoryOptions, ManualClock, RECENT_WINDOW, StateId};
use pretty_assertions::assert_eq;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Canvas {
    sections: Vec<String>,
}

fn canvas(sections: &[&str]) -> Canvas {
    Canvas {
        sections: sections.iter().map(|s| s.to_string()).collect(),
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn make_history(options: HistoryOptions) -> (HistoryManager<Canvas>, ManualClock) {
    init_logging();
    let clock = ManualClock::new(1_000);
    let history = HistoryManager::with_clock(canvas(&[]), options, clock.clone());
    (history, clock)
}

fn data_on_branch(history: &HistoryManager<Canvas>) -> Vec<Canvas> {
    history
        .active_branch()
        .states
        .iter()
        .map(|s| s.data.clone())
        .collect()
}

// ─── Undo / redo ────────────────────────────────────────────────────────

#[test]
fn undo_restores_previous_data() {
    let (mut history, _) = make_history(HistoryOptions::default());
    history.push_state(canvas(&["hero"]), None);
    let previous = history.current_data().clone();

    history.push_state(canvas(&["hero", "pricing"]), None);
    assert!(history.undo());
    assert_eq!(history.current_data(), &previous);
}

#[test]
fn redo_reapplies_undone_push() {
    let (mut history, _) = make_history(HistoryOptions::default());
    history.push_state(canvas(&["hero"]), None);
    let pushed = canvas(&["hero", "footer"]);
    history.push_state(pushed.clone(), None);

    assert!(history.undo());
    assert!(history.redo());
    assert_eq!(history.current_data(), &pushed);
}

#[test]
fn undo_redo_stop_at_boundaries() {
    let (mut history, _) = make_history(HistoryOptions::default());
    assert!(!history.undo());
    assert!(!history.redo());

    history.push_state(canvas(&["a"]), None);
    assert!(history.can_undo());
    assert!(!history.can_redo());
    assert!(history.undo());
    assert!(!history.undo());
    assert_eq!(history.current_state_index(), 0);
    assert!(history.can_redo());
    assert!(history.redo());
    assert!(!history.redo());
}

#[test]
fn undo_and_redo_never_change_states() {
    let (mut history, _) = make_history(HistoryOptions::default());
    history.push_state(canvas(&["a"]), None);
    history.push_state(canvas(&["a", "b"]), None);
    let before = data_on_branch(&history);

    history.undo();
    history.undo();
    history.redo();
    assert_eq!(data_on_branch(&history), before);
}

// ─── Truncation ─────────────────────────────────────────────────────────

#[test]
fn push_after_undo_discards_future() {
    let (mut history, _) = make_history(HistoryOptions::default());
    let s0 = history.current_data().clone();
    history.push_state(canvas(&["s1"]), None);
    history.push_state(canvas(&["s2"]), None);

    history.undo();
    history.undo();
    let s3 = canvas(&["s3"]);
    history.push_state(s3.clone(), None);

    assert_eq!(data_on_branch(&history), vec![s0, s3]);
    assert!(!history.can_redo());
    assert_eq!(history.current_state_index(), 1);
}

// ─── Checkpoints ────────────────────────────────────────────────────────

#[test]
fn checkpoint_marks_current_state_without_moving() {
    let (mut history, _) = make_history(HistoryOptions::default());
    history.push_state(canvas(&["a"]), None);
    history.push_state(canvas(&["a", "b"]), None);
    history.undo();

    let id = history.create_checkpoint("Approved layout");
    assert_eq!(history.current_state_index(), 1);
    assert_eq!(history.active_branch().len(), 3);
    let state = history.current_state();
    assert_eq!(state.id, id);
    assert!(state.is_checkpoint);
    assert_eq!(state.name, "Approved layout");
}

#[test]
fn checkpoint_survives_compression() {
    let (mut history, _) = make_history(HistoryOptions {
        max_history_states: 5,
        ..Default::default()
    });
    history.push_state(canvas(&["a"]), None);
    let kept = canvas(&["a", "keep"]);
    history.push_state(kept.clone(), None);
    let checkpoint: StateId = history.create_checkpoint("Before refactor");

    for i in 0..(5 + RECENT_WINDOW + 10) {
        history.push_state(canvas(&["filler", &i.to_string()]), None);
    }

    assert!(history.active_branch().index_of(checkpoint).is_some());
    history.go_to_state(checkpoint).unwrap();
    assert_eq!(history.current_data(), &kept);
    assert_eq!(history.current_state().name, "Before refactor");
}

// ─── Compression ────────────────────────────────────────────────────────

#[test]
fn window_dominates_when_no_checkpoints() {
    let (mut history, _) = make_history(HistoryOptions {
        max_history_states: 5,
        ..Default::default()
    });
    for i in 0..10 {
        history.push_state(canvas(&[&i.to_string()]), None);
    }
    assert_eq!(history.active_branch().len(), 11);

    for i in 10..25 {
        history.push_state(canvas(&[&i.to_string()]), None);
    }
    let branch = history.active_branch();
    assert_eq!(branch.len(), 1 + RECENT_WINDOW);
    assert_eq!(branch.states[0].data, canvas(&[]));
    assert_eq!(branch.tip().data, canvas(&["24"]));
    assert_eq!(history.current_state_index(), branch.len() - 1);
}

#[test]
fn branch_length_stays_bounded() {
    let max = 20u32;
    let (mut history, _) = make_history(HistoryOptions {
        max_history_states: max,
        ..Default::default()
    });
    for i in 0..300 {
        history.push_state(canvas(&[&i.to_string()]), None);
        if i % 37 == 0 {
            history.create_checkpoint(&format!("cp {i}"));
        }
        let branch = history.active_branch();
        let bound = (max as usize).max(1 + branch.checkpoint_count() + RECENT_WINDOW);
        assert!(
            branch.len() <= bound,
            "branch grew to {} (bound {bound}) after push {i}",
            branch.len()
        );
    }
}

#[test]
fn compression_disabled_keeps_everything() {
    let (mut history, _) = make_history(HistoryOptions {
        max_history_states: 5,
        enable_compression: false,
        ..Default::default()
    });
    for i in 0..50 {
        history.push_state(canvas(&[&i.to_string()]), None);
    }
    assert_eq!(history.active_branch().len(), 51);
}

// ─── Batching ───────────────────────────────────────────────────────────

#[test]
fn rapid_pushes_share_a_batch() {
    let (mut history, clock) = make_history(HistoryOptions::default());
    history.push_state(canvas(&["drag 1"]), None);
    clock.advance(100);
    history.push_state(canvas(&["drag 2"]), None);
    clock.advance(499);
    history.push_state(canvas(&["drag 3"]), None);

    let entries = history.history();
    assert!(entries[1].batch_id.is_some());
    assert_eq!(entries[1].batch_id, entries[2].batch_id);
    assert_eq!(entries[2].batch_id, entries[3].batch_id);
}

#[test]
fn push_after_threshold_starts_new_batch() {
    let (mut history, clock) = make_history(HistoryOptions::default());
    history.push_state(canvas(&["a"]), None);
    clock.advance(501);
    history.push_state(canvas(&["b"]), None);

    let entries = history.history();
    assert_ne!(entries[1].batch_id, entries[2].batch_id);
    assert_eq!(
        entries[2].batch_id.map(|b| b.to_string()).as_deref(),
        Some("batch-1501")
    );
}

#[test]
fn history_lists_active_branch() {
    let (mut history, _) = make_history(HistoryOptions::default());
    history.push_state(canvas(&["a"]), Some("Add hero"));
    history.push_state(canvas(&["a", "b"]), None);
    history.undo();

    let entries = history.history();
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Initial State", "Add hero", "Added Elements"]);
    let current: Vec<bool> = entries.iter().map(|e| e.is_current).collect();
    assert_eq!(current, vec![false, true, false]);
}
