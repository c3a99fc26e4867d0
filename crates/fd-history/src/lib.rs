//! FD history engine: branching undo/redo over opaque document snapshots.
//!
//! The editor pushes a snapshot after every meaningful mutation. Rapid
//! pushes (drag frames, keystrokes) share a batch, long histories are
//! compressed down to their root, checkpoints and most recent states, and
//! alternative edits can live on named branches that merge back by copying
//! a branch tip.

pub mod batch;
pub mod clock;
pub mod compress;
pub mod error;
pub mod export;
pub mod id;
pub mod manager;
pub mod model;
pub mod naming;
pub mod options;
pub mod tree;

pub use clock::{Clock, ManualClock, SystemClock};
pub use compress::RECENT_WINDOW;
pub use error::{HistoryError, Result};
pub use export::HistoryTree;
pub use id::{BatchId, BranchId, StateId};
pub use manager::{HistoryManager, INITIAL_STATE_NAME, ROOT_BRANCH_NAME};
pub use model::{Branch, BranchSummary, State, StateSummary};
pub use naming::{OrdinalNamer, SerializedSizeNamer, SnapshotDiff, StateNamer};
pub use options::HistoryOptions;
