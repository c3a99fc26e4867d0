use serde::{Deserialize, Serialize};

/// Configuration for a `HistoryManager`.
///
/// Deserializes from partial camelCase JSON, e.g. `{"maxHistoryStates": 20}`;
/// missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HistoryOptions {
    /// State count above which a branch is compressed. Default: **100**.
    pub max_history_states: u32,

    /// Run the compression policy after pushes and merges. Default: **true**.
    pub enable_compression: bool,

    /// Derive labels for unnamed pushes from a diff of the previous and new
    /// snapshot. When off, unnamed states get ordinal labels. Default: **true**.
    pub auto_name_states: bool,

    /// Pushes closer together than this share a batch. Default: **500**.
    pub batch_time_threshold_ms: u32,

    /// Allow `create_branch`. Default: **true**.
    pub enable_branching: bool,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            max_history_states: 100,
            enable_compression: true,
            auto_name_states: true,
            batch_time_threshold_ms: 500,
            enable_branching: true,
        }
    }
}
