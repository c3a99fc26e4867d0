//! WASM bridge for the FD history engine.
//!
//! Exposes a `HistoryManager<serde_json::Value>` to the webview. Snapshots
//! and results cross the boundary as JSON strings; ids cross as numbers.
//! Fallible calls return `{"ok":true,...}` or `{"ok":false,"error":"..."}`.

use fd_history::{
    BranchId, Clock, HistoryError, HistoryManager, HistoryOptions, HistoryTree, SerializedSizeNamer,
    StateId,
};
use serde_json::{Value, json};
use wasm_bindgen::prelude::*;

/// History controller owned by the editor session in JS.
#[wasm_bindgen]
pub struct FdHistory {
    inner: HistoryManager<Value>,
}

#[wasm_bindgen]
impl FdHistory {
    /// Start a history from an initial document snapshot.
    ///
    /// `options_json` may be empty or a partial options object, e.g.
    /// `{"maxHistoryStates":50}`. Unparseable input falls back to `null`
    /// and default options.
    #[wasm_bindgen(constructor)]
    pub fn new(initial_json: &str, options_json: &str) -> Self {
        console_error_panic_hook_setup();

        let initial = serde_json::from_str(initial_json).unwrap_or_else(|e| {
            log::warn!("initial snapshot is not JSON ({e}), starting from null");
            Value::Null
        });
        Self {
            inner: HistoryManager::with_clock(initial, parse_options(options_json), HostClock),
        }
    }

    /// Rebuild a history from `export_json` output. Returns `undefined` when
    /// the JSON is malformed or fails validation.
    pub fn import_json(tree_json: &str, options_json: &str) -> Option<FdHistory> {
        let tree: HistoryTree<Value> = match serde_json::from_str(tree_json) {
            Ok(tree) => tree,
            Err(e) => {
                log::warn!("history import rejected: {e}");
                return None;
            }
        };
        match HistoryManager::import_with_parts(
            tree,
            parse_options(options_json),
            SerializedSizeNamer,
            HostClock,
        ) {
            Ok(inner) => Some(Self { inner }),
            Err(e) => {
                log::warn!("history import rejected: {e}");
                None
            }
        }
    }

    /// Push a snapshot. `name` is optional; unnamed pushes are auto-labelled.
    pub fn push_state(&mut self, snapshot_json: &str, name: Option<String>) -> String {
        match serde_json::from_str::<Value>(snapshot_json) {
            Ok(data) => {
                let id = self.inner.push_state(data, name.as_deref());
                ok_json(json!({ "stateId": id.0 }))
            }
            Err(e) => err_json(format!("snapshot is not JSON: {e}")),
        }
    }

    pub fn end_batch(&mut self) {
        self.inner.end_batch();
    }

    pub fn undo(&mut self) -> bool {
        self.inner.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.inner.redo()
    }

    /// Undo the whole gesture (batch) containing the current state.
    pub fn undo_batch(&mut self) -> bool {
        self.inner.undo_batch()
    }

    pub fn redo_batch(&mut self) -> bool {
        self.inner.redo_batch()
    }

    pub fn can_undo(&self) -> bool {
        self.inner.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.inner.can_redo()
    }

    /// The snapshot under the cursor, as JSON.
    pub fn current_data(&self) -> String {
        self.inner.current_data().to_string()
    }

    pub fn current_state_index(&self) -> u32 {
        u32::try_from(self.inner.current_state_index()).unwrap_or(u32::MAX)
    }

    pub fn active_branch_id(&self) -> f64 {
        self.inner.active_branch_id().0 as f64
    }

    pub fn create_checkpoint(&mut self, name: &str) -> f64 {
        self.inner.create_checkpoint(name).0 as f64
    }

    pub fn go_to_state(&mut self, state_id: f64) -> String {
        let Some(raw) = id_from_js(state_id) else {
            return err_json(format!("state not found in active branch: {state_id}"));
        };
        self.respond(|h| h.go_to_state(StateId(raw)).map(|()| json!({})))
    }

    pub fn create_branch(&mut self, name: &str) -> String {
        self.respond(|h| {
            h.create_branch(name)
                .map(|id| json!({ "branchId": id.0 }))
        })
    }

    pub fn switch_branch(&mut self, branch_id: f64) -> String {
        let Some(id) = branch_from_js(branch_id) else {
            return branch_not_found(branch_id);
        };
        self.respond(|h| h.switch_branch(id).map(|()| json!({})))
    }

    pub fn merge_branch(&mut self, source_branch_id: f64) -> String {
        let Some(id) = branch_from_js(source_branch_id) else {
            return branch_not_found(source_branch_id);
        };
        self.respond(|h| {
            h.merge_branch(id)
                .map(|id| json!({ "stateId": id.0 }))
        })
    }

    pub fn rename_branch(&mut self, branch_id: f64, name: &str) -> String {
        let Some(id) = branch_from_js(branch_id) else {
            return branch_not_found(branch_id);
        };
        self.respond(|h| {
            h.rename_branch(id, name)
                .map(|()| json!({}))
        })
    }

    pub fn delete_branch(&mut self, branch_id: f64) -> String {
        let Some(id) = branch_from_js(branch_id) else {
            return branch_not_found(branch_id);
        };
        self.respond(|h| {
            h.delete_branch(id)
                .map(|b| json!({ "stateCount": b.len() }))
        })
    }

    /// Branch summaries as a JSON array.
    pub fn branches(&self) -> String {
        to_json_or_error(&self.inner.branches())
    }

    /// Active-branch history entries as a JSON array, oldest first.
    pub fn history(&self) -> String {
        to_json_or_error(&self.inner.history())
    }

    /// The whole branch forest as JSON, for the host to persist.
    pub fn export_json(&self) -> String {
        to_json_or_error(&self.inner.export())
    }
}

impl FdHistory {
    fn respond(
        &mut self,
        op: impl FnOnce(&mut HistoryManager<Value>) -> Result<Value, HistoryError>,
    ) -> String {
        match op(&mut self.inner) {
            Ok(fields) => ok_json(fields),
            Err(e) => err_json(e),
        }
    }
}

// ─── Clock ───────────────────────────────────────────────────────────────

/// `Date.now()` in the browser; `SystemTime` elsewhere (native tests).
#[derive(Debug, Clone, Copy, Default)]
struct HostClock;

impl Clock for HostClock {
    fn now_ms(&self) -> u64 {
        #[cfg(target_arch = "wasm32")]
        {
            js_sys::Date::now() as u64
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            fd_history::SystemClock.now_ms()
        }
    }
}

// ─── Ids from JS ─────────────────────────────────────────────────────────

/// A JS number as a raw id: finite, non-negative, integral and exactly
/// representable. `None` for anything else (NaN, -1, 0.5, 1e30).
fn id_from_js(value: f64) -> Option<u64> {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= MAX_SAFE_INTEGER {
        Some(value as u64)
    } else {
        None
    }
}

fn branch_from_js(value: f64) -> Option<BranchId> {
    id_from_js(value).map(BranchId)
}

fn branch_not_found(value: f64) -> String {
    err_json(format!("branch not found: {value}"))
}

// ─── JSON helpers ────────────────────────────────────────────────────────

fn parse_options(options_json: &str) -> HistoryOptions {
    if options_json.trim().is_empty() {
        return HistoryOptions::default();
    }
    serde_json::from_str(options_json).unwrap_or_else(|e| {
        log::warn!("invalid history options ({e}), using defaults");
        HistoryOptions::default()
    })
}

/// Merge `fields` (an object) into `{"ok":true}`.
fn ok_json(fields: Value) -> String {
    let mut out = json!({ "ok": true });
    if let (Value::Object(out_map), Value::Object(fields)) = (&mut out, fields) {
        out_map.extend(fields);
    }
    out.to_string()
}

fn err_json(error: impl std::fmt::Display) -> String {
    json!({ "ok": false, "error": error.to_string() }).to_string()
}

fn to_json_or_error<S: serde::Serialize>(value: &S) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| err_json(format!("Serialization error: {e}")))
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("FD history WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
