//! Diff and naming helpers for auto-labelled history entries.
//!
//! Labels are cosmetic. The default heuristic compares serialized sizes of
//! the previous and new snapshot; hosts that know their document model can
//! install their own `StateNamer`.

use serde::Serialize;

/// Coarse classification of a change between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotDiff {
    Added,
    Removed,
    Modified,
}

impl SnapshotDiff {
    /// Classify by size: growth reads as added content, shrinkage as removed,
    /// equal size as modified.
    pub fn from_sizes(previous: usize, next: usize) -> Self {
        match next.cmp(&previous) {
            std::cmp::Ordering::Greater => SnapshotDiff::Added,
            std::cmp::Ordering::Less => SnapshotDiff::Removed,
            std::cmp::Ordering::Equal => SnapshotDiff::Modified,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SnapshotDiff::Added => "Added Elements",
            SnapshotDiff::Removed => "Removed Elements",
            SnapshotDiff::Modified => "Modified Elements",
        }
    }
}

/// Compare the JSON-serialized sizes of two snapshots.
pub fn serialized_diff<T: Serialize + ?Sized>(
    previous: &T,
    next: &T,
) -> Result<SnapshotDiff, serde_json::Error> {
    let before = serde_json::to_vec(previous)?.len();
    let after = serde_json::to_vec(next)?.len();
    Ok(SnapshotDiff::from_sizes(before, after))
}

/// Fallback label for a state at `index` within its branch.
pub fn ordinal_name(index: usize) -> String {
    format!("State {index}")
}

/// Derives a label for an unnamed push. Returning `None` falls back to an
/// ordinal label.
pub trait StateNamer<T> {
    fn name(&self, previous: &T, next: &T) -> Option<String>;
}

/// Default namer: `serialized_diff` label.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerializedSizeNamer;

impl<T: Serialize> StateNamer<T> for SerializedSizeNamer {
    fn name(&self, previous: &T, next: &T) -> Option<String> {
        match serialized_diff(previous, next) {
            Ok(diff) => Some(diff.label().to_string()),
            Err(e) => {
                log::warn!("auto-naming skipped, snapshot not serializable: {e}");
                None
            }
        }
    }
}

/// Namer that never names; every unnamed push gets an ordinal label.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrdinalNamer;

impl<T> StateNamer<T> for OrdinalNamer {
    fn name(&self, _previous: &T, _next: &T) -> Option<String> {
        None
    }
}

impl<T, F> StateNamer<T> for F
where
    F: Fn(&T, &T) -> Option<String>,
{
    fn name(&self, previous: &T, next: &T) -> Option<String> {
        self(previous, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serializer;
    use serde_json::json;

    #[test]
    fn size_classification() {
        let a = json!({"sections": [1]});
        let b = json!({"sections": [1, 2]});
        assert_eq!(serialized_diff(&a, &b).unwrap(), SnapshotDiff::Added);
        assert_eq!(serialized_diff(&b, &a).unwrap(), SnapshotDiff::Removed);
        let c = json!({"sections": [3]});
        assert_eq!(serialized_diff(&a, &c).unwrap(), SnapshotDiff::Modified);
    }

    #[test]
    fn labels() {
        assert_eq!(SnapshotDiff::Added.label(), "Added Elements");
        assert_eq!(SnapshotDiff::Removed.label(), "Removed Elements");
        assert_eq!(SnapshotDiff::Modified.label(), "Modified Elements");
        assert_eq!(ordinal_name(3), "State 3");
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _s: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("opaque"))
        }
    }

    #[test]
    fn serialization_failure_yields_none() {
        let namer = SerializedSizeNamer;
        assert_eq!(namer.name(&Unserializable, &Unserializable), None);
    }

    #[test]
    fn closures_are_namers() {
        let namer = |a: &i32, b: &i32| Some(format!("{a} -> {b}"));
        assert_eq!(StateNamer::name(&namer, &1, &2).as_deref(), Some("1 -> 2"));
    }
}
