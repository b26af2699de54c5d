//! Positional record of bound fragments and literal reconstruction.

use parking_lot::Mutex;

/// One parameter position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// Never bound, or skipped by a bind further right.
    Unset,
    Bound(String),
}

/// Ordered fragments addressed by 1-based position.
///
/// Every operation takes the lock once and releases it before returning,
/// so no caller ever holds it across a call into the wrapped statement.
#[derive(Debug, Default)]
pub struct ArgumentTrace {
    slots: Mutex<Vec<Slot>>,
}

impl ArgumentTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `fragment` at 1-based `position`, padding any gap with [`Slot::Unset`].
    ///
    /// Returns `false` (and stores nothing) for position 0.
    pub fn set(&self, position: usize, fragment: String) -> bool {
        let Some(index) = position.checked_sub(1) else {
            return false;
        };
        let mut slots = self.slots.lock();
        if index >= slots.len() {
            slots.resize(index + 1, Slot::Unset);
        }
        slots[index] = Slot::Bound(fragment);
        true
    }

    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Copy of the slots; `None` for unset positions.
    pub fn snapshot(&self) -> Vec<Option<String>> {
        self.slots
            .lock()
            .iter()
            .map(|slot| match slot {
                Slot::Unset => None,
                Slot::Bound(text) => Some(text.clone()),
            })
            .collect()
    }

    /// Substitute the Nth `marker` in `template` with slot N.
    ///
    /// Markers without a bound slot are left as the marker itself.
    pub fn reconstruct(&self, template: &str, marker: char) -> String {
        let slots = self.slots.lock();
        let mut out = String::with_capacity(template.len() + slots.len() * 8);
        let mut next = 0;
        for c in template.chars() {
            if c != marker {
                out.push(c);
                continue;
            }
            match slots.get(next) {
                Some(Slot::Bound(text)) => out.push_str(text),
                _ => out.push(marker),
            }
            next += 1;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQL: &str = "SELECT * FROM t WHERE a=? AND b=? AND c=?";

    #[test]
    fn test_partial_binds_leave_markers() {
        let trace = ArgumentTrace::new();
        trace.set(2, "'x'".to_string());
        assert_eq!(
            trace.reconstruct(SQL, '?'),
            "SELECT * FROM t WHERE a=? AND b='x' AND c=?"
        );
    }

    #[test]
    fn test_sparse_set_pads_with_unset() {
        let trace = ArgumentTrace::new();
        trace.set(5, "5".to_string());
        assert_eq!(trace.len(), 5);
        assert_eq!(
            trace.snapshot(),
            vec![None, None, None, None, Some("5".to_string())]
        );
    }

    #[test]
    fn test_rebind_and_clear() {
        let trace = ArgumentTrace::new();
        trace.set(1, "1".to_string());
        trace.set(1, "2".to_string());
        assert_eq!(trace.snapshot(), vec![Some("2".to_string())]);
        trace.clear();
        assert!(trace.is_empty());
        assert_eq!(trace.reconstruct(SQL, '?'), SQL);
    }

    #[test]
    fn test_position_zero_is_rejected() {
        let trace = ArgumentTrace::new();
        assert!(!trace.set(0, "x".to_string()));
        assert!(trace.is_empty());
    }

    #[test]
    fn test_extra_fragments_and_trailing_text() {
        let trace = ArgumentTrace::new();
        for i in 1..=4 {
            trace.set(i, i.to_string());
        }
        assert_eq!(trace.reconstruct("?,? -- end", '?'), "1,2 -- end");
        assert_eq!(trace.reconstruct("no markers", '?'), "no markers");
        assert_eq!(trace.reconstruct(":a :b", ':'), "1a 2b");
    }

    #[test]
    fn test_null_fragment_is_distinct_from_unset() {
        let trace = ArgumentTrace::new();
        trace.set(2, "NULL".to_string());
        assert_eq!(trace.reconstruct("?,?", '?'), "?,NULL");
    }
}
