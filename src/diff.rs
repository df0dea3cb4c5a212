//! Snapshot comparison
//!
//! Two snapshots are equal when they hold the same multiset of rows. Row
//! order is ignored and duplicate rows are counted.

use crate::error::{EditorError, Result};
use crate::snapshot::{Row, TableSnapshot};
use indexmap::IndexMap;
use serde::Serialize;

/// A row whose multiplicity changed, with how many copies were added or removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowDelta {
    pub row: Row,
    pub count: usize,
}

/// Rows present more often in the edited snapshot (`added`) or in the
/// original (`removed`), in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowDiff {
    pub added: Vec<RowDelta>,
    pub removed: Vec<RowDelta>,
}

impl RowDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    pub fn added_rows(&self) -> usize {
        self.added.iter().map(|d| d.count).sum()
    }

    pub fn removed_rows(&self) -> usize {
        self.removed.iter().map(|d| d.count).sum()
    }
}

/// Fail with `SchemaMismatch` unless both snapshots have the same columns
pub fn ensure_compatible(original: &TableSnapshot, edited: &TableSnapshot) -> Result<()> {
    if original.same_shape(edited) {
        return Ok(());
    }

    Err(EditorError::schema_mismatch(format!(
        "original columns [{}] do not match edited columns [{}]",
        original.column_names().join(", "),
        edited.column_names().join(", ")
    )))
}

/// True iff some row occurs a different number of times in the two snapshots
pub fn differs(original: &TableSnapshot, edited: &TableSnapshot) -> bool {
    if original.row_count() != edited.row_count() {
        return true;
    }
    row_balance(original.rows(), edited.rows())
        .values()
        .any(|&balance| balance != 0)
}

/// Per-row change summary for display
pub fn summarize(original: &TableSnapshot, edited: &TableSnapshot) -> RowDiff {
    let mut diff = RowDiff::default();

    for (row, balance) in row_balance(original.rows(), edited.rows()) {
        if balance > 0 {
            diff.added.push(RowDelta {
                row: row.clone(),
                count: balance as usize,
            });
        } else if balance < 0 {
            diff.removed.push(RowDelta {
                row: row.clone(),
                count: balance.unsigned_abs() as usize,
            });
        }
    }

    diff
}

/// Edited count minus original count for every distinct row
fn row_balance<'a>(original: &'a [Row], edited: &'a [Row]) -> IndexMap<&'a Row, i64> {
    let mut balance: IndexMap<&Row, i64> = IndexMap::new();
    for row in original {
        *balance.entry(row).or_insert(0) -= 1;
    }
    for row in edited {
        *balance.entry(row).or_insert(0) += 1;
    }
    balance
}
