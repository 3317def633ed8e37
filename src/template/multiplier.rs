//! Row multiplication for one outer item.
//!
//! Rows outside clone groups are emitted once, in template order. Each clone
//! group is emitted as a block, repeated once per element of the outer
//! item's inner collection named by the group key. A group whose collection
//! is absent, empty or not a collection disappears from the output.
//!
//! Each emitted row remembers which repetition of its clone block it belongs
//! to, so the indexer can address the matching inner element.

use super::scanner::{ScannedRow, ScannedTable};
use crate::common::{Error, Result};
use crate::config::UnclosedClonePolicy;
use crate::context::Value;
use crate::tree::Element;
use smallvec::SmallVec;
use tracing::warn;

/// A row emitted for one outer item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipliedRow {
    /// Fresh copy of the template row
    pub row: Element,
    /// Zero-based repetition of the clone block holding the row, `None` for
    /// rows outside clone groups
    pub repetition: Option<usize>,
}

impl MultipliedRow {
    fn fixed(row: &Element) -> Self {
        Self {
            row: row.clone(),
            repetition: None,
        }
    }
}

/// Rows of one outer item, in output order.
///
/// Every returned row is a fresh copy; rows repeated from the same template
/// row share no state.
pub fn multiply_rows(
    scanned: &ScannedTable,
    item: &Value,
    policy: UnclosedClonePolicy,
    table_index: usize,
) -> Result<Vec<MultipliedRow>> {
    let mut output = Vec::with_capacity(scanned.rows.len());
    let mut pending: SmallVec<[&Element; 8]> = SmallVec::new();
    let mut pending_group: Option<usize> = None;

    for ScannedRow { group, row } in &scanned.rows {
        if pending_group.is_some() && *group != pending_group {
            flush(scanned, item, pending_group, &mut pending, &mut output);
        }
        match group {
            Some(_) => {
                pending_group = *group;
                pending.push(row);
            },
            None => {
                pending_group = None;
                output.push(MultipliedRow::fixed(row));
            },
        }
    }

    if let Some(id) = pending_group {
        let group = &scanned.groups[id];
        if !group.closed {
            match policy {
                UnclosedClonePolicy::Reject => {
                    return Err(Error::UnclosedCloneGroup {
                        table: table_index,
                        key: group.key.clone(),
                    });
                },
                UnclosedClonePolicy::RepeatInner => {
                    warn!(
                        table = table_index,
                        key = %group.key,
                        "clone group not closed before the end of the table"
                    );
                },
            }
        }
        flush(scanned, item, pending_group, &mut pending, &mut output);
    }

    Ok(output)
}

/// Emit the pending clone block `inner length` times and clear it.
fn flush<'a>(
    scanned: &ScannedTable,
    item: &Value,
    group: Option<usize>,
    pending: &mut SmallVec<[&'a Element; 8]>,
    output: &mut Vec<MultipliedRow>,
) {
    if let Some(id) = group {
        let repeats = inner_len(item, &scanned.groups[id].key);
        output.reserve(repeats * pending.len());
        for repetition in 0..repeats {
            output.extend(pending.iter().map(|row| MultipliedRow {
                row: (*row).clone(),
                repetition: Some(repetition),
            }));
        }
    }
    pending.clear();
}

/// Length of the inner collection `key` of an outer item, 0 when absent.
pub fn inner_len(item: &Value, key: &str) -> usize {
    item.field(key)
        .and_then(Value::collection_len)
        .unwrap_or(0)
}

/// Assemble a table from the scanned head and the rows of one outer item.
/// Head nodes come first, rows after them.
pub fn wrap_table(head: &Element, rows: Vec<MultipliedRow>) -> Element {
    let mut table = head.clone();
    table.children.reserve(rows.len());
    table.children.extend(rows.into_iter().map(|r| r.row.into()));
    table
}
