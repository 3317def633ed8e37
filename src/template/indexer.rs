//! Loop index stamping.
//!
//! After multiplication every placeholder of an outer item's table learns
//! its iteration address: `{key}` becomes `{key__i}`, or `{key__i__j}` when
//! `key` names an inner collection of the item. Inside a clone block the
//! inner index `j` is the block's repetition number, so every row of the
//! third repetition addresses element 2 whatever the block holds. Rows outside
//! clone groups count occurrences of the same placeholder key instead.

use super::multiplier::MultipliedRow;
use crate::context::Value;
use crate::placeholder::{PlaceholderRef, append_indices, find_placeholder, refers_to_outer_item};
use crate::tree::wml;
use std::collections::HashMap;
use tracing::trace;

/// Per-key occurrence counters for the fixed rows of one outer item.
#[derive(Debug, Default)]
pub struct InnerCounters {
    counts: HashMap<String, usize>,
}

impl InnerCounters {
    /// Create an empty set of counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the current count of `key` and advance it.
    pub fn next(&mut self, key: &str) -> usize {
        if let Some(count) = self.counts.get_mut(key) {
            let current = *count;
            *count += 1;
            return current;
        }
        self.counts.insert(key.to_string(), 1);
        0
    }
}

/// Stamp loop indices onto the rows of outer item `outer`.
///
/// `collection` is the outer collection's name; a placeholder naming the
/// item itself (`{image}` for `images`) only gets the outer index.
/// Placeholders that already carry indices, or whose text does not parse,
/// are left alone.
pub fn index_rows(rows: &mut [MultipliedRow], outer: usize, item: &Value, collection: &str) {
    let mut counters = InnerCounters::new();
    for MultipliedRow { row, repetition } in rows {
        let repetition = *repetition;
        for text_element in wml::row_text_elements_mut(row) {
            let Some(text) = text_element.text_mut() else {
                continue;
            };
            let Some(m) = find_placeholder(text) else {
                continue;
            };
            let Some(placeholder) = PlaceholderRef::parse(m.body) else {
                continue;
            };
            if placeholder.outer.is_some() {
                continue;
            }

            let range = m.range.clone();
            let inner = if refers_to_outer_item(&placeholder.key, collection) {
                None
            } else if item.field(&placeholder.key).is_some_and(Value::is_collection) {
                Some(repetition.unwrap_or_else(|| counters.next(&placeholder.raw_key)))
            } else {
                None
            };
            append_indices(text, &range, outer, inner);
            trace!(outer, ?inner, key = %placeholder.raw_key, "indexed placeholder");
        }
    }
}
