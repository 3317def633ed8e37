//! Template table scanning.
//!
//! A scan reads one template table without modifying it. The result holds
//! the table's non-row nodes, a copy of every row with its loop markers
//! stripped, and the clone group each row belongs to. The multiplier builds
//! every outer item's table from this one scan.

use crate::placeholder::{LoopMarker, PlaceholderRef, find_placeholder, take_loop_marker};
use crate::tree::wml::{self, ROW};
use crate::tree::{Element, Node};
use tracing::warn;

/// A row of a scanned table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedRow {
    /// Index into [`ScannedTable::groups`] when the row belongs to a clone
    /// group
    pub group: Option<usize>,
    /// Copy of the template row with its loop markers stripped
    pub row: Element,
}

/// A run of consecutive rows repeated once per element of an inner
/// collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneGroup {
    /// Key of the open marker, the inner collection's field name
    pub key: String,
    /// Whether a close marker ended the group before the table did
    pub closed: bool,
}

/// Result of scanning one template table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedTable {
    /// The table element with every `w:tr` child removed: name, attributes,
    /// and nodes such as `w:tblPr` and `w:tblGrid` in document order
    pub head: Element,
    /// Template rows in document order
    pub rows: Vec<ScannedRow>,
    /// Key of the first outer marker, `None` for a non-loop table
    pub outer_key: Option<String>,
    /// Clone groups, in the order they open
    pub groups: Vec<CloneGroup>,
}

impl ScannedTable {
    /// Whether the table repeats per outer item.
    #[inline]
    pub fn is_loop(&self) -> bool {
        self.outer_key.is_some()
    }

    /// Number of template rows belonging to a clone group.
    pub fn clone_row_count(&self) -> usize {
        self.rows.iter().filter(|r| r.group.is_some()).count()
    }
}

/// Scan a template table.
///
/// A row is a clone member when a group was open when the row started or a
/// group opens inside it. The row holding the close marker is still a
/// member; the group ends after it.
pub fn scan_table(table: &Element) -> ScannedTable {
    let mut head = Element {
        name: table.name.clone(),
        attributes: table.attributes.clone(),
        children: Vec::new(),
    };
    let mut rows = Vec::new();
    let mut outer_key = None;
    let mut groups: Vec<CloneGroup> = Vec::new();
    let mut open: Option<usize> = None;

    for child in &table.children {
        let Some(template_row) = child.as_element().filter(|e| e.name == ROW) else {
            head.children.push(child.clone());
            continue;
        };

        let mut row = template_row.clone();
        let mut group = open;
        let mut closes = false;

        for text_element in wml::row_text_elements_mut(&mut row) {
            let Some(text) = text_element.text_mut() else {
                continue;
            };
            let Some(marker) = take_loop_marker(text) else {
                continue;
            };

            if marker == LoopMarker::Outer {
                if outer_key.is_none() {
                    outer_key = Some(marker_key(text));
                }
                continue;
            }
            if marker.opens_clone() {
                if let Some(current) = open {
                    warn!(
                        key = %marker_key(text),
                        open = %groups[current].key,
                        "clone group opened while another is open, continuing the open group"
                    );
                } else {
                    groups.push(CloneGroup {
                        key: marker_key(text),
                        closed: false,
                    });
                    let id = groups.len() - 1;
                    open = Some(id);
                    group = Some(id);
                }
            }
            if marker.closes_clone() {
                if open.is_some() {
                    closes = true;
                } else {
                    warn!(key = %marker_key(text), "clone close marker without an open group");
                }
            }
        }

        if closes {
            if let Some(id) = open.take() {
                groups[id].closed = true;
            }
        }
        rows.push(ScannedRow { group, row });
    }

    ScannedTable {
        head,
        rows,
        outer_key,
        groups,
    }
}

/// Lookup key of the marker text left after stripping.
fn marker_key(text: &str) -> String {
    match find_placeholder(text) {
        Some(m) => PlaceholderRef::parse(m.body)
            .map(|p| p.key)
            .unwrap_or_else(|| m.body.to_string()),
        None => String::new(),
    }
}

/// Whether any descendant of `element` is a table.
pub(crate) fn contains_table(element: &Element) -> bool {
    element.children.iter().any(|child| match child {
        Node::Element(e) => e.name == wml::TABLE || contains_table(e),
        Node::Text(_) => false,
    })
}
