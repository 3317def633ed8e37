//! Tree builders shared by unit tests.

use super::wml::{CELL, PARAGRAPH, ROW, RUN, TABLE, TEXT};
use super::{Element, Node};

/// A `w:tc` with one paragraph per text, each holding a single run.
pub fn cell(texts: &[&str]) -> Element {
    texts.iter().fold(Element::new(CELL), |c, text| {
        c.with_child(
            Element::new(PARAGRAPH)
                .with_child(Element::new(RUN).with_child(Element::new(TEXT).with_text(*text))),
        )
    })
}

/// A `w:tr` holding the given cells.
pub fn row(cells: Vec<Element>) -> Element {
    cells
        .into_iter()
        .fold(Element::new(ROW), |r, c| r.with_child(c))
}

/// A row with one single-text cell per entry.
pub fn text_row(texts: &[&str]) -> Element {
    row(texts.iter().map(|t| cell(&[*t])).collect())
}

/// A `w:tbl` with a `w:tblPr` and `w:tblGrid` head followed by `rows`.
pub fn table(rows: Vec<Element>) -> Element {
    let head = Element::new(TABLE)
        .with_child(Element::new("w:tblPr"))
        .with_child(Element::new("w:tblGrid").with_child(Element::new("w:gridCol")));
    rows.into_iter().fold(head, |t, r| t.with_child(r))
}

/// Texts of every cell of every row of a table, row by row.
pub fn table_texts(table: &Element) -> Vec<Vec<String>> {
    table
        .find_all_children_by_name(ROW)
        .map(|r| {
            r.find_all_children_by_name(CELL)
                .map(Element::text_recursive)
                .collect()
        })
        .collect()
}

/// Collect the tables of a body sequence.
pub fn tables(body: &[Node]) -> Vec<&Element> {
    body.iter()
        .filter_map(Node::as_element)
        .filter(|e| e.name == TABLE)
        .collect()
}
