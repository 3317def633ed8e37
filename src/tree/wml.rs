//! WordprocessingML names used by the template engine.
//!
//! Tag and attribute names are matched by their qualified form as Word
//! writes them (`w:` prefix for the main namespace).
use super::Element;

pub const BODY: &str = "w:body";
pub const TABLE: &str = "w:tbl";
pub const ROW: &str = "w:tr";
pub const CELL: &str = "w:tc";
pub const CELL_PROPERTIES: &str = "w:tcPr";
pub const CELL_WIDTH: &str = "w:tcW";
pub const SHADING: &str = "w:shd";
pub const PARAGRAPH: &str = "w:p";
pub const RUN: &str = "w:r";
pub const TEXT: &str = "w:t";

/// Attribute names
pub mod attr {
    pub const FILL: &str = "w:fill";
    pub const VAL: &str = "w:val";
    pub const WIDTH: &str = "w:w";
    pub const TYPE: &str = "w:type";
}

/// Relationship part names
pub mod rel {
    pub const RELATIONSHIP: &str = "Relationship";
    pub const ID: &str = "Id";
    pub const ID_PREFIX: &str = "rId";
}

/// Text elements of a cell, following the `w:p` → `w:r` → `w:t` chain in
/// document order.
pub fn cell_text_elements(cell: &Element) -> impl Iterator<Item = &Element> {
    cell.find_all_children_by_name(PARAGRAPH)
        .flat_map(|p| p.find_all_children_by_name(RUN))
        .flat_map(|r| r.find_all_children_by_name(TEXT))
}

/// Text elements of a cell, mutably.
pub fn cell_text_elements_mut(cell: &mut Element) -> impl Iterator<Item = &mut Element> {
    cell.find_all_children_by_name_mut(PARAGRAPH)
        .flat_map(|p| p.find_all_children_by_name_mut(RUN))
        .flat_map(|r| r.find_all_children_by_name_mut(TEXT))
}

/// Text elements of every cell of a row, in document order.
pub fn row_text_elements_mut(row: &mut Element) -> impl Iterator<Item = &mut Element> {
    row.find_all_children_by_name_mut(CELL)
        .flat_map(cell_text_elements_mut)
}

/// Width of a cell in twips, when declared as `w:tcW w:type="dxa"`.
pub fn cell_width_twips(cell: &Element) -> Option<i64> {
    let width = cell
        .find_first_child_by_name(CELL_PROPERTIES)?
        .find_first_child_by_name(CELL_WIDTH)?;
    if width.attr(attr::TYPE).is_some_and(|t| t != "dxa") {
        return None;
    }
    width.attr(attr::WIDTH)?.trim().parse::<f64>().ok().map(|w| w as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::fixtures::{cell, row};

    #[test]
    fn test_cell_text_elements_order() {
        let c = cell(&["{a}", "plain", "{b}"]);
        let texts: Vec<&str> = cell_text_elements(&c).filter_map(|t| t.text()).collect();
        assert_eq!(texts, vec!["{a}", "plain", "{b}"]);
    }

    #[test]
    fn test_row_text_elements_mut() {
        let mut r = row(vec![cell(&["x"]), cell(&["y"])]);
        for t in row_text_elements_mut(&mut r) {
            if let Some(text) = t.text_mut() {
                text.make_ascii_uppercase();
            }
        }
        let texts: Vec<String> = r
            .find_all_children_by_name(CELL)
            .map(|c| c.text_recursive())
            .collect();
        assert_eq!(texts, vec!["X", "Y"]);
    }

    #[test]
    fn test_cell_width() {
        let mut c = cell(&["x"]);
        assert_eq!(cell_width_twips(&c), None);

        c.children.insert(
            0,
            Element::new(CELL_PROPERTIES)
                .with_child(
                    Element::new(CELL_WIDTH)
                        .with_attr(attr::WIDTH, "2880")
                        .with_attr(attr::TYPE, "dxa"),
                )
                .into(),
        );
        assert_eq!(cell_width_twips(&c), Some(2880));

        if let Some(w) = c
            .find_first_child_by_name_mut(CELL_PROPERTIES)
            .and_then(|p| p.find_first_child_by_name_mut(CELL_WIDTH))
        {
            w.set_attr(attr::TYPE, "pct");
        }
        assert_eq!(cell_width_twips(&c), None);
    }
}
