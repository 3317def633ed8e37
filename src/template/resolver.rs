//! Cell resolution.
//!
//! Runs after every table has been expanded. Each cell's first placeholder
//! is parsed into a [`CellSettings`] directive, the directive is applied
//! against the data context, and a row is dropped when any of its cells
//! asks for removal.

use super::drawing::build_image_paragraph;
use super::relmap::{BuildContext, ImagePath};
use crate::common::unit::{scale_i64, twip_to_emu_i64};
use crate::config::EngineConfig;
use crate::context::Value;
use crate::placeholder::{PlaceholderRef, find_placeholder};
use crate::tree::wml::{self, CELL, CELL_PROPERTIES, ROW, RUN, SHADING, TEXT, attr};
use crate::tree::{Element, Node};
use tracing::{trace, warn};

/// Key of an image placeholder.
pub const IMAGE_KEY: &str = "image";
/// Key of an image title placeholder.
pub const IMAGE_TITLE_KEY: &str = "image_title";

/// Elements that follow `w:shd` inside `w:tcPr`.
const AFTER_SHADING: &[&str] = &[
    "w:noWrap",
    "w:tcMar",
    "w:textDirection",
    "w:tcFitText",
    "w:vAlign",
    "w:hideMark",
    "w:headers",
    "w:cellIns",
    "w:cellDel",
    "w:cellMerge",
    "w:tcPrChange",
];

/// What a cell's placeholder asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellDirective {
    /// Substitute a data value into the placeholder's text leaf
    Replace(PlaceholderRef),
    /// Replace the cell content with the outer item's image
    Image(PlaceholderRef),
    /// Write the fixed image title label
    ImageTitle,
}

/// Per-cell resolution state. Derived fresh for every cell and discarded
/// once the cell is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellSettings {
    /// Directive of the cell's first placeholder
    pub directive: Option<CellDirective>,
    /// Position of the placeholder's text leaf among the cell's text leaves
    pub leaf: usize,
    /// Background colour picked up from a styled value
    pub background: Option<String>,
    /// Whether the cell asks for its row to be removed
    pub remove: bool,
}

/// Derive the settings of a cell from its first placeholder.
///
/// Only the first text leaf holding a `{...}` expression counts. When that
/// expression does not parse the cell gets no directive.
pub fn cell_settings(cell: &Element) -> CellSettings {
    for (leaf, text_element) in wml::cell_text_elements(cell).enumerate() {
        let Some(m) = text_element.text().and_then(find_placeholder) else {
            continue;
        };
        let directive = PlaceholderRef::parse(m.body).map(|p| match p.raw_key.as_str() {
            IMAGE_KEY => CellDirective::Image(p),
            IMAGE_TITLE_KEY => CellDirective::ImageTitle,
            _ => CellDirective::Replace(p),
        });
        return CellSettings {
            directive,
            leaf,
            ..CellSettings::default()
        };
    }
    CellSettings::default()
}

/// Applies cell directives against one build's data.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    config: &'a EngineConfig,
    ctx: BuildContext<'a>,
}

impl<'a> Resolver<'a> {
    pub fn new(config: &'a EngineConfig, ctx: BuildContext<'a>) -> Self {
        Self { config, ctx }
    }

    /// Resolve every row of a table, dropping rows with a removing cell.
    /// Returns the number of rows removed.
    pub fn resolve_table(&self, table: &mut Element) -> usize {
        let before = table.children.len();
        table.children.retain_mut(|node| {
            let Node::Element(row) = node else {
                return true;
            };
            if row.name != ROW {
                return true;
            }
            // every cell is resolved, even after one asked for removal
            let mut keep = true;
            for cell in row.find_all_children_by_name_mut(CELL) {
                if self.resolve_cell(cell).remove {
                    keep = false;
                }
            }
            keep
        });
        before - table.children.len()
    }

    /// Resolve one cell in place and return its settings.
    pub fn resolve_cell(&self, cell: &mut Element) -> CellSettings {
        let mut settings = cell_settings(cell);
        trace!(directive = ?settings.directive, "resolving cell");

        self.change_text(cell, &mut settings);
        if let Some(color) = &settings.background {
            change_shd(cell, color);
        }
        match &settings.directive {
            Some(CellDirective::Image(placeholder)) => self.add_image(cell, placeholder),
            Some(CellDirective::ImageTitle) => {
                set_leaf_text(cell, settings.leaf, &self.config.image_title_label);
            },
            _ => {},
        }
        settings
    }

    fn item_field(&self, outer: usize, key: &str) -> Option<&'a Value> {
        self.ctx
            .data()
            .items(&self.config.outer_collection)?
            .get(outer)?
            .field(key)
    }

    fn change_text(&self, cell: &mut Element, settings: &mut CellSettings) {
        let Some(CellDirective::Replace(placeholder)) = &settings.directive else {
            return;
        };

        let value = match (placeholder.outer, placeholder.inner) {
            (None, _) => match self.ctx.data().get(&placeholder.key) {
                Some(value) => value,
                None => {
                    warn!(key = %placeholder.key, "placeholder missing from data");
                    set_leaf_text(cell, settings.leaf, &self.config.missing_placeholder_text);
                    return;
                },
            },
            (Some(outer), None) => match self.item_field(outer, &placeholder.key) {
                Some(value) => value,
                None => return,
            },
            (Some(outer), Some(inner)) => {
                let Some(entry) = self
                    .item_field(outer, &placeholder.key)
                    .and_then(|v| v.index(inner))
                else {
                    return;
                };
                if placeholder.optional && entry.display_text().is_none() {
                    settings.remove = true;
                    return;
                }
                entry
            },
        };

        match value {
            Value::Scalar(text) => set_leaf_text(cell, settings.leaf, text),
            Value::Styled { text, color } => {
                if let Some(text) = text {
                    set_leaf_text(cell, settings.leaf, text);
                }
                settings.background = color.clone();
            },
            Value::Collection(_) | Value::Record(_) => {
                trace!(key = %placeholder.key, "value has no display text, cell left as is");
            },
        }
    }

    /// Replace the cell content with the image of the placeholder's outer
    /// item. A leading `w:tcPr` is kept, and so is a third child of the cell,
    /// relabelled as the image title.
    fn add_image(&self, cell: &mut Element, placeholder: &PlaceholderRef) {
        let Some(outer) = placeholder.outer else {
            warn!(placeholder = %placeholder, "image placeholder without a loop index");
            return;
        };
        let path = if placeholder.inner.is_some() {
            ImagePath::Clone
        } else {
            ImagePath::Row
        };
        let r_id = self.ctx.image_rel_id(outer, path, self.config);
        let (width, height) = self.image_size(cell);
        let drawing = build_image_paragraph(outer + 1, &r_id, width, height);

        let mut children = std::mem::take(&mut cell.children);
        let title = (children.len() > 2).then(|| children.swap_remove(2));
        let properties = children
            .into_iter()
            .next()
            .filter(|n| n.is_named(CELL_PROPERTIES));

        cell.children.extend(properties);
        cell.children.push(drawing.into());
        if let Some(Node::Element(mut title)) = title {
            set_paragraph_label(&mut title, &self.config.image_title_label);
            cell.children.push(title.into());
        }
    }

    fn image_size(&self, cell: &Element) -> (i64, i64) {
        let fallback = (self.config.image_width_emu, self.config.image_height_emu);
        if !self.config.size_images_from_cell {
            return fallback;
        }
        match wml::cell_width_twips(cell).filter(|w| *w > 0) {
            Some(twips) => {
                let width = twip_to_emu_i64(twips);
                let height = scale_i64(width, fallback.1, fallback.0);
                (width, height)
            },
            None => fallback,
        }
    }
}

/// Set the fill of a cell's shading, creating `w:tcPr` and `w:shd` when the
/// cell has none.
pub fn change_shd(cell: &mut Element, color: &str) {
    if cell.find_first_child_by_name(CELL_PROPERTIES).is_none() {
        cell.children.insert(0, Element::new(CELL_PROPERTIES).into());
    }
    let Some(properties) = cell.find_first_child_by_name_mut(CELL_PROPERTIES) else {
        return;
    };
    if let Some(shading) = properties.find_first_child_by_name_mut(SHADING) {
        shading.set_attr(attr::FILL, color);
        return;
    }

    let shading = Element::new(SHADING)
        .with_attr(attr::VAL, "clear")
        .with_attr(attr::FILL, color);
    let position = properties
        .children
        .iter()
        .position(|n| n.name().is_some_and(|name| AFTER_SHADING.contains(&name)))
        .unwrap_or(properties.children.len());
    properties.children.insert(position, shading.into());
}

fn set_leaf_text(cell: &mut Element, leaf: usize, text: &str) {
    if let Some(text_element) = wml::cell_text_elements_mut(cell).nth(leaf) {
        text_element.set_text(text);
    }
}

/// Write `label` into the first text leaf of a paragraph, adding a run when
/// the paragraph has none.
fn set_paragraph_label(paragraph: &mut Element, label: &str) {
    let first = paragraph
        .find_all_children_by_name_mut(RUN)
        .flat_map(|r| r.find_all_children_by_name_mut(TEXT))
        .next();
    match first {
        Some(text_element) => text_element.set_text(label),
        None => paragraph
            .children
            .push(Element::new(RUN).with_child(Element::new(TEXT).with_text(label)).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DataContext;
    use crate::tree::fixtures::{cell, table, table_texts, text_row};
    use serde_json::json;

    fn data() -> DataContext {
        DataContext::from_json_value(json!({
            "title": "Survey",
            "status": { "_": "Open", "bckClr": "FF0000" },
            "images": [
                {
                    "location": "Dock",
                    "zone": { "_": "North", "bckClr": "00FF00" },
                    "hazard": [ { "_": "Slip", "bckClr": "FFC000" }, { "bckClr": "CCCCCC" } ],
                    "parts": [ "x" ]
                }
            ]
        }))
        .unwrap()
    }

    fn fill(cell: &Element) -> Option<&str> {
        cell.find_first_child_by_name(CELL_PROPERTIES)?
            .find_first_child_by_name(SHADING)?
            .attr(attr::FILL)
    }

    #[test]
    fn test_cell_settings_dispatch() {
        let settings = cell_settings(&cell(&["Label", "{location__0}", "{zone__0}"]));
        assert_eq!(settings.leaf, 1);
        assert!(matches!(
            settings.directive,
            Some(CellDirective::Replace(ref p)) if p.key == "location" && p.outer == Some(0)
        ));

        assert!(matches!(
            cell_settings(&cell(&["{image__2}"])).directive,
            Some(CellDirective::Image(ref p)) if p.outer == Some(2)
        ));
        assert_eq!(
            cell_settings(&cell(&["{image_title__0}"])).directive,
            Some(CellDirective::ImageTitle)
        );
        assert_eq!(
            cell_settings(&cell(&["{imageSet__0}"])).directive.map(|d| matches!(d, CellDirective::Replace(_))),
            Some(true)
        );
        assert_eq!(cell_settings(&cell(&["plain"])), CellSettings::default());
        assert_eq!(cell_settings(&cell(&["{bad__x}"])).directive, None);
    }

    #[test]
    fn test_top_level_values() {
        let data = data();
        let config = EngineConfig::default();
        let resolver = Resolver::new(&config, BuildContext::new(&data, 0));

        let mut c = cell(&["{title}"]);
        resolver.resolve_cell(&mut c);
        assert_eq!(c.text_recursive(), "Survey");

        let mut c = cell(&["{status}"]);
        let settings = resolver.resolve_cell(&mut c);
        assert_eq!(c.text_recursive(), "Open");
        assert_eq!(settings.background.as_deref(), Some("FF0000"));
        assert_eq!(fill(&c), Some("FF0000"));

        let mut c = cell(&["{absent}"]);
        let settings = resolver.resolve_cell(&mut c);
        assert_eq!(c.text_recursive(), config.missing_placeholder_text);
        assert_eq!(c.text_recursive(), "missing placeholder");
        assert!(!settings.remove);

        // sibling leaves keep their text
        let mut c = cell(&["Name:", "{absent}"]);
        resolver.resolve_cell(&mut c);
        assert_eq!(c.text_recursive(), "Name:missing placeholder");
    }

    #[test]
    fn test_loop_values() {
        let data = data();
        let config = EngineConfig::default();
        let resolver = Resolver::new(&config, BuildContext::new(&data, 0));

        let mut c = cell(&["{location__0}"]);
        resolver.resolve_cell(&mut c);
        assert_eq!(c.text_recursive(), "Dock");

        let mut c = cell(&["{zone__0}"]);
        resolver.resolve_cell(&mut c);
        assert_eq!(c.text_recursive(), "North");
        assert_eq!(fill(&c), Some("00FF00"));

        // absent loop-scoped values stay as they are
        for text in ["{absent__0}", "{location__5}", "{hazard__0__9}", "{parts__0}"] {
            let mut c = cell(&[text]);
            let settings = resolver.resolve_cell(&mut c);
            assert_eq!(c.text_recursive(), text);
            assert!(!settings.remove);
        }

        let mut c = cell(&["{hazard__0__0}"]);
        resolver.resolve_cell(&mut c);
        assert_eq!(c.text_recursive(), "Slip");
        assert_eq!(fill(&c), Some("FFC000"));
    }

    #[test]
    fn test_optional_without_display_removes() {
        let data = data();
        let config = EngineConfig::default();
        let resolver = Resolver::new(&config, BuildContext::new(&data, 0));

        let mut c = cell(&["{hazard|optional__0__1}"]);
        assert!(resolver.resolve_cell(&mut c).remove);

        let mut c = cell(&["{hazard|optional__0__0}"]);
        assert!(!resolver.resolve_cell(&mut c).remove);
        assert_eq!(c.text_recursive(), "Slip");

        // without the suffix the colour still applies and the row stays
        let mut c = cell(&["{hazard__0__1}"]);
        assert!(!resolver.resolve_cell(&mut c).remove);
        assert_eq!(c.text_recursive(), "{hazard__0__1}");
        assert_eq!(fill(&c), Some("CCCCCC"));
    }

    #[test]
    fn test_row_removed_when_any_cell_removes() {
        let data = data();
        let config = EngineConfig::default();
        let resolver = Resolver::new(&config, BuildContext::new(&data, 0));

        let mut t = table(vec![
            text_row(&["{location__0}", "{hazard|optional__0__0}"]),
            text_row(&["{location__0}", "{hazard|optional__0__1}"]),
            text_row(&["{title}"]),
        ]);
        assert_eq!(resolver.resolve_table(&mut t), 1);
        assert_eq!(
            table_texts(&t),
            vec![vec!["Dock", "Slip"], vec!["Survey"]]
        );
        assert_eq!(t.children.len(), 2 + 2);
    }

    #[test]
    fn test_change_shd_creates_and_updates() {
        let mut c = cell(&["x"]);
        change_shd(&mut c, "ABCDEF");
        assert!(c.children[0].is_named(CELL_PROPERTIES));
        let shd = c.children[0]
            .as_element()
            .and_then(|p| p.find_first_child_by_name(SHADING))
            .unwrap();
        assert_eq!(shd.attr(attr::VAL), Some("clear"));
        assert_eq!(shd.attr(attr::FILL), Some("ABCDEF"));

        change_shd(&mut c, "123456");
        assert_eq!(fill(&c), Some("123456"));
        assert_eq!(c.children.len(), 2);

        let mut c = cell(&["y"]);
        c.children.insert(
            0,
            Element::new(CELL_PROPERTIES)
                .with_child(Element::new("w:tcW"))
                .with_child(Element::new("w:vAlign"))
                .into(),
        );
        change_shd(&mut c, "000000");
        let names: Vec<&str> = c.children[0]
            .as_element()
            .unwrap()
            .child_elements()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["w:tcW", "w:shd", "w:vAlign"]);
    }

    #[test]
    fn test_add_image_keeps_properties_and_title() {
        let data = DataContext::from_json_value(json!({ "images": [{}, {}, {}] })).unwrap();
        let config = EngineConfig::default().with_size_images_from_cell(false);
        let resolver = Resolver::new(&config, BuildContext::new(&data, 20));

        let mut c = cell(&["{image__2}", "caption"]);
        c.children.insert(0, Element::new(CELL_PROPERTIES).into());
        resolver.resolve_cell(&mut c);

        assert_eq!(c.children.len(), 3);
        assert!(c.children[0].is_named(CELL_PROPERTIES));
        assert_eq!(c.children[2].as_element().map(Element::text_recursive).as_deref(), Some("Image"));

        let drawing = c.children[1].as_element().unwrap();
        let xml_ids = find_attr(drawing, "a:blip", "r:embed");
        assert_eq!(xml_ids.as_deref(), Some("rId23"));
        assert_eq!(find_attr(drawing, "wp:docPr", "id").as_deref(), Some("3"));
        assert_eq!(find_attr(drawing, "wp:extent", "cx").as_deref(), Some("1754930"));
    }

    #[test]
    fn test_add_image_title_only_from_third_child() {
        let data = DataContext::from_json_value(json!({ "images": [{}] })).unwrap();
        let config = EngineConfig::default();
        let resolver = Resolver::new(&config, BuildContext::new(&data, 0));

        let mut c = cell(&["{image__0}", "caption"]);
        resolver.resolve_cell(&mut c);
        assert_eq!(c.children.len(), 1);
        assert_eq!(c.text_recursive(), "");

        let mut c = cell(&["{image__0}", "note", "caption"]);
        resolver.resolve_cell(&mut c);
        assert_eq!(c.children.len(), 2);
        assert!(c.children[0].is_named("w:p"));
        assert_eq!(c.text_recursive(), "Image");
    }

    #[test]
    fn test_clone_image_uses_clone_offset() {
        let data = DataContext::from_json_value(json!({ "images": [{}, {}, {}] })).unwrap();
        let config = EngineConfig::default();
        let resolver = Resolver::new(&config, BuildContext::new(&data, 20));

        let mut c = cell(&["{image__2__0}"]);
        resolver.resolve_cell(&mut c);
        assert_eq!(c.children.len(), 1);
        assert_eq!(find_attr(&c, "a:blip", "r:embed").as_deref(), Some("rId24"));
    }

    #[test]
    fn test_image_sized_from_cell_width() {
        let data = DataContext::from_json_value(json!({ "images": [{}] })).unwrap();
        let config = EngineConfig::default().with_image_size(4000, 3000);
        let resolver = Resolver::new(&config, BuildContext::new(&data, 0));

        let mut c = cell(&["{image__0}"]);
        c.children.insert(
            0,
            Element::new(CELL_PROPERTIES)
                .with_child(
                    Element::new(wml::CELL_WIDTH)
                        .with_attr(attr::WIDTH, "2000")
                        .with_attr(attr::TYPE, "dxa"),
                )
                .into(),
        );
        resolver.resolve_cell(&mut c);
        assert_eq!(find_attr(&c, "wp:extent", "cx").as_deref(), Some("1270000"));
        assert_eq!(find_attr(&c, "wp:extent", "cy").as_deref(), Some("952500"));
    }

    #[test]
    fn test_image_without_loop_index_untouched() {
        let data = DataContext::from_json_value(json!({ "images": [] })).unwrap();
        let config = EngineConfig::default();
        let resolver = Resolver::new(&config, BuildContext::new(&data, 0));

        let mut c = cell(&["{image}"]);
        let before = c.clone();
        resolver.resolve_cell(&mut c);
        assert_eq!(c, before);
    }

    #[test]
    fn test_image_title_label() {
        let data = DataContext::new();
        let config = EngineConfig::default().with_image_title_label("Photo");
        let resolver = Resolver::new(&config, BuildContext::new(&data, 0));

        let mut c = cell(&["{image_title__1}"]);
        resolver.resolve_cell(&mut c);
        assert_eq!(c.text_recursive(), "Photo");
    }

    fn find_attr(element: &Element, name: &str, key: &str) -> Option<String> {
        if element.name == name {
            return element.attr(key).map(str::to_string);
        }
        element
            .child_elements()
            .find_map(|child| find_attr(child, name, key))
    }
}
