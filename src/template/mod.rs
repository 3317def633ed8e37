//! Table template expansion.
//!
//! A build runs in two phases over the body of a document:
//!
//! 1. **Expansion**: every table carrying an outer marker (`{/image}`) is
//!    replaced by one copy per item of the outer collection. Clone groups
//!    (`{#key}` ... `{key#}`) are repeated once per element of the item's
//!    inner collection, and every placeholder is stamped with its loop
//!    indices.
//! 2. **Resolution**: every cell's indexed placeholder is looked up in the
//!    data context and replaced by text, a background colour or an image.
//!    Rows whose optional values are missing are dropped.
//!
//! Expansion finishes for all tables before resolution starts.
//!
//! # Example
//!
//! ```
//! use kumquat::{BuildContext, DataContext, EngineConfig, TemplateEngine};
//! use kumquat::tree::{Element, Node};
//!
//! fn text_cell(text: &str) -> Element {
//!     Element::new("w:tc").with_child(
//!         Element::new("w:p").with_child(
//!             Element::new("w:r").with_child(Element::new("w:t").with_text(text)),
//!         ),
//!     )
//! }
//!
//! let table = Element::new("w:tbl")
//!     .with_child(Element::new("w:tblPr"))
//!     .with_child(Element::new("w:tr").with_child(text_cell("{/location}")));
//! let body = vec![Node::from(table)];
//!
//! let data = DataContext::from_json_str(
//!     r#"{ "images": [ { "location": "Gate A" }, { "location": "Dock" } ] }"#,
//! ).unwrap();
//! let ctx = BuildContext::new(&data, 0);
//!
//! let engine = TemplateEngine::new(EngineConfig::default());
//! let built = engine.build(body, &ctx).unwrap();
//!
//! let texts: Vec<String> = built
//!     .iter()
//!     .filter_map(Node::as_element)
//!     .map(Element::text_recursive)
//!     .collect();
//! assert_eq!(texts, vec!["Gate A", "Dock"]);
//! ```

pub mod drawing;
pub mod indexer;
pub mod multiplier;
pub mod relmap;
pub mod resolver;
pub mod scanner;

pub use relmap::{BuildContext, ImagePath, PlannedImage, highest_relationship_id};
pub use resolver::{CellDirective, CellSettings};

use crate::common::{Error, Result};
use crate::config::EngineConfig;
use crate::context::Value;
use crate::tree::wml::{BODY, TABLE};
use crate::tree::{Element, Node};
use resolver::Resolver;
use scanner::{ScannedTable, contains_table, scan_table};
use tracing::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Expands and resolves table templates.
///
/// The engine holds only its configuration; all per-build state arrives in
/// a [`BuildContext`], so one engine can serve concurrent builds.
#[derive(Debug, Clone, Default)]
pub struct TemplateEngine {
    config: EngineConfig,
}

/// Counters reported once per build.
#[derive(Debug, Default)]
struct ExpansionStats {
    tables: usize,
    loop_tables: usize,
    copies: usize,
}

impl TemplateEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// The engine's configuration.
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run both phases over a body sequence.
    pub fn build(&self, body: Vec<Node>, ctx: &BuildContext<'_>) -> Result<Vec<Node>> {
        let mut expanded = self.expand(body, ctx)?;
        self.resolve(&mut expanded, ctx)?;
        Ok(expanded)
    }

    /// Build the body of a `w:document` root in place.
    ///
    /// On failure the document is left as it was.
    pub fn build_document(&self, document: &mut Element, ctx: &BuildContext<'_>) -> Result<()> {
        let body = document
            .find_first_child_by_name_mut(BODY)
            .ok_or_else(|| Error::Structure(format!("document has no {} element", BODY)))?;
        body.children = self.build(body.children.clone(), ctx)?;
        Ok(())
    }

    /// Expansion phase: replace every loop table by its per-item copies.
    /// Non-loop tables and all other nodes pass through unchanged.
    ///
    /// Fails with [`Error::MissingCollection`] when the data context has no
    /// outer collection.
    pub fn expand(&self, body: Vec<Node>, ctx: &BuildContext<'_>) -> Result<Vec<Node>> {
        let collection = &self.config.outer_collection;
        let items = ctx
            .data()
            .items(collection)
            .ok_or_else(|| Error::MissingCollection(collection.clone()))?;

        let mut stats = ExpansionStats::default();
        let expanded = self.expand_nodes(body, items, &mut stats)?;
        debug!(
            tables = stats.tables,
            loop_tables = stats.loop_tables,
            copies = stats.copies,
            items = items.len(),
            "expanded document body"
        );
        Ok(expanded)
    }

    fn expand_nodes(
        &self,
        nodes: Vec<Node>,
        items: &[Value],
        stats: &mut ExpansionStats,
    ) -> Result<Vec<Node>> {
        let mut output = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                Node::Element(table) if table.name == TABLE => {
                    let index = stats.tables;
                    stats.tables += 1;
                    let scanned = scan_table(&table);
                    if !scanned.is_loop() {
                        output.push(Node::Element(table));
                        continue;
                    }
                    let copies = self.expand_table(&scanned, items, index)?;
                    stats.loop_tables += 1;
                    stats.copies += copies.len();
                    output.extend(copies.into_iter().map(Node::Element));
                },
                Node::Element(mut container) if contains_table(&container) => {
                    let children = std::mem::take(&mut container.children);
                    container.children = self.expand_nodes(children, items, stats)?;
                    output.push(Node::Element(container));
                },
                other => output.push(other),
            }
        }
        Ok(output)
    }

    /// One table copy per outer item, in collection order.
    fn expand_table(
        &self,
        scanned: &ScannedTable,
        items: &[Value],
        table_index: usize,
    ) -> Result<Vec<Element>> {
        debug!(
            table = table_index,
            outer_key = scanned.outer_key.as_deref().unwrap_or_default(),
            rows = scanned.rows.len(),
            clone_groups = scanned.groups.len(),
            items = items.len(),
            "expanding loop table"
        );

        let expand_item = |(outer, item): (usize, &Value)| -> Result<Element> {
            if !matches!(item, Value::Record(_)) {
                warn!(table = table_index, item = outer, "outer item is not a mapping");
            }
            let mut rows = multiplier::multiply_rows(
                scanned,
                item,
                self.config.unclosed_clone_policy,
                table_index,
            )?;
            indexer::index_rows(&mut rows, outer, item, &self.config.outer_collection);
            Ok(multiplier::wrap_table(&scanned.head, rows))
        };

        #[cfg(feature = "parallel")]
        let tables = items.par_iter().enumerate().map(expand_item).collect();
        #[cfg(not(feature = "parallel"))]
        let tables = items.iter().enumerate().map(expand_item).collect();

        tables
    }

    /// Resolution phase: resolve the cells of every table in the body.
    pub fn resolve(&self, body: &mut [Node], ctx: &BuildContext<'_>) -> Result<()> {
        let resolver = Resolver::new(&self.config, *ctx);
        let removed = resolve_nodes(&resolver, body);
        debug!(rows_removed = removed, "resolved document body");
        Ok(())
    }
}

fn resolve_nodes(resolver: &Resolver<'_>, nodes: &mut [Node]) -> usize {
    let mut removed = 0;
    for node in nodes {
        let Node::Element(element) = node else {
            continue;
        };
        if element.name == TABLE {
            removed += resolver.resolve_table(element);
        } else if contains_table(element) {
            removed += resolve_nodes(resolver, &mut element.children);
        }
    }
    removed
}
