//! Kumquat - DOCX table template expansion
//!
//! This library fills WordprocessingML tables from a JSON data context. Template
//! authors mark tables, row groups and cells with placeholders; the engine
//! repeats tables per report unit, repeats row groups per inner collection
//! element, and substitutes text, cell shading and inline images.
//!
//! # Features
//!
//! - **Table repetition**: `{/image}` repeats a table once per item of the
//!   outer collection
//! - **Row groups**: `{#hazard}` ... `{hazard#}` repeats rows per element of
//!   an inner collection
//! - **Styled values**: `{ "_": "text", "bckClr": "FF0000" }` sets text and
//!   cell background
//! - **Optional rows**: `{key|optional}` drops a row whose inner value has
//!   no display text
//! - **Images**: `{image}` replaces a cell with an inline picture anchored
//!   to the item's media relationship
//!
//! The engine works on an in-memory [`tree`]; reading and writing the
//! package archive is up to the caller. The `xml` feature (on by default)
//! bundles a quick-xml adapter for the markup.
//!
//! # Example - Building a document part
//!
//! ```
//! use kumquat::{BuildContext, DataContext, EngineConfig, TemplateEngine};
//! use kumquat::tree::xml::{parse_element, write_document};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut document = parse_element(
//!     r#"<w:document><w:body><w:tbl>
//!          <w:tr><w:tc><w:p><w:r><w:t>{/location}</w:t></w:r></w:p></w:tc></w:tr>
//!          <w:tr><w:tc><w:p><w:r><w:t>{#hazard#}</w:t></w:r></w:p></w:tc></w:tr>
//!        </w:tbl></w:body></w:document>"#,
//! )?;
//! let relationships = parse_element(
//!     r#"<Relationships><Relationship Id="rId4" Target="styles.xml"/></Relationships>"#,
//! )?;
//!
//! let data = DataContext::from_json_str(r#"{
//!     "images": [
//!         { "location": "Gate A", "hazard": [ { "_": "Trip" }, { "_": "Slip", "bckClr": "FFC000" } ] }
//!     ]
//! }"#)?;
//! let ctx = BuildContext::from_relationships(&data, &relationships);
//!
//! let engine = TemplateEngine::new(EngineConfig::default());
//! engine.build_document(&mut document, &ctx)?;
//!
//! let xml = write_document(&document);
//! assert!(xml.contains("Gate A"));
//! assert!(xml.contains(r#"<w:shd w:val="clear" w:fill="FFC000"/>"#));
//! # Ok(())
//! # }
//! ```

/// Shared error, unit and XML text helpers
pub mod common;

/// Engine configuration
pub mod config;

/// Data context model and JSON loading
pub mod context;

/// Placeholder grammar
pub mod placeholder;

/// Expansion and resolution of table templates
///
/// This module holds the [`TemplateEngine`] and its phases: scanning,
/// row multiplication, index stamping, cell resolution and image anchors.
pub mod template;

/// Generic document tree and WordprocessingML names
pub mod tree;

// Re-export commonly used types for convenience
pub use common::{Error, Result};
pub use config::{EngineConfig, UnclosedClonePolicy};
pub use context::{DataContext, Value};
pub use template::{BuildContext, TemplateEngine};
pub use tree::{Element, Node};
