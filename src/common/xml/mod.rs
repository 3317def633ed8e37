//! XML text helpers shared by the tree adapter.

pub mod escape;

pub use escape::{escape_xml, resolve_entity, unescape_xml};
