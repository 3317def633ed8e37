//! Configuration types for template expansion.
//!
//! This module defines the options that customise how the engine reads the
//! data context, renders tolerated defects, and sizes and numbers images.
//!
//! # Examples
//!
//! ```rust
//! use kumquat::config::{EngineConfig, UnclosedClonePolicy};
//!
//! // Create with defaults
//! let config = EngineConfig::default();
//!
//! // Or customize
//! let config = EngineConfig::new()
//!     .with_outer_collection("units")
//!     .with_missing_placeholder_text("??")
//!     .with_unclosed_clone_policy(UnclosedClonePolicy::Reject);
//! ```
use crate::common::Result;
use serde::Deserialize;

/// Options controlling a [`TemplateEngine`](crate::template::TemplateEngine).
///
/// Every field has a default, so configuration files only need to name the
/// fields they change.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EngineConfig {
    /// Name of the outer collection in the data context
    pub outer_collection: String,
    /// Text rendered for a top-level placeholder missing from the data
    pub missing_placeholder_text: String,
    /// Fixed label written into image title cells
    pub image_title_label: String,
    /// Fallback image anchor width in EMUs
    pub image_width_emu: i64,
    /// Fallback image anchor height in EMUs
    pub image_height_emu: i64,
    /// Derive the anchor width from the cell's `w:tcW` when it is in dxa
    pub size_images_from_cell: bool,
    /// Relationship offset for image placeholders without an inner index
    pub row_image_rel_offset: u32,
    /// Relationship offset for image placeholders carrying an inner index
    pub clone_image_rel_offset: u32,
    /// What to do with a clone group still open at the end of a table
    pub unclosed_clone_policy: UnclosedClonePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            outer_collection: "images".to_string(),
            missing_placeholder_text: "missing placeholder".to_string(),
            image_title_label: "Image".to_string(),
            image_width_emu: 1_754_930,
            image_height_emu: 1_315_450,
            size_images_from_cell: true,
            row_image_rel_offset: 1,
            clone_image_rel_offset: 2,
            unclosed_clone_policy: UnclosedClonePolicy::RepeatInner,
        }
    }
}

impl EngineConfig {
    /// Create a new `EngineConfig` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from JSON. Absent fields keep their defaults.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use kumquat::config::EngineConfig;
    ///
    /// let config = EngineConfig::from_json_str(r#"{ "image_title_label": "Photo" }"#).unwrap();
    /// assert_eq!(config.image_title_label, "Photo");
    /// assert_eq!(config.outer_collection, "images");
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the name of the outer collection.
    #[inline]
    pub fn with_outer_collection(mut self, name: impl Into<String>) -> Self {
        self.outer_collection = name.into();
        self
    }

    /// Set the text rendered for missing top-level placeholders.
    #[inline]
    pub fn with_missing_placeholder_text(mut self, text: impl Into<String>) -> Self {
        self.missing_placeholder_text = text.into();
        self
    }

    /// Set the fixed label of image title cells.
    #[inline]
    pub fn with_image_title_label(mut self, label: impl Into<String>) -> Self {
        self.image_title_label = label.into();
        self
    }

    /// Set the fallback image anchor size in EMUs.
    #[inline]
    pub fn with_image_size(mut self, width_emu: i64, height_emu: i64) -> Self {
        self.image_width_emu = width_emu;
        self.image_height_emu = height_emu;
        self
    }

    /// Set whether anchors take their width from the cell.
    #[inline]
    pub fn with_size_images_from_cell(mut self, enabled: bool) -> Self {
        self.size_images_from_cell = enabled;
        self
    }

    /// Set the relationship offsets for row images and clone-row images.
    ///
    /// These must match what the relationship bookkeeping registered, see
    /// [`BuildContext::image_relationships`](crate::template::BuildContext::image_relationships).
    #[inline]
    pub fn with_image_rel_offsets(mut self, row: u32, clone: u32) -> Self {
        self.row_image_rel_offset = row;
        self.clone_image_rel_offset = clone;
        self
    }

    /// Set the policy for clone groups left open at the end of a table.
    #[inline]
    pub fn with_unclosed_clone_policy(mut self, policy: UnclosedClonePolicy) -> Self {
        self.unclosed_clone_policy = policy;
        self
    }
}

/// Handling of a clone group that is still open when its table ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnclosedClonePolicy {
    /// Repeat the group by its inner collection length, as a closed group
    #[default]
    RepeatInner,
    /// Fail the build with [`Error::UnclosedCloneGroup`](crate::Error::UnclosedCloneGroup)
    Reject,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_builder() {
        let config = EngineConfig::new()
            .with_outer_collection("units")
            .with_missing_placeholder_text("n/a")
            .with_image_title_label("Photo")
            .with_image_size(100, 50)
            .with_size_images_from_cell(false)
            .with_image_rel_offsets(3, 7)
            .with_unclosed_clone_policy(UnclosedClonePolicy::Reject);

        assert_eq!(config.outer_collection, "units");
        assert_eq!(config.missing_placeholder_text, "n/a");
        assert_eq!(config.image_title_label, "Photo");
        assert_eq!((config.image_width_emu, config.image_height_emu), (100, 50));
        assert!(!config.size_images_from_cell);
        assert_eq!(
            (config.row_image_rel_offset, config.clone_image_rel_offset),
            (3, 7)
        );
        assert_eq!(config.unclosed_clone_policy, UnclosedClonePolicy::Reject);
    }

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.outer_collection, "images");
        assert_eq!(config.missing_placeholder_text, "missing placeholder");
        assert_eq!(config.row_image_rel_offset, 1);
        assert_ne!(config.row_image_rel_offset, config.clone_image_rel_offset);
        assert_eq!(config.unclosed_clone_policy, UnclosedClonePolicy::RepeatInner);
    }

    #[test]
    fn test_engine_config_from_json() {
        let config = EngineConfig::from_json_str(
            r#"{ "outer_collection": "units", "unclosed_clone_policy": "reject" }"#,
        )
        .unwrap();
        assert_eq!(config.outer_collection, "units");
        assert_eq!(config.unclosed_clone_policy, UnclosedClonePolicy::Reject);
        assert_eq!(config.image_width_emu, 1_754_930);

        assert!(EngineConfig::from_json_str(r#"{ "image_width_emu": "wide" }"#).is_err());
    }
}
