//! Build context and image relationship numbering.
//!
//! Every embedded image points at its media part through a relationship
//! ID. The engine does not edit the relationships part; it derives image IDs
//! from the highest ID that part already holds, and hands the same numbering
//! to the relationship bookkeeping so both sides agree.
use crate::config::EngineConfig;
use crate::context::DataContext;
use crate::tree::Element;
use crate::tree::wml::rel;

/// Which resolution path an image placeholder takes. Each path adds its own
/// configured offset to the relationship number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePath {
    /// Image placeholder addressed by outer index only
    Row,
    /// Image placeholder addressed by outer and inner index
    Clone,
}

impl ImagePath {
    /// Offset configured for this path.
    #[inline]
    pub fn offset(self, config: &EngineConfig) -> u32 {
        match self {
            ImagePath::Row => config.row_image_rel_offset,
            ImagePath::Clone => config.clone_image_rel_offset,
        }
    }
}

/// An image relationship the bookkeeping must register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedImage {
    /// Outer item index
    pub index: usize,
    /// Drawing ID and media number (`index + 1`)
    pub image_id: usize,
    /// Relationship ID, e.g. `rId12`
    pub r_id: String,
    /// Target relative to the document part, e.g. `media/image1.png`
    pub target: String,
}

/// Everything one document build reads besides the template tree.
///
/// Passed by reference into both phases; it is never mutated during a
/// build, so one context can serve concurrent builds of the same data.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    data: &'a DataContext,
    highest_rel_id: u32,
}

impl<'a> BuildContext<'a> {
    /// Create a context from the data and the highest relationship number
    /// already present in the package.
    pub fn new(data: &'a DataContext, highest_rel_id: u32) -> Self {
        Self {
            data,
            highest_rel_id,
        }
    }

    /// Create a context, discovering the highest relationship number from
    /// the document's relationships part.
    pub fn from_relationships(data: &'a DataContext, relationships: &Element) -> Self {
        Self::new(data, highest_relationship_id(relationships).unwrap_or(0))
    }

    /// The data payload.
    #[inline]
    pub fn data(&self) -> &'a DataContext {
        self.data
    }

    /// Highest relationship number found before the build.
    #[inline]
    pub fn highest_rel_id(&self) -> u32 {
        self.highest_rel_id
    }

    /// Relationship ID of the image of outer item `index`:
    /// `rId{base + index + offset}`.
    pub fn image_rel_id(&self, index: usize, path: ImagePath, config: &EngineConfig) -> String {
        let number = self.highest_rel_id as u64 + index as u64 + path.offset(config) as u64;
        let mut buf = itoa::Buffer::new();
        let mut r_id = String::with_capacity(rel::ID_PREFIX.len() + 8);
        r_id.push_str(rel::ID_PREFIX);
        r_id.push_str(buf.format(number));
        r_id
    }

    /// The image relationships the bookkeeping has to register, one per
    /// outer item, for media parts with the given file extension.
    pub fn image_relationships(
        &self,
        config: &EngineConfig,
        path: ImagePath,
        extension: &str,
    ) -> Vec<PlannedImage> {
        let count = self
            .data
            .items(&config.outer_collection)
            .map_or(0, <[_]>::len);
        (0..count)
            .map(|index| PlannedImage {
                index,
                image_id: index + 1,
                r_id: self.image_rel_id(index, path, config),
                target: format!("media/image{}.{}", index + 1, extension),
            })
            .collect()
    }
}

/// Highest numeric `rId<N>` among the `Relationship` children of a
/// relationships part root. IDs that do not follow the `rId<N>` shape are
/// ignored.
pub fn highest_relationship_id(relationships: &Element) -> Option<u32> {
    relationships
        .find_all_children_by_name(rel::RELATIONSHIP)
        .filter_map(|r| r.attr(rel::ID))
        .filter_map(|id| id.strip_prefix(rel::ID_PREFIX)?.parse::<u32>().ok())
        .max()
}
