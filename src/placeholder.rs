//! Placeholder text grammar.
//!
//! Template authors write placeholders into cell text:
//!
//! - `{key}`: a value placeholder
//! - `{/key}`: marks the table as repeated once per outer item
//! - `{#key}`: opens an inner clone group driven by the collection `key`
//! - `{key#}`: closes the clone group
//!
//! After expansion the engine stores the iteration address in the text
//! itself: `{key__i}` for outer item `i`, `{key__i__j}` for inner element `j`
//! of outer item `i`. That text is parsed once per cell into a
//! [`PlaceholderRef`].
//!
//! Keys may end with the optional suffix (`|optional`, `|optionalRisk`, ...).
//! The suffix is not part of the lookup key; it only turns a missing inner
//! display value into a row removal.
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::ops::Range;

/// Separator between the key and its loop indices.
pub const INDEX_SEPARATOR: &str = "__";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}]+)\}").expect("Failed to build placeholder pattern"));

static OPTIONAL_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\|optional\w*").expect("Failed to build optional pattern"));

/// Location of the first placeholder in a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderMatch<'a> {
    /// Byte range of the whole `{...}` expression
    pub range: Range<usize>,
    /// Text between the braces
    pub body: &'a str,
}

/// Find the first `{...}` expression in `text`. Later expressions are
/// ignored by both phases.
pub fn find_placeholder(text: &str) -> Option<PlaceholderMatch<'_>> {
    let caps = PLACEHOLDER.captures(text)?;
    let whole = caps.get(0)?;
    let body = caps.get(1)?;
    Some(PlaceholderMatch {
        range: whole.range(),
        body: body.as_str(),
    })
}

/// Parsed placeholder expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderRef {
    /// Key as written, including any optional suffix
    pub raw_key: String,
    /// Lookup key with the optional suffix removed
    pub key: String,
    /// Whether the key carried the optional suffix
    pub optional: bool,
    /// Outer item index (`__i`)
    pub outer: Option<usize>,
    /// Inner element index (`__i__j`)
    pub inner: Option<usize>,
}

impl PlaceholderRef {
    /// Parse the text between the braces.
    ///
    /// Returns `None` when an index segment is not a number or there are
    /// more than two index segments; such text is not a placeholder.
    ///
    /// # Examples
    ///
    /// ```
    /// use kumquat::placeholder::PlaceholderRef;
    ///
    /// let p = PlaceholderRef::parse("measure|optional__2__0").unwrap();
    /// assert_eq!(p.key, "measure");
    /// assert!(p.optional);
    /// assert_eq!((p.outer, p.inner), (Some(2), Some(0)));
    /// assert!(PlaceholderRef::parse("name__x").is_none());
    /// ```
    pub fn parse(body: &str) -> Option<Self> {
        let mut parts = body.split(INDEX_SEPARATOR);
        let raw_key = parts.next()?;
        if raw_key.is_empty() {
            return None;
        }
        let outer = match parts.next() {
            Some(segment) => Some(parse_index(segment)?),
            None => None,
        };
        let inner = match parts.next() {
            Some(segment) => Some(parse_index(segment)?),
            None => None,
        };
        if parts.next().is_some() {
            return None;
        }

        let optional = OPTIONAL_SUFFIX.is_match(raw_key);
        let key = if optional {
            OPTIONAL_SUFFIX.replace_all(raw_key, "").into_owned()
        } else {
            raw_key.to_string()
        };

        Some(Self {
            raw_key: raw_key.to_string(),
            key,
            optional,
            outer,
            inner,
        })
    }
}

impl fmt::Display for PlaceholderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}", self.raw_key)?;
        if let Some(outer) = self.outer {
            write!(f, "{}{}", INDEX_SEPARATOR, outer)?;
            if let Some(inner) = self.inner {
                write!(f, "{}{}", INDEX_SEPARATOR, inner)?;
            }
        }
        f.write_str("}")
    }
}

fn parse_index(segment: &str) -> Option<usize> {
    segment.parse().ok()
}

/// Insert `__outer` (and `__inner`) before the closing brace of the
/// placeholder at `range`.
pub fn append_indices(text: &mut String, range: &Range<usize>, outer: usize, inner: Option<usize>) {
    let mut suffix = String::with_capacity(16);
    let mut buf = itoa::Buffer::new();
    suffix.push_str(INDEX_SEPARATOR);
    suffix.push_str(buf.format(outer));
    if let Some(inner) = inner {
        suffix.push_str(INDEX_SEPARATOR);
        suffix.push_str(buf.format(inner));
    }
    text.insert_str(range.end - 1, &suffix);
}

/// Loop marker carried by a text leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMarker {
    /// `{/key}`: the table repeats per outer item
    Outer,
    /// `{#key}`: a clone group opens at this row
    CloneOpen,
    /// `{key#}`: the clone group closes after this row
    CloneClose,
    /// `{#key#}`: a single-row clone group
    CloneOpenClose,
}

impl LoopMarker {
    /// Whether this marker opens a clone group.
    #[inline]
    pub fn opens_clone(self) -> bool {
        matches!(self, LoopMarker::CloneOpen | LoopMarker::CloneOpenClose)
    }

    /// Whether this marker closes a clone group.
    #[inline]
    pub fn closes_clone(self) -> bool {
        matches!(self, LoopMarker::CloneClose | LoopMarker::CloneOpenClose)
    }
}

/// Detect a loop marker at the edges of `text` and strip it in place,
/// leaving a plain `{key}` expression.
///
/// The outer marker takes precedence; a leaf carrying it is never treated
/// as a clone marker.
///
/// # Examples
///
/// ```
/// use kumquat::placeholder::{LoopMarker, take_loop_marker};
///
/// let mut text = String::from("{#hazard}");
/// assert_eq!(take_loop_marker(&mut text), Some(LoopMarker::CloneOpen));
/// assert_eq!(text, "{hazard}");
///
/// let mut text = String::from("{hazard#}");
/// assert_eq!(take_loop_marker(&mut text), Some(LoopMarker::CloneClose));
/// assert_eq!(text, "{hazard}");
/// ```
pub fn take_loop_marker(text: &mut String) -> Option<LoopMarker> {
    if text.starts_with("{/") {
        text.remove(1);
        return Some(LoopMarker::Outer);
    }

    let opens = text.starts_with("{#");
    if opens {
        text.remove(1);
    }
    // "{#}" is consumed entirely by the open check
    let closes = text.len() > 2 && text.ends_with("#}");
    if closes {
        text.remove(text.len() - 2);
    }

    match (opens, closes) {
        (true, true) => Some(LoopMarker::CloneOpenClose),
        (true, false) => Some(LoopMarker::CloneOpen),
        (false, true) => Some(LoopMarker::CloneClose),
        (false, false) => None,
    }
}

/// Whether `key` names the outer item itself: the collection name with
/// case and a trailing plural `s` normalised away (`image` for `images`).
pub fn refers_to_outer_item(key: &str, collection: &str) -> bool {
    let singular = collection.strip_suffix(['s', 'S']).unwrap_or(collection);
    key.eq_ignore_ascii_case(singular)
}
