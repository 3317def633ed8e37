//! Entity escaping for WordprocessingML text and attribute values.
//!
//! The writer escapes with one aho-corasick pass. The reader decodes entity
//! references one at a time through [`resolve_entity`], so attribute values
//! and text leaves share the same rules.
use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;

const SPECIAL: [&str; 4] = ["&", "<", ">", "\""];
const ESCAPED: [&str; 4] = ["&amp;", "&lt;", "&gt;", "&quot;"];

static SPECIAL_CHARS: Lazy<AhoCorasick> =
    Lazy::new(|| AhoCorasick::new(SPECIAL).expect("Failed to build XML escaper"));

/// Escape markup characters for text content and attribute values.
///
/// Apostrophes are left alone: attribute values are always written in
/// double quotes, so apostrophes in Word-authored text stay unescaped.
///
/// # Examples
///
/// ```
/// use kumquat::common::xml::escape_xml;
/// assert_eq!(escape_xml("R&D <draft>"), "R&amp;D &lt;draft&gt;");
/// assert_eq!(escape_xml(r#"say "hi""#), "say &quot;hi&quot;");
/// assert_eq!(escape_xml("it's"), "it's");
/// ```
#[inline]
pub fn escape_xml(s: &str) -> String {
    SPECIAL_CHARS.replace_all(s, &ESCAPED)
}

/// Decode every entity reference of `s` that [`resolve_entity`] knows.
/// Unknown references and a stray `&` are kept as written.
///
/// # Examples
///
/// ```
/// use kumquat::common::xml::unescape_xml;
/// assert_eq!(unescape_xml("Dock &amp; Gate&#x20;A"), "Dock & Gate A");
/// assert_eq!(unescape_xml("&amp;lt;"), "&lt;");
/// assert_eq!(unescape_xml("&nbsp; & more"), "&nbsp; & more");
/// ```
pub fn unescape_xml(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let decoded = after
            .find(';')
            .and_then(|end| resolve_entity(&after[..end]).map(|ch| (ch, end)));
        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &after[end + 1..];
            },
            None => {
                out.push('&');
                rest = after;
            },
        }
    }
    out.push_str(rest);
    out
}

/// Resolve a single entity reference name (the part between `&` and `;`).
///
/// Handles the five predefined entities and decimal/hex character
/// references. Returns `None` for anything else.
pub fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        },
    }
}
