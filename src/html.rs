//! Small HTML helpers used while building features
//!
//! - entity decoding for plain-text labels
//! - newline stripping for templated icon markup
//! - request-scoped unique element ids for map containers

use std::collections::HashMap;

/// Decode HTML entities into plain text.
///
/// Covers the full HTML5 named entity table plus decimal and hexadecimal
/// character references. Unknown entities are left as they are.
pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Remove every `\n` and `\r` from a string.
pub fn strip_newlines(text: &str) -> String {
    text.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}

/// Clean an arbitrary string into a valid element id.
///
/// Lowercases, turns spaces, underscores and `[` into dashes, drops `]` and
/// any other character outside `[a-z0-9-]`, then collapses dash runs.
pub fn clean_id(id: &str) -> String {
    let mapped: String = id
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' | '_' | '[' => Some('-'),
            ']' => None,
            c if c.is_ascii_alphanumeric() || c == '-' => Some(c),
            _ => None,
        })
        .collect();

    let mut cleaned = String::with_capacity(mapped.len());
    for c in mapped.chars() {
        if c == '-' && cleaned.ends_with('-') {
            continue;
        }
        cleaned.push(c);
    }
    cleaned
}

/// Hands out unique element ids within one request
///
/// The first request for an id returns it cleaned; later requests for the
/// same id get a `--2`, `--3`, ... suffix.
#[derive(Debug, Default, Clone)]
pub struct HtmlIds {
    seen: HashMap<String, usize>,
}

impl HtmlIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unique_id(&mut self, id: &str) -> String {
        let id = clean_id(id);
        match self.seen.get_mut(&id) {
            Some(count) => {
                *count += 1;
                format!("{}--{}", id, count)
            }
            None => {
                self.seen.insert(id.clone(), 1);
                id
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_named_and_numeric_entities() {
        assert_eq!(decode_entities("Fish &amp; Chips"), "Fish & Chips");
        assert_eq!(decode_entities("&lt;b&gt;"), "<b>");
        assert_eq!(decode_entities("It&#039;s"), "It's");
        assert_eq!(decode_entities("&#x41;&#66;"), "AB");
        assert_eq!(decode_entities("Caf&eacute;"), "Café");
    }

    #[test]
    fn test_decode_full_html5_entity_set() {
        assert_eq!(
            decode_entities("Caf&eacute; &hearts; &Uuml;ber &frac12;"),
            "Café ♥ Über ½"
        );
        assert_eq!(decode_entities("&notanentity;"), "&notanentity;");
    }

    #[test]
    fn test_decode_is_single_pass() {
        // "&amp;lt;" decodes to "&lt;", not "<"
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_strip_newlines() {
        assert_eq!(strip_newlines("<div>\r\n  pin\n</div>"), "<div>  pin</div>");
    }

    #[test]
    fn test_clean_id() {
        assert_eq!(
            clean_id("leaflet_map_view_Stores_page 1"),
            "leaflet-map-view-stores-page-1"
        );
        assert_eq!(clean_id("a__b[c]"), "a-b-c");
        assert_eq!(clean_id("x.y!z"), "xyz");
    }

    #[test]
    fn test_unique_ids() {
        let mut ids = HtmlIds::new();
        assert_eq!(ids.unique_id("map"), "map");
        assert_eq!(ids.unique_id("map"), "map--2");
        assert_eq!(ids.unique_id("map"), "map--3");
        assert_eq!(ids.unique_id("other"), "other");
    }
}
