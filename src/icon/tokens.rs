//! Per-row token substitution
//!
//! Every rendered field of a row is a token. A template may reference it
//! either as `{{ field }}` (whitespace inside the braces is optional) or as
//! the bare field name. A bare name that begins or ends with a word
//! character must not run into neighbouring word characters on that side,
//! so `field_types` does not contain the token `field_type` while
//! `Name (EN)` and `$price` still match.

use regex::{Captures, Regex, RegexBuilder};
use std::collections::{BTreeMap, HashMap};

use crate::html::strip_newlines;
use crate::map::RowResult;

/// Token values for one row, with the matcher that finds them in templates
#[derive(Debug, Clone)]
pub struct TokenSet {
    values: BTreeMap<String, String>,
    pattern: Option<Regex>,
}

impl TokenSet {
    /// Build the token set for a row's rendered fields.
    pub fn from_row(row: &RowResult) -> Self {
        Self::new(row.rendered.clone())
    }

    pub fn new(values: BTreeMap<String, String>) -> Self {
        let pattern = build_pattern(values.keys(), None);
        Self { values, pattern }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    /// Substitute tokens into `template` and strip newlines from the result.
    ///
    /// Replacement is a single pass: substituted values are never scanned
    /// for further tokens.
    pub fn replace(&self, template: &str) -> String {
        if template.is_empty() {
            return String::new();
        }

        let replaced = match &self.pattern {
            Some(pattern) => pattern
                .replace_all(template, |caps: &Captures| {
                    let (field, bare) = match (caps.get(1), caps.get(2)) {
                        (Some(braced), _) => (braced.as_str(), false),
                        (None, Some(bare)) => (bare.as_str(), true),
                        (None, None) => return caps[0].to_string(),
                    };
                    if bare {
                        let range = caps.get(0).map_or(0..0, |m| m.range());
                        if !is_standalone(template, range) {
                            return caps[0].to_string();
                        }
                    }
                    self.values.get(field).cloned().unwrap_or_default()
                })
                .into_owned(),
            None => template.to_string(),
        };

        strip_newlines(&replaced)
    }
}

/// Compiled token matchers shared by the rows of one render pass
///
/// Rows of a result set usually expose the same fields, so the pattern is
/// compiled once per distinct field set.
#[derive(Debug, Default)]
pub struct TokenPatterns {
    compiled: HashMap<Vec<String>, Option<Regex>>,
    size_limit: Option<usize>,
}

impl TokenPatterns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the compiled size of each pattern, in bytes.
    pub fn with_size_limit(mut self, bytes: usize) -> Self {
        self.size_limit = Some(bytes);
        self
    }

    /// Token set for `row`, reusing the pattern of an identical field set.
    pub fn tokens_for(&mut self, row: &RowResult) -> TokenSet {
        let fields: Vec<String> = row.rendered.keys().cloned().collect();
        let size_limit = self.size_limit;
        let pattern = self
            .compiled
            .entry(fields)
            .or_insert_with_key(|fields| build_pattern(fields.iter(), size_limit))
            .clone();
        TokenSet {
            values: row.rendered.clone(),
            pattern,
        }
    }

    /// Number of distinct field sets compiled so far.
    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whether the bare match at `range` is not glued to surrounding word
/// characters on a side where the match itself has a word character.
fn is_standalone(haystack: &str, range: std::ops::Range<usize>) -> bool {
    let matched = &haystack[range.clone()];
    let (Some(first), Some(last)) = (matched.chars().next(), matched.chars().next_back()) else {
        return false;
    };

    let before_ok = !is_word_char(first)
        || !haystack[..range.start]
            .chars()
            .next_back()
            .is_some_and(is_word_char);
    let after_ok = !is_word_char(last)
        || !haystack[range.end..]
            .chars()
            .next()
            .is_some_and(is_word_char);
    before_ok && after_ok
}

/// Alternation over all field names, longest first so that `name_full` is
/// preferred over `name`.
fn build_pattern<'a>(
    fields: impl Iterator<Item = &'a String>,
    size_limit: Option<usize>,
) -> Option<Regex> {
    let mut names: Vec<&String> = fields.filter(|f| !f.is_empty()).collect();
    if names.is_empty() {
        return None;
    }
    names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let alternation = names
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");

    let pattern = format!(r"\{{\{{\s*({alt})\s*\}}\}}|({alt})", alt = alternation);
    let mut builder = RegexBuilder::new(&pattern);
    if let Some(limit) = size_limit {
        builder.size_limit(limit);
    }
    match builder.build() {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::warn!(
                "Token pattern over {} field(s) failed to compile, templates are left as is: {}",
                names.len(),
                e
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(pairs: &[(&str, &str)]) -> TokenSet {
        TokenSet::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_brace_form() {
        let set = tokens(&[("name", "pin")]);
        assert_eq!(set.replace("{{ name }}.png"), "pin.png");
        assert_eq!(set.replace("{{name}}.png"), "pin.png");
        assert_eq!(set.replace("/icons/{{  name  }}.png"), "/icons/pin.png");
    }

    #[test]
    fn test_bare_form() {
        let set = tokens(&[("field_type", "shop")]);
        assert_eq!(set.replace("icons/field_type.png"), "icons/shop.png");
        // Only whole words are tokens
        assert_eq!(set.replace("field_types"), "field_types");
    }

    #[test]
    fn test_both_forms_in_one_template() {
        let set = tokens(&[("name", "pin")]);
        assert_eq!(set.replace("name {{ name }}"), "pin pin");
    }

    #[test]
    fn test_longest_field_wins() {
        let set = tokens(&[("name", "short"), ("name_full", "long")]);
        assert_eq!(set.replace("{{ name_full }}/{{ name }}"), "long/short");
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let set = tokens(&[("a", "b"), ("b", "X")]);
        assert_eq!(set.replace("{{ a }}"), "b");
    }

    #[test]
    fn test_newlines_are_stripped() {
        let set = tokens(&[("title", "Line\nbreak")]);
        assert_eq!(
            set.replace("<div class=\"m\">\n  {{ title }}\r\n</div>"),
            "<div class=\"m\">  Linebreak</div>"
        );
    }

    #[test]
    fn test_empty_template_and_unknown_tokens() {
        let set = tokens(&[("name", "pin")]);
        assert_eq!(set.replace(""), "");
        assert_eq!(set.replace("{{ other }}.png"), "{{ other }}.png");
        assert_eq!(TokenSet::new(BTreeMap::new()).replace("a\nb"), "ab");
    }

    #[test]
    fn test_bare_names_with_non_word_edges() {
        let set = tokens(&[("Name (EN)", "pin"), ("$price", "10")]);
        assert_eq!(set.replace("icons/Name (EN).png"), "icons/pin.png");
        assert_eq!(set.replace("cost $price"), "cost 10");
        assert_eq!(set.replace("cost$price"), "cost10");
        // The word-character edge still needs a boundary
        assert_eq!(set.replace("xName (EN)"), "xName (EN)");
        assert_eq!(set.replace("$prices"), "$prices");
    }

    #[test]
    fn test_rejected_bare_match_leaves_text_alone() {
        let set = tokens(&[("name", "pin")]);
        assert_eq!(set.replace("rename name"), "rename pin");
        assert_eq!(set.replace("names"), "names");
    }

    #[test]
    fn test_patterns_are_shared_between_rows_with_the_same_fields() {
        let mut patterns = TokenPatterns::new();
        let a = RowResult::new(0).with_field("name", "a");
        let b = RowResult::new(1).with_field("name", "b");
        let c = RowResult::new(2).with_field("title", "c");

        assert_eq!(patterns.tokens_for(&a).replace("{{ name }}"), "a");
        assert_eq!(patterns.tokens_for(&b).replace("{{ name }}"), "b");
        assert_eq!(patterns.len(), 1);

        assert_eq!(patterns.tokens_for(&c).replace("title"), "c");
        assert_eq!(patterns.len(), 2);
    }

    #[test]
    fn test_pattern_over_size_limit_leaves_templates_unreplaced() {
        let mut patterns = TokenPatterns::new().with_size_limit(8);
        let row = RowResult::new(0).with_field("name", "pin");
        let set = patterns.tokens_for(&row);
        assert_eq!(set.replace("{{ name }}\n.png"), "{{ name }}.png");
        assert_eq!(set.get("name"), Some("pin"));
    }

    #[test]
    fn test_special_characters_in_field_names_are_escaped() {
        let set = tokens(&[("price.amount", "10")]);
        assert_eq!(set.replace("{{ price.amount }}"), "10");
        assert_eq!(set.replace("{{ priceXamount }}"), "{{ priceXamount }}");
    }
}
