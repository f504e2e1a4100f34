//! URI templates with named placeholders.
//!
//! A template such as `db://users/{id}` is compiled into alternating
//! literal and placeholder segments. Matching is purely syntactic: a
//! placeholder captures a non-empty run of characters up to the next
//! literal segment, and a trailing placeholder captures the remainder of
//! the URI. When the following literal occurs more than once, the
//! shortest capture that lets the rest of the template match wins.
//!
//! Matching remembers, per placeholder, the lowest offset from which every
//! later delimiter has already been tried and failed, so each placeholder
//! scans any part of the URI at most once.
//!
//! Empty captures never match, so `db://users/` does not match
//! `db://users/{id}`.
//!
//! # Example
//!
//! ```rust
//! use resourcekit_core::template::UriTemplate;
//!
//! let template = UriTemplate::parse("repo://{owner}/{name}/readme").unwrap();
//! let params = template.matches("repo://rust-lang/rust/readme").unwrap();
//!
//! assert_eq!(params.get("owner"), Some("rust-lang"));
//! assert_eq!(params.get("name"), Some("rust"));
//! assert!(template.matches("repo://rust-lang/readme").is_err());
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Placeholder values captured from a single request URI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterMap {
    values: HashMap<String, String>,
}

impl ParameterMap {
    /// Create an empty parameter map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a parameter value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Get a parameter that must be present and non-empty.
    ///
    /// Handlers call this before doing any downstream work so that a
    /// missing value surfaces as [`Error::MissingParameter`].
    pub fn require(&self, name: &str) -> Result<&str, Error> {
        match self.get(name) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(Error::missing_parameter(name)),
        }
    }

    /// Insert a parameter value, returning the previous value if any.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(name.into(), value.into())
    }

    /// Check whether a parameter is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of captured parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no parameters were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(name, value)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for ParameterMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A compiled URI template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl UriTemplate {
    /// Compile a template string.
    ///
    /// Fails with [`Error::InvalidTemplate`] on unbalanced braces, empty or
    /// malformed placeholder names, duplicate names, or two placeholders
    /// with no literal text between them.
    pub fn parse(template: &str) -> Result<Self, Error> {
        let invalid = |reason: &str| Error::invalid_template(template, reason);

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        match c {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => return Err(invalid("nested '{'")),
                            _ => name.push(c),
                        }
                    }
                    if !closed {
                        return Err(invalid("unclosed '{'"));
                    }
                    if name.is_empty() {
                        return Err(invalid("empty placeholder name"));
                    }
                    if !name
                        .chars()
                        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
                    {
                        return Err(Error::invalid_template(
                            template,
                            format!("invalid placeholder name '{name}'"),
                        ));
                    }

                    if literal.is_empty() {
                        if matches!(segments.last(), Some(Segment::Placeholder(_))) {
                            return Err(invalid("adjacent placeholders need a literal between them"));
                        }
                    } else {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }

                    let duplicate = segments
                        .iter()
                        .any(|s| matches!(s, Segment::Placeholder(existing) if *existing == name));
                    if duplicate {
                        return Err(Error::invalid_template(
                            template,
                            format!("duplicate placeholder '{name}'"),
                        ));
                    }
                    segments.push(Segment::Placeholder(name));
                }
                '}' => return Err(invalid("unmatched '}'")),
                _ => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        if segments.is_empty() {
            return Err(invalid("template is empty"));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// The original template string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the template has no placeholders.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        self.placeholder_count() == 0
    }

    /// Number of placeholders.
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.placeholders().count()
    }

    /// Placeholder names in template order.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Fixed text before the first placeholder.
    #[must_use]
    pub fn literal_prefix(&self) -> &str {
        match self.segments.first() {
            Some(Segment::Literal(lit)) => lit,
            _ => "",
        }
    }

    /// Total length of all literal segments, in bytes.
    #[must_use]
    pub fn literal_len(&self) -> usize {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Literal(lit) => lit.len(),
                Segment::Placeholder(_) => 0,
            })
            .sum()
    }

    /// Match a concrete URI, returning the captured parameters.
    pub fn matches(&self, uri: &str) -> Result<ParameterMap, Error> {
        let mut params = ParameterMap::new();
        let mut exhausted = vec![usize::MAX; self.segments.len()];
        if self.match_at(0, uri, 0, &mut exhausted, &mut params) {
            Ok(params)
        } else {
            Err(Error::no_match(uri))
        }
    }

    /// Whether a concrete URI matches this template.
    #[must_use]
    pub fn is_match(&self, uri: &str) -> bool {
        self.matches(uri).is_ok()
    }

    /// Build a concrete URI by substituting parameter values.
    ///
    /// Fails with [`Error::MissingParameter`] for any absent or empty value.
    pub fn expand(&self, params: &ParameterMap) -> Result<String, Error> {
        let mut uri = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(lit) => uri.push_str(lit),
                Segment::Placeholder(name) => uri.push_str(params.require(name)?),
            }
        }
        Ok(uri)
    }

    /// Match `uri[pos..]` against the segments from `index` on.
    ///
    /// `exhausted[i]` is the lowest offset at which placeholder `i` may
    /// end such that every later end offset is already known to fail.
    fn match_at(
        &self,
        index: usize,
        uri: &str,
        pos: usize,
        exhausted: &mut [usize],
        params: &mut ParameterMap,
    ) -> bool {
        let rest = &uri[pos..];
        match self.segments.get(index) {
            None => rest.is_empty(),
            Some(Segment::Literal(lit)) => {
                rest.starts_with(lit.as_str())
                    && self.match_at(index + 1, uri, pos + lit.len(), exhausted, params)
            }
            Some(Segment::Placeholder(name)) => match self.segments.get(index + 1) {
                None => {
                    if rest.is_empty() {
                        return false;
                    }
                    params.insert(name.as_str(), rest);
                    true
                }
                Some(Segment::Literal(next)) => {
                    // Captures are non-empty, so the search starts after the first char.
                    let Some(first) = rest.chars().next() else {
                        return false;
                    };
                    let from = pos + first.len_utf8();
                    let limit = exhausted[index];
                    let haystack_end = search_end(uri, limit, next.len());

                    let mut start = from;
                    while start < limit && start <= haystack_end {
                        let Some(offset) = uri[start..haystack_end].find(next.as_str()) else {
                            break;
                        };
                        let end = start + offset;
                        if end >= limit {
                            break;
                        }
                        if self.match_at(index + 1, uri, end, exhausted, params) {
                            params.insert(name.as_str(), &uri[pos..end]);
                            return true;
                        }
                        start = end + uri[end..].chars().next().map_or(1, char::len_utf8);
                    }

                    exhausted[index] = exhausted[index].min(from);
                    false
                }
                // Rejected by `parse`.
                Some(Segment::Placeholder(_)) => false,
            },
        }
    }
}

/// End of the region where a delimiter of `len` bytes starting before
/// `limit` can lie, rounded up to a char boundary.
fn search_end(uri: &str, limit: usize, len: usize) -> usize {
    let mut end = limit.saturating_add(len).min(uri.len());
    while !uri.is_char_boundary(end) {
        end += 1;
    }
    end
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for UriTemplate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Whether a pattern string contains placeholders.
///
/// This is a cheap syntactic check; use [`UriTemplate::parse`] to validate.
#[must_use]
pub fn is_template(pattern: &str) -> bool {
    pattern.contains('{')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn params(pairs: &[(&str, &str)]) -> ParameterMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_single_placeholder() {
        let template = UriTemplate::parse("db://users/{id}").unwrap();
        assert_eq!(template.matches("db://users/42").unwrap(), params(&[("id", "42")]));
    }

    #[test]
    fn test_literal_template() {
        let template = UriTemplate::parse("config://settings").unwrap();
        assert!(template.is_literal());
        assert!(template.matches("config://settings").unwrap().is_empty());
        assert!(template.matches("config://settings/extra").is_err());
    }

    #[test]
    fn test_trailing_placeholder_takes_rest() {
        let template = UriTemplate::parse("file://{path}").unwrap();
        assert_eq!(
            template.matches("file://docs/guide/intro.md").unwrap(),
            params(&[("path", "docs/guide/intro.md")])
        );
    }

    #[test]
    fn test_multiple_placeholders() {
        let template = UriTemplate::parse("repo://{owner}/{name}/issues/{number}").unwrap();
        assert_eq!(
            template.matches("repo://tokio-rs/tokio/issues/123").unwrap(),
            params(&[("owner", "tokio-rs"), ("name", "tokio"), ("number", "123")])
        );
    }

    #[test]
    fn test_backtracks_over_repeated_delimiter() {
        let template = UriTemplate::parse("archive://{name}.tar.gz").unwrap();
        assert_eq!(
            template.matches("archive://backup.2024.tar.gz").unwrap(),
            params(&[("name", "backup.2024")])
        );
    }

    #[test]
    fn test_backtracks_across_placeholders() {
        let template = UriTemplate::parse("x://{a}/{b}/end").unwrap();
        assert_eq!(
            template.matches("x://p/q/r/end").unwrap(),
            params(&[("a", "p"), ("b", "q/r")])
        );
        assert!(!template.is_match("x://p/q/r/nope"));
    }

    #[test]
    fn test_long_non_matching_uri_is_rejected_quickly() {
        let template = UriTemplate::parse("x://{a}/{b}/{c}/{d}/end").unwrap();
        let segments = "s/".repeat(20_000);

        let started = std::time::Instant::now();
        assert!(!template.is_match(&format!("x://{segments}nope")));
        assert!(template.is_match(&format!("x://{segments}end")));
        assert!(
            started.elapsed() < std::time::Duration::from_secs(2),
            "matching took {:?}",
            started.elapsed()
        );

        let params = template.matches(&format!("x://{segments}end")).unwrap();
        assert_eq!(params.get("a"), Some("s"));
        assert_eq!(params.get("d").map(str::len), Some(segments.len() - "s/s/s/".len() - 1));
    }

    #[test]
    fn test_empty_capture_is_no_match() {
        let template = UriTemplate::parse("db://users/{id}").unwrap();
        assert!(matches!(
            template.matches("db://users/"),
            Err(Error::NoMatch { .. })
        ));

        let template = UriTemplate::parse("db://{table}/rows").unwrap();
        assert!(template.matches("db:///rows").is_err());
    }

    #[test]
    fn test_prefix_mismatch() {
        let template = UriTemplate::parse("db://users/{id}").unwrap();
        assert!(!template.is_match("db://orders/42"));
        assert!(!template.is_match("file://users/42"));
    }

    #[test]
    fn test_unicode_values() {
        let template = UriTemplate::parse("doc://{title}/v{version}").unwrap();
        assert_eq!(
            template.matches("doc://über/v2").unwrap(),
            params(&[("title", "über"), ("version", "2")])
        );
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["db://{id", "db://id}", "db://{}", "db://{a}{b}", "db://{a}/{a}", "db://{a{b}}", ""] {
            assert!(
                matches!(UriTemplate::parse(bad), Err(Error::InvalidTemplate { .. })),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_specificity_data() {
        let template = UriTemplate::parse("db://users/{id}/posts/{post}").unwrap();
        assert_eq!(template.placeholder_count(), 2);
        assert_eq!(template.literal_prefix(), "db://users/");
        assert_eq!(template.literal_len(), "db://users/".len() + "/posts/".len());
        assert_eq!(template.placeholders().collect::<Vec<_>>(), vec!["id", "post"]);

        let leading = UriTemplate::parse("{scheme}://host").unwrap();
        assert_eq!(leading.literal_prefix(), "");
    }

    #[test]
    fn test_expand() {
        let template = UriTemplate::parse("db://users/{id}").unwrap();
        assert_eq!(template.expand(&params(&[("id", "7")])).unwrap(), "db://users/7");
        assert!(matches!(
            template.expand(&ParameterMap::new()),
            Err(Error::MissingParameter { .. })
        ));
    }

    #[test]
    fn test_require_rejects_empty() {
        let map = params(&[("id", "")]);
        assert!(matches!(map.require("id"), Err(Error::MissingParameter { name }) if name == "id"));
        assert!(map.require("other").is_err());
        assert_eq!(params(&[("id", "1")]).require("id").unwrap(), "1");
    }

    #[test]
    fn test_is_template() {
        assert!(is_template("file://{path}"));
        assert!(!is_template("file://readme.txt"));
    }
}
