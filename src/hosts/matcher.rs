use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use super::signature::{HostSignature, MatcherKind};
use super::table::HostTable;

const FULL_MATCH_MARKER: &str = "!!";
const NO_QUERY_STRING: &str = "<no_qs>";
const KEEP_TRAILING_SLASH: &str = "<keep_ts>";
const ALPHANUMERIC_PLACEHOLDER: &str = "~an@";

#[derive(Debug, Error)]
pub enum MatcherError {
    #[error("Invalid pattern for host '{host}': {pattern}: {source}")]
    InvalidPattern {
        host: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Host name plus the matcher that reported a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct HostLabel {
    pub name: String,
    pub kind: MatcherKind,
}

impl HostLabel {
    pub fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }
}

/// Resources reported by one matcher of one signature, in document order
#[derive(Debug, Clone)]
pub struct HostMatches {
    pub signature: Arc<HostSignature>,
    pub kind: MatcherKind,
    pub resources: Vec<String>,
}

impl HostMatches {
    pub fn label(&self) -> HostLabel {
        HostLabel {
            name: self.signature.name.clone(),
            kind: self.kind,
        }
    }
}

#[derive(Debug)]
struct CompiledPattern {
    signature: Arc<HostSignature>,
    kind: MatcherKind,
    regex: Regex,
    strip_query: bool,
    keep_trailing_slash: bool,
}

/// Scans content fragments for references to known hosts.
///
/// Every pattern is compiled once at construction; scanning never fails.
#[derive(Debug)]
pub struct PatternMatcher {
    patterns: Vec<CompiledPattern>,
}

impl PatternMatcher {
    pub fn new(table: &HostTable) -> Result<Self, MatcherError> {
        let mut patterns = Vec::new();
        for signature in table.iter() {
            for (kind, raw) in signature.matchers() {
                patterns.push(compile(signature, kind, raw)?);
            }
        }

        debug!(patterns = patterns.len(), "Host patterns compiled");
        Ok(Self { patterns })
    }

    /// One entry per (signature, matcher) that fired, in table order
    pub fn scan(&self, content: &str) -> Vec<HostMatches> {
        self.patterns
            .iter()
            .filter_map(|pattern| {
                let resources = pattern.extract(content);
                if resources.is_empty() {
                    return None;
                }
                Some(HostMatches {
                    signature: Arc::clone(&pattern.signature),
                    kind: pattern.kind,
                    resources,
                })
            })
            .collect()
    }
}

impl CompiledPattern {
    fn extract(&self, content: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut resources = Vec::new();

        for caps in self.regex.captures_iter(content) {
            // First participating named group, else the whole match
            let raw = self
                .regex
                .capture_names()
                .flatten()
                .find_map(|name| caps.name(name))
                .or_else(|| caps.get(0))
                .map(|m| m.as_str())
                .unwrap_or_default();

            let resource = self.normalize(raw);
            if !resource.is_empty() && seen.insert(resource.clone()) {
                resources.push(resource);
            }
        }

        resources
    }

    fn normalize(&self, raw: &str) -> String {
        let mut resource = raw.trim().replace("&amp;", "&").replace("\\/", "/");

        if self.strip_query {
            if let Some(index) = resource.find('?') {
                resource.truncate(index);
            }
        }

        if !self.keep_trailing_slash {
            while resource.ends_with('/') {
                resource.pop();
            }
        }

        resource
    }
}

fn compile(
    signature: &Arc<HostSignature>,
    kind: MatcherKind,
    raw: &str,
) -> Result<CompiledPattern, MatcherError> {
    let strip_query = raw.contains(NO_QUERY_STRING);
    let keep_trailing_slash = raw.contains(KEEP_TRAILING_SLASH);
    let full_match = raw.contains(FULL_MATCH_MARKER);

    let pattern = raw
        .replace(NO_QUERY_STRING, "")
        .replace(KEEP_TRAILING_SLASH, "")
        .replace(FULL_MATCH_MARKER, "")
        .replace(ALPHANUMERIC_PLACEHOLDER, "a-zA-Z0-9");

    let source = if full_match {
        pattern
    } else {
        format!(r#"(?:href|src|data-url)\s*=\s*"(?P<res>https?://(?:www\.)?(?:{pattern})[^"]*)""#)
    };

    let regex = RegexBuilder::new(&source)
        .case_insensitive(true)
        .build()
        .map_err(|source| MatcherError::InvalidPattern {
            host: signature.name.clone(),
            pattern: raw.to_string(),
            source,
        })?;

    Ok(CompiledPattern {
        signature: Arc::clone(signature),
        kind,
        regex,
        strip_query,
        keep_trailing_slash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> PatternMatcher {
        PatternMatcher::new(HostTable::builtin()).unwrap()
    }

    fn resources_for<'a>(matches: &'a [HostMatches], name: &str, kind: MatcherKind) -> Vec<&'a str> {
        matches
            .iter()
            .filter(|m| m.signature.name == name && m.kind == kind)
            .flat_map(|m| m.resources.iter().map(String::as_str))
            .collect()
    }

    #[test]
    fn test_builtin_patterns_compile() {
        assert!(PatternMatcher::new(HostTable::builtin()).is_ok());
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let content = r#"<A HREF="HTTPS://PIXELDRAIN.COM/U/abc123">file</A>"#;
        let matches = matcher().scan(content);
        assert_eq!(
            resources_for(&matches, "pixeldrain.com", MatcherKind::Single),
            vec!["HTTPS://PIXELDRAIN.COM/U/abc123"]
        );
    }

    #[test]
    fn test_matching_is_scoped_to_designated_attributes() {
        let content = r#"
            <p>https://pixeldrain.com/u/intext</p>
            <a title="https://pixeldrain.com/u/title">x</a>
            <a href="https://pixeldrain.com/u/link">x</a>
            <img src="https://pixeldrain.com/u/img">
            <div data-url="https://www.pixeldrain.com/u/data"></div>
        "#;
        let matches = matcher().scan(content);
        assert_eq!(
            resources_for(&matches, "pixeldrain.com", MatcherKind::Single),
            vec![
                "https://pixeldrain.com/u/link",
                "https://pixeldrain.com/u/img",
                "https://www.pixeldrain.com/u/data",
            ]
        );
    }

    #[test]
    fn test_full_match_marker_scans_whole_fragment() {
        let content = r#"<span>see https://cyberfile.is/AbC1" here</span>"#;
        let matches = matcher().scan(content);
        assert_eq!(
            resources_for(&matches, "cyberfile.is", MatcherKind::Single),
            vec!["https://cyberfile.is/AbC1"]
        );
    }

    #[test]
    fn test_exact_duplicates_collapse_in_document_order() {
        let content = r#"
            <a href="https://gofile.io/d/b">b</a>
            <a href="https://gofile.io/d/a">a</a>
            <a href="https://gofile.io/d/b">b again</a>
        "#;
        let matches = matcher().scan(content);
        assert_eq!(
            resources_for(&matches, "gofile.io", MatcherKind::Single),
            vec!["https://gofile.io/d/b", "https://gofile.io/d/a"]
        );
    }

    #[test]
    fn test_album_matcher_is_folder_kind_and_strips_query() {
        let content = r#"<a href="https://jpg.church/a/holiday.XyZ?sort=date_desc&amp;page=1/">album</a>"#;
        let matches = matcher().scan(content);
        assert_eq!(
            resources_for(&matches, "jpg.church", MatcherKind::Folder),
            vec!["https://jpg.church/a/holiday.XyZ"]
        );
    }

    #[test]
    fn test_trailing_slash_and_entities() {
        let content = r#"<a href="https://i.redd.it/x.jpg?a=1&amp;b=2/">r</a>"#;
        let matches = matcher().scan(content);
        assert_eq!(
            resources_for(&matches, "reddit.com", MatcherKind::Single),
            vec!["https://i.redd.it/x.jpg?a=1&b=2"]
        );
    }

    #[test]
    fn test_keep_trailing_slash_option() {
        let table = HostTable::new(vec![HostSignature::new(
            "example.com:",
            r"example\.com/f/<keep_ts>",
            None,
        )]);
        let matches = PatternMatcher::new(&table)
            .unwrap()
            .scan(r#"<a href="https://example.com/f/x/">x</a>"#);
        assert_eq!(matches[0].resources, vec!["https://example.com/f/x/"]);
    }

    #[test]
    fn test_resource_attributed_to_several_hosts() {
        // Both imgur signatures report www.imgur.com links
        let content = r#"<a href="https://www.imgur.com/gallery/abc">x</a>"#;
        let matches = matcher().scan(content);
        assert_eq!(
            resources_for(&matches, "imgur.com", MatcherKind::Single).len(),
            2
        );
    }

    #[test]
    fn test_embedded_iframe_json_is_unescaped() {
        let content = r#"<span data-s9e-mediaembed-iframe='["src","https:\/\/www.redgifs.com\/ifr\/abcdef"]'>"#;
        let matches = matcher().scan(content);
        assert_eq!(
            resources_for(&matches, "redgifs.com", MatcherKind::Single),
            vec!["redgifs.com/ifr/abcdef"]
        );
        let content = r#"<iframe data-s9e-mediaembed-src="https://s9e.github.io/iframe/2/imgur.html#a/XyZ"></iframe>"#;
        let matches = matcher().scan(content);
        assert_eq!(
            resources_for(&matches, "imgur.com", MatcherKind::Single),
            vec!["https://s9e.github.io/iframe/2/imgur.html#a/XyZ"]
        );
    }

    #[test]
    fn test_no_match_is_empty() {
        assert!(matcher().scan("<p>nothing to see</p>").is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let table = HostTable::new(vec![HostSignature::new("broken:", "(unclosed", None)]);
        assert!(matches!(
            PatternMatcher::new(&table),
            Err(MatcherError::InvalidPattern { .. })
        ));
    }
}
