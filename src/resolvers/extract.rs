//! Defensive extraction helpers shared by resolvers
//!
//! All HTML helpers take a parsed [`Html`] and return owned values so the
//! document can be dropped before the next `.await`. Invalid selectors and
//! missing elements yield `None`/empty rather than errors.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

use super::traits::ResolveError;

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn normalize_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Attribute of the first element matching `css` that carries it
pub fn attr(doc: &Html, css: &str, name: &str) -> Option<String> {
    let selector = selector(css)?;
    doc.select(&selector)
        .find_map(|el| el.value().attr(name))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Attribute of every matching element, in document order
pub fn attrs(doc: &Html, css: &str, name: &str) -> Vec<String> {
    let Some(selector) = selector(css) else {
        return Vec::new();
    };
    doc.select(&selector)
        .filter_map(|el| el.value().attr(name))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

/// Map every element matching `css`, keeping the `Some` results
pub fn each<T>(doc: &Html, css: &str, f: impl FnMut(ElementRef<'_>) -> Option<T>) -> Vec<T> {
    let Some(selector) = selector(css) else {
        return Vec::new();
    };
    doc.select(&selector).filter_map(f).collect()
}

/// Attribute of the first descendant of `el` matching `css`
pub fn child_attr(el: ElementRef<'_>, css: &str, name: &str) -> Option<String> {
    let selector = selector(css)?;
    el.select(&selector)
        .find_map(|child| child.value().attr(name))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Whitespace-normalized text of the first non-empty matching element
pub fn text(doc: &Html, css: &str) -> Option<String> {
    let selector = selector(css)?;
    doc.select(&selector)
        .map(|el| normalize_text(&el.text().collect::<Vec<_>>().join(" ")))
        .find(|text| !text.is_empty())
}

/// Raw inner text of every matching element (scripts, JSON payloads)
pub fn raw_texts(doc: &Html, css: &str) -> Vec<String> {
    let Some(selector) = selector(css) else {
        return Vec::new();
    };
    doc.select(&selector)
        .map(|el| el.text().collect::<String>())
        .collect()
}

/// `content` of `<meta property="...">`
pub fn meta(doc: &Html, property: &str) -> Option<String> {
    attr(doc, &format!(r#"meta[property="{}"]"#, property), "content")
}

/// Resolve `href` against `base`; returns `href` unchanged when either is
/// unparseable
pub fn absolutize(base: &str, href: &str) -> String {
    Url::parse(base)
        .and_then(|base| base.join(href))
        .map(|url| url.to_string())
        .unwrap_or_else(|_| href.to_string())
}

pub fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

/// Last path segment of a URL, ignoring a trailing slash
pub fn last_segment(url: &str) -> &str {
    strip_query(url)
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
}

/// First capture group of `re` in `haystack`
pub fn capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// First capture group of every match of `re` in `haystack`
pub fn captures(re: &Regex, haystack: &str) -> Vec<String> {
    re.captures_iter(haystack)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn json(url: &str, body: &str) -> Result<Value, ResolveError> {
    serde_json::from_str(body)
        .map_err(|e| ResolveError::parse(url, format!("invalid JSON: {}", e)))
}

/// String at a JSON pointer, if present and non-empty
pub fn json_str(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}

/// Undo JSON-in-HTML escaping commonly found in inline scripts
pub fn unescape_js(value: &str) -> String {
    value
        .replace("\\/", "/")
        .replace("\\u0026", "&")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;

    const PAGE: &str = r#"
        <html><head>
            <meta property="og:title" content=" Holiday  Album ">
            <script id="data">{"a": 1}</script>
        </head><body>
            <div class="list"><img src="/1.jpg"><img src=""><img src="/2.jpg"></div>
            <h1 class="title">
                Beach
                Day
            </h1>
        </body></html>
    "#;

    static ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"id=(\d+)").unwrap());

    #[test]
    fn test_html_helpers() {
        let doc = Html::parse_document(PAGE);
        assert_eq!(attr(&doc, ".list > img", "src").as_deref(), Some("/1.jpg"));
        assert_eq!(attrs(&doc, ".list > img", "src"), vec!["/1.jpg", "/2.jpg"]);
        assert_eq!(text(&doc, "h1.title").as_deref(), Some("Beach Day"));
        assert_eq!(meta(&doc, "og:title").as_deref(), Some("Holiday  Album"));
        assert_eq!(raw_texts(&doc, "script#data"), vec![r#"{"a": 1}"#]);
    }

    #[test]
    fn test_nested_helpers() {
        let doc = Html::parse_document(
            r#"<div class="g"><img class="a" data-src="1.jpg"></div>
               <div class="g"><video><source src="2.mp4"></video></div>
               <div class="g"></div>"#,
        );
        let found = each(&doc, ".g", |group| {
            child_attr(group, ".a", "data-src").or_else(|| child_attr(group, "source", "src"))
        });
        assert_eq!(found, vec!["1.jpg", "2.mp4"]);
    }

    #[test]
    fn test_invalid_selector_is_empty() {
        let doc = Html::parse_document(PAGE);
        assert!(attr(&doc, "[[", "src").is_none());
        assert!(attrs(&doc, "[[", "src").is_empty());
    }

    #[test]
    fn test_url_helpers() {
        assert_eq!(
            absolutize("https://example.com/a/b?page=1", "?page=2"),
            "https://example.com/a/b?page=2"
        );
        assert_eq!(
            absolutize("https://example.com/a/b", "/c"),
            "https://example.com/c"
        );
        assert_eq!(strip_query("https://x.com/a.jpg?x=1#f"), "https://x.com/a.jpg");
        assert_eq!(last_segment("https://gofile.io/d/AbC/"), "AbC");
        assert_eq!(last_segment("https://x.com/v/file.mp4?dl=1"), "file.mp4");
    }

    #[test]
    fn test_regex_helpers() {
        assert_eq!(capture(&ID, "x id=12 id=34").as_deref(), Some("12"));
        assert_eq!(captures(&ID, "x id=12 id=34"), vec!["12", "34"]);
    }

    #[test]
    fn test_json_helpers() {
        let value = json("u", r#"{"a": {"b": "c", "e": ""}}"#).unwrap();
        assert_eq!(json_str(&value, "/a/b").as_deref(), Some("c"));
        assert_eq!(json_str(&value, "/a/e"), None);
        assert!(matches!(json("u", "nope"), Err(ResolveError::Parse { .. })));
    }

    #[test]
    fn test_unescape_js() {
        assert_eq!(
            unescape_js(r"https:\/\/cdn.example.com\/v.mp4?a=1&b=2"),
            "https://cdn.example.com/v.mp4?a=1&b=2"
        );
    }
}
