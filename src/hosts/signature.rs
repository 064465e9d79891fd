use serde::Serialize;
use std::fmt;

/// Which of a signature's two matchers reported a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    Single,
    /// Reported through the album matcher; targets from it are folder-typed
    Folder,
}

impl MatcherKind {
    pub fn is_folder(self) -> bool {
        matches!(self, MatcherKind::Folder)
    }
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatcherKind::Single => write!(f, "single"),
            MatcherKind::Folder => write!(f, "folder"),
        }
    }
}

/// One hosting service and its detection patterns.
///
/// Pattern syntax:
/// - `!!` anywhere marks a custom full-match pattern, run against the whole
///   fragment instead of the `href`/`src`/`data-url` attributes
/// - `<no_qs>` strips the query string from extracted resources
/// - `<keep_ts>` keeps a trailing slash
/// - `~an@` expands to `a-zA-Z0-9`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostSignature {
    pub name: String,
    pub category: String,
    pub single: String,
    pub album: Option<String>,
}

impl HostSignature {
    /// Build from a `"name:category"` signature string. The category may be
    /// empty (`"gofile.io:"`).
    pub fn new(signature: &str, single: &str, album: Option<&str>) -> Self {
        let (name, category) = signature.split_once(':').unwrap_or((signature, ""));
        Self {
            name: name.trim().to_string(),
            category: category.trim().to_string(),
            single: single.to_string(),
            album: album.map(str::to_string),
        }
    }

    pub fn matchers(&self) -> impl Iterator<Item = (MatcherKind, &str)> {
        std::iter::once((MatcherKind::Single, self.single.as_str()))
            .chain(self.album.as_deref().map(|album| (MatcherKind::Folder, album)))
    }
}

impl fmt::Display for HostSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.category.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} ({})", self.name, self.category)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_parsing() {
        let sig = HostSignature::new("jpg.church:image", "a", Some("b"));
        assert_eq!(sig.name, "jpg.church");
        assert_eq!(sig.category, "image");
        assert_eq!(sig.to_string(), "jpg.church (image)");

        let sig = HostSignature::new("gofile.io:", "gofile", None);
        assert_eq!(sig.category, "");
        assert_eq!(sig.to_string(), "gofile.io");
    }

    #[test]
    fn test_matchers_order() {
        let sig = HostSignature::new("x:y", "single", Some("album"));
        let kinds: Vec<_> = sig.matchers().collect();
        assert_eq!(
            kinds,
            vec![(MatcherKind::Single, "single"), (MatcherKind::Folder, "album")]
        );
    }
}
