use regex::{Regex, RegexBuilder};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use super::traits::{ResolveContext, ResolveError, Resolver};
use super::types::Resolved;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule '{rule}' needs at least one pattern")]
    NoPatterns { rule: String },

    #[error("rule '{rule}' has an invalid pattern {pattern}: {source}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub type TransformFn = fn(&str) -> String;

/// What runs when a rule fires
#[derive(Clone)]
pub enum Handler {
    /// Pure synchronous rewrite
    Transform(TransformFn),
    /// Asynchronous resolution with network access
    Pipeline(Arc<dyn Resolver>),
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Transform(_) => write!(f, "Transform"),
            Handler::Pipeline(_) => write!(f, "Pipeline"),
        }
    }
}

/// One entry of the ordered resolver table
#[derive(Debug, Clone)]
pub struct ResolverRule {
    name: String,
    must_match: Regex,
    must_not_match: Vec<Regex>,
    handler: Handler,
}

impl ResolverRule {
    /// `patterns[0]` must match the resource; every other pattern must not
    pub fn new(name: impl Into<String>, patterns: &[&str], handler: Handler) -> Result<Self, RuleError> {
        let name = name.into();
        let (first, rest) = patterns
            .split_first()
            .ok_or_else(|| RuleError::NoPatterns { rule: name.clone() })?;

        let must_match = compile(&name, first)?;
        let must_not_match = rest
            .iter()
            .map(|pattern| compile(&name, pattern))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name,
            must_match,
            must_not_match,
            handler,
        })
    }

    pub fn transform(name: impl Into<String>, patterns: &[&str], transform: TransformFn) -> Result<Self, RuleError> {
        Self::new(name, patterns, Handler::Transform(transform))
    }

    pub fn pipeline(
        name: impl Into<String>,
        patterns: &[&str],
        resolver: impl Resolver + 'static,
    ) -> Result<Self, RuleError> {
        Self::new(name, patterns, Handler::Pipeline(Arc::new(resolver)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn fires(&self, resource: &str) -> bool {
        self.must_match.is_match(resource)
            && !self.must_not_match.iter().any(|re| re.is_match(resource))
    }
}

fn compile(rule: &str, pattern: &str) -> Result<Regex, RuleError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .map_err(|source| RuleError::InvalidPattern {
            rule: rule.to_string(),
            pattern: pattern.to_string(),
            source,
        })
}

/// Totally ordered rule list; the first rule that fires handles a resource
#[derive(Debug, Clone, Default)]
pub struct ResolverTable {
    rules: Vec<ResolverRule>,
}

impl ResolverTable {
    pub fn new(rules: Vec<ResolverRule>) -> Self {
        Self { rules }
    }

    /// The builtin table for every supported host
    pub fn builtin() -> Result<Self, RuleError> {
        Ok(Self::new(super::builtin::rules()?))
    }

    pub fn rules(&self) -> &[ResolverRule] {
        &self.rules
    }

    /// The rule that would handle `resource`, if any
    pub fn select(&self, resource: &str) -> Option<&ResolverRule> {
        self.rules.iter().find(|rule| rule.fires(resource))
    }

    pub async fn resolve(
        &self,
        resource: &str,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<Resolved>, ResolveError> {
        let rule = self
            .select(resource)
            .ok_or_else(|| ResolveError::Unsupported(resource.to_string()))?;

        debug!(rule = rule.name(), resource, "Resolver selected");

        match &rule.handler {
            Handler::Transform(transform) => Ok(Some(Resolved::Url(transform(resource)))),
            Handler::Pipeline(resolver) => resolver.resolve(resource, ctx).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MockFetch;
    use crate::resolvers::testing::TestEnv;
    use async_trait::async_trait;

    fn upper(url: &str) -> String {
        url.to_uppercase()
    }

    fn suffixed(url: &str) -> String {
        format!("{}#suffixed", url)
    }

    struct Fixed(&'static str);

    #[async_trait]
    impl Resolver for Fixed {
        async fn resolve(
            &self,
            _url: &str,
            _ctx: &ResolveContext<'_>,
        ) -> Result<Option<Resolved>, ResolveError> {
            Ok(Some(Resolved::url(self.0)))
        }
    }

    async fn resolve_with(table: &ResolverTable, resource: &str) -> Result<Option<Resolved>, ResolveError> {
        let env = TestEnv::new(MockFetch::new());
        table.resolve(resource, &env.ctx()).await
    }

    #[test]
    fn test_must_not_match_excludes() {
        let rule = ResolverRule::transform("single", &[r"host\.com/", r"host\.com/a/"], upper).unwrap();
        assert!(rule.fires("https://HOST.com/image/1"));
        assert!(!rule.fires("https://host.com/a/album"));
        assert!(!rule.fires("https://other.com/"));
    }

    #[test]
    fn test_rules_need_patterns() {
        assert!(matches!(
            ResolverRule::transform("empty", &[], upper),
            Err(RuleError::NoPatterns { .. })
        ));
    }

    #[tokio::test]
    async fn test_first_firing_rule_wins_and_order_matters() {
        let broad = || ResolverRule::transform("broad", &[r"example\.com"], upper).unwrap();
        let narrow = || ResolverRule::transform("narrow", &[r"example\.com/x"], suffixed).unwrap();
        let resource = "https://example.com/x";

        let table = ResolverTable::new(vec![broad(), narrow()]);
        assert_eq!(table.select(resource).map(ResolverRule::name), Some("broad"));
        assert_eq!(
            resolve_with(&table, resource).await.unwrap(),
            Some(Resolved::url("HTTPS://EXAMPLE.COM/X"))
        );

        let table = ResolverTable::new(vec![narrow(), broad()]);
        assert_eq!(table.select(resource).map(ResolverRule::name), Some("narrow"));
        assert_eq!(
            resolve_with(&table, resource).await.unwrap(),
            Some(Resolved::url("https://example.com/x#suffixed"))
        );
    }

    #[tokio::test]
    async fn test_pipeline_dispatch() {
        let table = ResolverTable::new(vec![
            ResolverRule::pipeline("fixed", &[r"example\.com"], Fixed("https://cdn.example.com/1.jpg")).unwrap(),
        ]);
        assert_eq!(
            resolve_with(&table, "https://example.com/p/1").await.unwrap(),
            Some(Resolved::url("https://cdn.example.com/1.jpg"))
        );
    }

    #[tokio::test]
    async fn test_unsupported_resource() {
        let table = ResolverTable::new(vec![]);
        assert!(matches!(
            resolve_with(&table, "https://nowhere.example/").await,
            Err(ResolveError::Unsupported(_))
        ));
    }
}
