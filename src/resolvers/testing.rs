//! Shared fixtures for resolver tests

use super::traits::ResolveContext;
use crate::config::ResolverSettings;
use crate::fetch::MockFetch;
use crate::run::RunLog;

pub struct TestEnv {
    pub fetch: MockFetch,
    pub settings: ResolverSettings,
    pub passwords: Vec<String>,
    pub log: RunLog,
}

impl TestEnv {
    pub fn new(fetch: MockFetch) -> Self {
        let mut settings = ResolverSettings::default();
        settings.pornhub.delay_ms = 0;
        settings.instagram.page_delay_ms = 0;
        Self {
            fetch,
            settings,
            passwords: Vec::new(),
            log: RunLog::new("post-1", 1),
        }
    }

    pub fn with_passwords(mut self, passwords: &[&str]) -> Self {
        self.passwords = passwords.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn ctx(&self) -> ResolveContext<'_> {
        ResolveContext {
            fetch: &self.fetch,
            passwords: &self.passwords,
            settings: &self.settings,
            log: &self.log,
        }
    }
}
