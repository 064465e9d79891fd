use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::run::RunOptions;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    /// Default options for every run; CLI flags override per run
    #[serde(default)]
    pub run: RunOptions,
    #[serde(default)]
    pub hosts: HostsConfig,
    #[serde(default)]
    pub resolvers: ResolverSettings,
    #[serde(default)]
    pub naming: NamingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Whole-request deadline; unset means transfers may run indefinitely
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: None,
            max_redirects: default_max_redirects(),
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_redirects() -> usize {
    10
}

/// Host enable/disable switches, applied by the caller after matching
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HostsConfig {
    /// Host signature names to ignore, e.g. `"gofile.io"`
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl HostsConfig {
    pub fn is_enabled(&self, name: &str) -> bool {
        !self
            .disabled
            .iter()
            .any(|disabled| disabled.eq_ignore_ascii_case(name))
    }
}

/// Bounded retry for a flaky upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl RetryPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Pagination limits for feeds that page through an upstream API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PagingPolicy {
    pub page_size: u32,
    pub max_pages: u32,
    pub page_delay_ms: u64,
}

impl PagingPolicy {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GofileSettings {
    /// Account token; loaded from `GOFILE_TOKEN`, never from the config file.
    /// When absent a guest account is created on first use.
    #[serde(skip)]
    pub token: Option<String>,
    #[serde(default = "default_gofile_website_token")]
    pub website_token: String,
}

impl Default for GofileSettings {
    fn default() -> Self {
        Self {
            token: None,
            website_token: default_gofile_website_token(),
        }
    }
}

fn default_gofile_website_token() -> String {
    "12345".to_string()
}

/// Per-host resolver tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverSettings {
    #[serde(default)]
    pub gofile: GofileSettings,
    #[serde(default = "default_pornhub_retry")]
    pub pornhub: RetryPolicy,
    #[serde(default = "default_instagram_paging")]
    pub instagram: PagingPolicy,
    /// Extensions served directly by image CDNs without a landing page
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            gofile: GofileSettings::default(),
            pornhub: default_pornhub_retry(),
            instagram: default_instagram_paging(),
            image_extensions: default_image_extensions(),
        }
    }
}

fn default_pornhub_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 20,
        delay_ms: 1000,
    }
}

fn default_instagram_paging() -> PagingPolicy {
    PagingPolicy {
        page_size: 100,
        max_pages: 50,
        page_delay_ms: 3000,
    }
}

fn default_image_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "gif", "webp", "bmp"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NamingConfig {
    /// Replaces path separators in thread titles and folder names
    #[serde(default = "default_invalid_char_substitute")]
    pub invalid_char_substitute: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            invalid_char_substitute: default_invalid_char_substitute(),
        }
    }
}

fn default_invalid_char_substitute() -> String {
    "-".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("downloads")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.http.request_timeout().is_none());
        assert_eq!(config.http.connect_timeout(), Duration::from_secs(10));
        assert!(config.run.skip_duplicates);
        assert_eq!(config.resolvers.pornhub.max_attempts, 20);
        assert_eq!(config.resolvers.pornhub.delay(), Duration::from_secs(1));
        assert_eq!(config.resolvers.instagram.page_delay(), Duration::from_secs(3));
        assert_eq!(config.naming.invalid_char_substitute, "-");
    }

    #[test]
    fn test_hosts_enabled_is_case_insensitive() {
        let hosts = HostsConfig {
            disabled: vec!["GoFile.io".to_string()],
        };
        assert!(!hosts.is_enabled("gofile.io"));
        assert!(hosts.is_enabled("bunkr.is"));
    }
}
