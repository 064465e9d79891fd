use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};

use super::{Post, RunLog, RunOptions, RunRegistry};
use crate::archive::{ArchiveBuilder, ArchiveError, Bundle, suggested_name};
use crate::config::{Config, HostsConfig, NamingConfig, ResolverSettings};
use crate::fetch::Fetch;
use crate::hosts::{HostMatches, HostTable, MatcherError, PatternMatcher};
use crate::naming::{dedup, replace_separators};
use crate::observability::Metrics;
use crate::orchestrator::{
    DownloadOrchestrator, EntryLayout, NoProgress, ProgressEvent, ProgressSink, TransferReport,
};
use crate::resolvers::{DownloadTarget, ResolveContext, ResolverTable, RuleError};
use crate::storage::{OutputSink, StorageError, StoredBundle};

/// Failure to assemble the static tables
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Matcher(#[from] MatcherError),

    #[error(transparent)]
    Rules(#[from] RuleError),
}

/// Fatal run errors; everything else is logged and skipped
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Packaging failed: {0}")]
    Packaging(#[from] ArchiveError),

    #[error("Saving the bundle failed: {0}")]
    Storage(#[from] StorageError),
}

/// What one run produced
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub post_id: String,
    /// Matched references handed to resolvers
    pub resources: usize,
    /// Downloadable targets after deduplication
    pub targets: Vec<DownloadTarget>,
    pub completed: usize,
    pub failed: usize,
    pub bundle: Option<StoredBundle>,
}

/// Runs "download post" end to end.
///
/// The host and resolver tables are built once and shared by every run;
/// per-run state (log, passwords, counters) lives inside
/// [`PostDownloader::download_post`].
pub struct PostDownloader {
    matcher: PatternMatcher,
    resolvers: ResolverTable,
    fetch: Arc<dyn Fetch>,
    output: Arc<dyn OutputSink>,
    hosts: HostsConfig,
    settings: ResolverSettings,
    naming: NamingConfig,
    registry: RunRegistry,
    metrics: Arc<Metrics>,
    progress: Arc<dyn ProgressSink>,
}

impl PostDownloader {
    pub fn new(
        matcher: PatternMatcher,
        resolvers: ResolverTable,
        fetch: Arc<dyn Fetch>,
        output: Arc<dyn OutputSink>,
    ) -> Self {
        Self {
            matcher,
            resolvers,
            fetch,
            output,
            hosts: HostsConfig::default(),
            settings: ResolverSettings::default(),
            naming: NamingConfig::default(),
            registry: RunRegistry::new(),
            metrics: Arc::new(Metrics::new()),
            progress: Arc::new(NoProgress),
        }
    }

    /// Builtin host and resolver tables, tuned by `config`
    pub fn from_config(
        config: &Config,
        fetch: Arc<dyn Fetch>,
        output: Arc<dyn OutputSink>,
    ) -> Result<Self, SetupError> {
        let matcher = PatternMatcher::new(HostTable::builtin())?;
        let resolvers = ResolverTable::builtin()?;

        Ok(Self::new(matcher, resolvers, fetch, output)
            .with_hosts(config.hosts.clone())
            .with_settings(config.resolvers.clone())
            .with_naming(config.naming.clone()))
    }

    pub fn with_hosts(mut self, hosts: HostsConfig) -> Self {
        self.hosts = hosts;
        self
    }

    pub fn with_settings(mut self, settings: ResolverSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_naming(mut self, naming: NamingConfig) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_registry(mut self, registry: RunRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn registry(&self) -> &RunRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Host matches for `content`, disabled hosts included
    pub fn scan(&self, content: &str) -> Vec<HostMatches> {
        self.matcher.scan(content)
    }

    fn enabled_matches(&self, content: &str) -> Vec<HostMatches> {
        self.scan(content)
            .into_iter()
            .filter(|matches| self.hosts.is_enabled(&matches.signature.name))
            .collect()
    }

    #[instrument(skip_all, fields(post_id = %post.id, post_number = post.number))]
    pub async fn download_post(&self, post: &Post, options: &RunOptions) -> Result<RunSummary, RunError> {
        let _guard = self.registry.begin(&post.id);
        let log = RunLog::new(post.id.clone(), post.number);
        let passwords = post.password_candidates();

        let matches = self.enabled_matches(&post.content);
        let resources: usize = matches.iter().map(|m| m.resources.len()).sum();

        log.separator();
        log.info(format!("Using {} hosts with {} links", matches.len(), resources));
        log.separator();

        let targets = self.resolve_all(&matches, &passwords, &log).await;
        self.progress.emit(ProgressEvent::Resolved {
            targets: targets.len(),
            resources,
        });

        let targets = if options.skip_duplicates {
            dedup(targets, &log)
        } else {
            targets
        };
        let downloadable = targets.len();

        log.separator();
        log.info(format!("Found {} resource(s)", downloadable));
        log.separator();

        let custom_filename = options.custom_filename(post, &self.naming.invalid_char_substitute);

        let report = if options.skip_download {
            log.info("Skipping download");
            TransferReport::default()
        } else {
            let orchestrator = DownloadOrchestrator::new(self.fetch.as_ref(), self.progress.as_ref(), &log);
            let layout = EntryLayout {
                flatten: options.flatten,
                custom_filename: custom_filename.as_deref(),
                invalid_char_substitute: &self.naming.invalid_char_substitute,
            };
            orchestrator.run(targets.clone(), layout).await
        };
        self.metrics.transfers(report.completed, report.failed);

        let mut summary = RunSummary {
            post_id: post.id.clone(),
            resources,
            completed: report.completed,
            failed: report.failed,
            ..RunSummary::default()
        };

        if downloadable > 0 {
            let bundle = self.package(post, options, custom_filename.as_deref(), &targets, report, &log)?;
            let folder = replace_separators(post.thread_title.trim(), &self.naming.invalid_char_substitute);
            let stored = self.output.store(&folder, &bundle).await?;

            self.metrics.bundle_written();
            info!(key = %stored.key, size = stored.size, "Run finished");
            summary.bundle = Some(stored);
        } else {
            info!("Run finished without downloadable targets");
        }

        summary.targets = targets;
        Ok(summary)
    }

    /// Resolve every matched reference in table order, one at a time
    async fn resolve_all(
        &self,
        matches: &[HostMatches],
        passwords: &[String],
        log: &RunLog,
    ) -> Vec<DownloadTarget> {
        let ctx = ResolveContext {
            fetch: self.fetch.as_ref(),
            passwords,
            settings: &self.settings,
            log,
        };

        let mut targets = Vec::new();

        for host_matches in matches {
            let label = host_matches.label();

            for resource in &host_matches.resources {
                self.progress.emit(ProgressEvent::Resolving {
                    resource: resource.clone(),
                });

                match self.resolvers.resolve(resource, &ctx).await {
                    Ok(Some(resolved)) if !resolved.is_empty() => {
                        self.metrics.resource_resolved();
                        log.info(format!("Resolved {} ({} link(s))", resource, resolved.len()));
                        targets.extend(resolved.into_targets(&label, resource));
                    }
                    Ok(_) => {
                        self.metrics.resource_failed();
                        log.error(format!("Could not resolve: {}", resource));
                    }
                    Err(e) => {
                        self.metrics.resource_failed();
                        log.error(format!("Error resolving {}: {}", resource, e));
                    }
                }
            }
        }

        targets
    }

    fn package(
        &self,
        post: &Post,
        options: &RunOptions,
        custom_filename: Option<&str>,
        targets: &[DownloadTarget],
        report: TransferReport,
        log: &RunLog,
    ) -> Result<Bundle, RunError> {
        let name = suggested_name(
            &post.thread_title,
            post.number,
            custom_filename,
            targets.len(),
            &self.naming.invalid_char_substitute,
        );

        log.separator();
        log.info("Preparing zip");

        let mut builder = ArchiveBuilder::new();
        builder.extend(report.entries)?;

        if options.generate_log {
            log.info("Generating log file");
            let path = builder.add_log(&log.transcript());
            debug!(path, "Log file added");
        }

        if options.generate_links {
            log.info("Generating links");
            let path = builder.add_links(targets.iter().map(|target| target.url.as_str()));
            debug!(path, "Links file added");
        }

        let bytes = builder.finish()?;
        Ok(Bundle { name, bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{LINKS_PATH, LOG_PATH};
    use crate::fetch::MockFetch;
    use crate::hosts::HostSignature;
    use crate::resolvers::{ResolveContext, ResolveError, Resolved, Resolver, ResolverRule};
    use crate::storage::StorageClient;
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    fn identity(url: &str) -> String {
        url.to_string()
    }

    fn downloader(fetch: MockFetch, output: StorageClient) -> PostDownloader {
        let table = HostTable::new(vec![HostSignature::new(
            "files.example:File host",
            "files.example",
            None,
        )]);
        let resolvers = ResolverTable::new(vec![
            ResolverRule::transform("files.example", &[r"files\.example"], identity).unwrap(),
        ]);
        PostDownloader::new(
            PatternMatcher::new(&table).unwrap(),
            resolvers,
            Arc::new(fetch),
            Arc::new(output),
        )
    }

    fn post(content: &str) -> Post {
        Post {
            id: "post-9".to_string(),
            number: 9,
            thread_title: "Summer".to_string(),
            content: content.to_string(),
            passwords: vec![],
        }
    }

    fn zip_names(bytes: &[u8]) -> Vec<String> {
        let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_skip_download_packages_links_only() {
        let output = StorageClient::in_memory();
        let downloader = downloader(MockFetch::new(), output.clone());
        let options = RunOptions {
            skip_download: true,
            generate_links: true,
            ..RunOptions::default()
        };

        let content = r#"<a href="https://files.example/a.jpg">a</a> <a href="https://files.example/b.jpg">b</a>"#;
        let summary = downloader.download_post(&post(content), &options).await.unwrap();

        assert_eq!(summary.targets.len(), 2);
        assert_eq!(summary.completed, 0);
        let stored = summary.bundle.unwrap();
        assert_eq!(stored.key, "Summer/Summer #9.zip");

        let bytes = output.download(&stored.key).await.unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        let mut links = String::new();
        archive.by_name(LINKS_PATH).unwrap().read_to_string(&mut links).unwrap();
        assert_eq!(links, "https://files.example/a.jpg\nhttps://files.example/b.jpg");
    }

    #[tokio::test]
    async fn test_no_matches_stores_nothing() {
        let output = StorageClient::in_memory();
        let downloader = downloader(MockFetch::new(), output);

        let summary = downloader
            .download_post(&post("<p>nothing here</p>"), &RunOptions::default())
            .await
            .unwrap();

        assert!(summary.bundle.is_none());
        assert_eq!(summary.resources, 0);
        assert!(!downloader.registry().any_in_progress());
    }

    #[tokio::test]
    async fn test_failed_transfers_are_left_out() {
        let fetch = MockFetch::new()
            .file("https://files.example/a.jpg", b"a".to_vec(), Some("image/jpeg"))
            .failing("https://files.example/b.jpg");
        let output = StorageClient::in_memory();
        let downloader = downloader(fetch, output.clone());
        let options = RunOptions {
            generate_log: true,
            ..RunOptions::default()
        };

        let content = r#"<img src="https://files.example/a.jpg"><img src="https://files.example/b.jpg">"#;
        let summary = downloader.download_post(&post(content), &options).await.unwrap();

        assert_eq!(summary.completed, 2);
        assert_eq!(summary.failed, 1);

        let bytes = output.download(&summary.bundle.unwrap().key).await.unwrap();
        assert_eq!(zip_names(&bytes), vec!["a.jpg".to_string(), LOG_PATH.to_string()]);

        let metrics = downloader.metrics().snapshot();
        assert_eq!(metrics.resources_resolved, 2);
        assert_eq!(metrics.transfers_failed, 1);
        assert_eq!(metrics.bundles_written, 1);
    }

    #[tokio::test]
    async fn test_disabled_hosts_are_ignored() {
        let output = StorageClient::in_memory();
        let downloader = downloader(MockFetch::new(), output).with_hosts(HostsConfig {
            disabled: vec!["files.example".to_string()],
        });

        let summary = downloader
            .download_post(&post(r#"<a href="https://files.example/a.jpg">a</a>"#), &RunOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.resources, 0);
        assert!(summary.bundle.is_none());
    }

    /// Album whose folder and file names shadow the generated files
    struct GeneratedLookalike;

    #[async_trait::async_trait]
    impl Resolver for GeneratedLookalike {
        async fn resolve(
            &self,
            _url: &str,
            _ctx: &ResolveContext<'_>,
        ) -> Result<Option<Resolved>, ResolveError> {
            Ok(Some(Resolved::album(
                Some("generated".to_string()),
                ["https://files.example/links.txt", "https://files.example/b.jpg"],
            )))
        }
    }

    #[tokio::test]
    async fn test_downloaded_file_named_like_links_manifest() {
        let fetch = MockFetch::new()
            .file("https://files.example/links.txt", b"mine".to_vec(), Some("text/plain"))
            .file("https://files.example/b.jpg", b"b".to_vec(), Some("image/jpeg"));
        let output = StorageClient::in_memory();
        let table = HostTable::new(vec![HostSignature::new(
            "albums.example:Album host",
            "albums.example",
            None,
        )]);
        let resolvers = ResolverTable::new(vec![
            ResolverRule::pipeline("albums.example", &[r"albums\.example"], GeneratedLookalike).unwrap(),
        ]);
        let downloader = PostDownloader::new(
            PatternMatcher::new(&table).unwrap(),
            resolvers,
            Arc::new(fetch),
            Arc::new(output.clone()),
        );
        let options = RunOptions {
            generate_links: true,
            ..RunOptions::default()
        };

        let content = r#"<a href="https://albums.example/a/1">album</a>"#;
        let summary = downloader.download_post(&post(content), &options).await.unwrap();

        let bytes = output.download(&summary.bundle.unwrap().key).await.unwrap();
        let names = zip_names(&bytes);
        assert!(names.contains(&LINKS_PATH.to_string()));
        assert!(names.contains(&"generated/b.jpg".to_string()));
        assert!(names.contains(&"generated/links (2).txt".to_string()));

        let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        let mut downloaded = String::new();
        archive.by_name(LINKS_PATH).unwrap().read_to_string(&mut downloaded).unwrap();
        assert_eq!(downloaded, "mine");
    }
}
