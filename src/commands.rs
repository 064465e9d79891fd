use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use postgrab::config::{Config, ConfigError};
use postgrab::fetch::HttpClient;
use postgrab::hosts::{HostTable, PatternMatcher};
use postgrab::orchestrator::TracingProgress;
use postgrab::run::{Post, PostDownloader, RunRegistry};
use postgrab::storage::StorageClient;

use crate::cli::{DownloadArgs, ScanArgs};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::load_from_path(path.to_path_buf()),
        None => Config::load(),
    }
}

pub async fn scan(config: &Config, args: ScanArgs) -> Result<(), AnyError> {
    let content = tokio::fs::read_to_string(&args.file).await?;
    let matcher = PatternMatcher::new(HostTable::builtin())?;

    let matches = matcher.scan(&content);
    if matches.is_empty() {
        println!("No supported links found");
        return Ok(());
    }

    for host_matches in matches {
        let disabled = if config.hosts.is_enabled(&host_matches.signature.name) {
            ""
        } else {
            " (disabled)"
        };
        println!("{} [{}]{}", host_matches.signature, host_matches.kind, disabled);
        for resource in &host_matches.resources {
            println!("  {}", resource);
        }
    }

    Ok(())
}

pub async fn download(config: &Config, args: DownloadArgs) -> Result<(), AnyError> {
    let content = tokio::fs::read_to_string(&args.file).await?;
    let stem = args.file_stem();
    let post = Post {
        id: args.post_id.clone().unwrap_or_else(|| stem.clone()),
        number: args.post_number,
        thread_title: args.title.clone().unwrap_or(stem),
        content,
        passwords: args.passwords.clone(),
    };
    let options = args.run_options(&config.run);

    let output_dir = args.output.clone().unwrap_or_else(|| config.output.dir.clone());
    let fetch = Arc::new(HttpClient::new(&config.http)?);
    let output = Arc::new(StorageClient::local(&output_dir)?);
    let registry = RunRegistry::new();

    let downloader = PostDownloader::from_config(config, fetch, output)?
        .with_registry(registry.clone())
        .with_progress(Arc::new(TracingProgress));

    let summary = tokio::select! {
        summary = downloader.download_post(&post, &options) => summary?,
        _ = tokio::signal::ctrl_c() => {
            if let Some(warning) = registry.exit_warning() {
                warn!("{}", warning);
            }
            return Err("interrupted".into());
        }
    };

    info!(
        post_id = %summary.post_id,
        resources = summary.resources,
        targets = summary.targets.len(),
        completed = summary.completed,
        failed = summary.failed,
        "Download finished"
    );

    match summary.bundle {
        Some(bundle) => println!("{}", output_dir.join(&bundle.key).display()),
        None => println!("Nothing to download"),
    }

    Ok(())
}

pub fn hosts(config: &Config) {
    for signature in HostTable::builtin().iter() {
        let state = if config.hosts.is_enabled(&signature.name) {
            "enabled"
        } else {
            "disabled"
        };
        let album = if signature.album.is_some() { ", albums" } else { "" };
        println!("{:<24} {:<9} {}{}", signature.name, state, signature.category, album);
    }
}
