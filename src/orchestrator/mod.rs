//! Concurrent transfer of resolved targets
//!
//! Every transfer is issued at once and driven inside the calling task by a
//! [`FuturesUnordered`]. The loop that drains it owns the completion
//! counter; results are collected as immutable [`TransferRecord`]s in
//! completion order and named only after the last one is terminal.

mod progress;

use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::archive::ArchiveEntry;
use crate::fetch::{Fetch, FetchError, HeadersMap, Transfer, TransferProgress};
use crate::naming::{FilenameTable, PathOptions, entry_path, transfer_filename};
use crate::resolvers::DownloadTarget;
use crate::run::RunLog;

pub use progress::{NoProgress, ProgressEvent, ProgressSink, TracingProgress};

/// Terminal state of one transfer
#[derive(Debug)]
pub struct TransferRecord {
    pub target: DownloadTarget,
    pub result: Result<Transfer, FetchError>,
}

impl TransferRecord {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcome of all transfers of a run
#[derive(Debug, Default)]
pub struct TransferReport {
    /// Named archive entries for the successful transfers
    pub entries: Vec<ArchiveEntry>,
    /// Terminal transfers, failures included
    pub completed: usize,
    pub failed: usize,
}

/// How completed transfers are placed in the bundle
#[derive(Debug, Clone, Copy)]
pub struct EntryLayout<'a> {
    pub flatten: bool,
    pub custom_filename: Option<&'a str>,
    pub invalid_char_substitute: &'a str,
}

pub struct DownloadOrchestrator<'a> {
    fetch: &'a dyn Fetch,
    progress: &'a dyn ProgressSink,
    log: &'a RunLog,
}

impl<'a> DownloadOrchestrator<'a> {
    pub fn new(fetch: &'a dyn Fetch, progress: &'a dyn ProgressSink, log: &'a RunLog) -> Self {
        Self { fetch, progress, log }
    }

    /// Transfer every target and wait until all are terminal
    pub async fn transfer_all(&self, targets: Vec<DownloadTarget>) -> Vec<TransferRecord> {
        let total = targets.len();
        let completed = AtomicUsize::new(0);
        let completed = &completed;
        let no_headers = HeadersMap::new();
        let no_headers = &no_headers;

        let mut pending: FuturesUnordered<_> = targets
            .into_iter()
            .map(|target| async move {
                self.log.info(format!("Downloading: {}", target.url));

                let on_progress = |progress: TransferProgress| {
                    self.progress.emit(ProgressEvent::File {
                        url: target.url.clone(),
                        host: target.host.name.clone(),
                        loaded: progress.loaded,
                        total: progress.total,
                        completed: completed.load(Ordering::Relaxed),
                        downloadable: total,
                    });
                };

                let result = self.fetch.download(&target.url, no_headers, &on_progress).await;
                TransferRecord { target, result }
            })
            .collect();

        let mut records = Vec::with_capacity(total);

        while let Some(record) = pending.next().await {
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;

            match &record.result {
                Ok(transfer) => self.log.info(format!(
                    "Completed: {} ({} bytes)",
                    record.target.url,
                    transfer.bytes.len()
                )),
                Err(e) => self.log.error(format!("Download failed: {}: {}", record.target.url, e)),
            }

            self.progress.emit(ProgressEvent::Completed {
                completed: done,
                total,
                url: record.target.url.clone(),
                ok: record.is_ok(),
            });

            records.push(record);
        }

        records
    }

    /// Transfer `targets` and turn the successes into named archive entries
    pub async fn run(&self, targets: Vec<DownloadTarget>, layout: EntryLayout<'_>) -> TransferReport {
        let downloadable = targets.len();
        let records = self.transfer_all(targets).await;

        let options = PathOptions {
            downloadable,
            flatten: layout.flatten,
            custom_filename: layout.custom_filename,
            invalid_char_substitute: layout.invalid_char_substitute,
        };

        let mut names = FilenameTable::new();
        let mut report = TransferReport {
            completed: records.len(),
            ..TransferReport::default()
        };

        for record in records {
            let transfer = match record.result {
                Ok(transfer) => transfer,
                Err(_) => {
                    report.failed += 1;
                    continue;
                }
            };

            let basename = names.assign(&transfer_filename(&transfer));
            let folder_name = record.target.folder_name.as_deref();
            let path = entry_path(&basename, folder_name, &options);

            match folder_name.filter(|folder| !folder.trim().is_empty()) {
                Some(folder) => self.log.info(format!("Saving as: {} to {}", basename, folder)),
                None => self.log.info(format!("Saving as: {}", basename)),
            }

            report.entries.push(ArchiveEntry::new(path, transfer.bytes));
        }

        report
    }
}
