use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::humanize::{ByteSize, percent};

/// Live status of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Resolving {
        resource: String,
    },
    /// Resolution finished for every resource
    Resolved {
        targets: usize,
        resources: usize,
    },
    File {
        url: String,
        host: String,
        loaded: u64,
        total: Option<u64>,
        /// Transfers terminal so far
        completed: usize,
        downloadable: usize,
    },
    Completed {
        completed: usize,
        total: usize,
        url: String,
        ok: bool,
    },
}

const URL_WIDTH: usize = 80;

fn ellipsize(url: &str) -> String {
    if url.chars().count() <= URL_WIDTH {
        url.to_string()
    } else {
        let head: String = url.chars().take(URL_WIDTH).collect();
        format!("{}...", head)
    }
}

impl ProgressEvent {
    /// One-line rendering for terminals and logs
    pub fn status_line(&self) -> String {
        match self {
            ProgressEvent::Resolving { resource } => format!("Resolving: {}", ellipsize(resource)),
            ProgressEvent::Resolved { targets, resources } => {
                format!("Resolved: {} targets from {} links", targets, resources)
            }
            ProgressEvent::File {
                url,
                host,
                loaded,
                total,
                completed,
                downloadable,
            } => {
                let size = match total {
                    Some(total) => format!("{} / {}", ByteSize(*loaded), ByteSize(*total)),
                    None => ByteSize(*loaded).to_string(),
                };
                let pct = percent(*loaded, *total)
                    .map(|p| format!(" ({}%)", p))
                    .unwrap_or_default();
                format!(
                    "{} / {} > {} > {}{} > {}",
                    completed,
                    downloadable,
                    host,
                    size,
                    pct,
                    ellipsize(url)
                )
            }
            ProgressEvent::Completed {
                completed,
                total,
                url,
                ok,
            } => format!(
                "{} / {} > {} {}",
                completed,
                total,
                if *ok { "done" } else { "failed" },
                ellipsize(url)
            ),
        }
    }
}

/// Receiver of progress events; must not block
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Forwards events to a channel; a closed receiver drops them
impl ProgressSink for UnboundedSender<ProgressEvent> {
    fn emit(&self, event: ProgressEvent) {
        let _ = self.send(event);
    }
}

/// Renders events as tracing lines. Per-chunk file events go to `debug`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn emit(&self, event: ProgressEvent) {
        match &event {
            ProgressEvent::File { .. } => debug!("{}", event.status_line()),
            _ => info!("{}", event.status_line()),
        }
    }
}
