use serde::Serialize;

use crate::hosts::HostLabel;

/// Outcome of a successful resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Url(String),
    /// Several files sharing a destination folder
    Album {
        folder_name: Option<String>,
        urls: Vec<String>,
    },
}

impl Resolved {
    pub fn url(url: impl Into<String>) -> Self {
        Resolved::Url(url.into())
    }

    /// Album from possibly-missing entries; blanks are dropped
    pub fn album<I, S>(folder_name: Option<String>, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let folder_name = folder_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        let urls = urls
            .into_iter()
            .map(Into::into)
            .map(|url: String| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();
        Resolved::Album { folder_name, urls }
    }

    pub fn len(&self) -> usize {
        match self {
            Resolved::Url(_) => 1,
            Resolved::Album { urls, .. } => urls.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One target per URL, all attributed to the same host and reference
    pub fn into_targets(self, host: &HostLabel, original: &str) -> Vec<DownloadTarget> {
        match self {
            Resolved::Url(url) => vec![DownloadTarget {
                url,
                host: host.clone(),
                original: original.to_string(),
                folder_name: None,
            }],
            Resolved::Album { folder_name, urls } => urls
                .into_iter()
                .map(|url| DownloadTarget {
                    url,
                    host: host.clone(),
                    original: original.to_string(),
                    folder_name: folder_name.clone(),
                })
                .collect(),
        }
    }
}

/// A final direct-download URL ready for transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadTarget {
    pub url: String,
    pub host: HostLabel,
    /// The matched reference this target was resolved from
    pub original: String,
    pub folder_name: Option<String>,
}
