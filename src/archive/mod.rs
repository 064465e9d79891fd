//! In-memory ZIP bundles of a finished run

use bytes::Bytes;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use thiserror::Error;
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

use crate::naming::{numbered_name, replace_separators};

pub const LINKS_PATH: &str = "generated/links.txt";
pub const LOG_PATH: &str = "generated/log.txt";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("duplicate archive path: {0}")]
    DuplicatePath(String),
}

/// One file inside the bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub bytes: Bytes,
}

impl ArchiveEntry {
    pub fn new(path: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
        }
    }
}

/// The packaged output of one run
#[derive(Debug, Clone)]
pub struct Bundle {
    pub name: String,
    pub bytes: Bytes,
}

/// Collects entries and writes them as a deflated ZIP.
///
/// Paths must be unique; a repeated path is rejected instead of silently
/// shadowing an earlier file.
#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    entries: Vec<ArchiveEntry>,
    paths: HashSet<String>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: ArchiveEntry) -> Result<(), ArchiveError> {
        if !self.paths.insert(entry.path.clone()) {
            return Err(ArchiveError::DuplicatePath(entry.path));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = ArchiveEntry>) -> Result<(), ArchiveError> {
        entries.into_iter().try_for_each(|entry| self.add(entry))
    }

    /// `generated/links.txt`: one resolved URL per line
    pub fn add_links<'a>(&mut self, urls: impl IntoIterator<Item = &'a str>) -> String {
        let links = urls.into_iter().collect::<Vec<_>>().join("\n");
        self.add_generated(LINKS_PATH, links.into_bytes())
    }

    /// `generated/log.txt`: the run transcript
    pub fn add_log(&mut self, transcript: &str) -> String {
        self.add_generated(LOG_PATH, transcript.as_bytes().to_vec())
    }

    /// Generated files never fail the bundle: when a downloaded file already
    /// took `path`, the basename gets the next free ` (N)` suffix. Returns
    /// the path used.
    fn add_generated(&mut self, path: &str, bytes: Vec<u8>) -> String {
        let (dir, basename) = match path.rsplit_once('/') {
            Some((dir, basename)) => (Some(dir), basename),
            None => (None, path),
        };

        let mut candidate = path.to_string();
        let mut n = 1;
        while self.paths.contains(&candidate) {
            n += 1;
            let name = numbered_name(basename, n);
            candidate = match dir {
                Some(dir) => format!("{}/{}", dir, name),
                None => name,
            };
        }

        self.paths.insert(candidate.clone());
        self.entries.push(ArchiveEntry::new(candidate.clone(), bytes));
        candidate
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.path.as_str())
    }

    pub fn finish(self) -> Result<Bytes, ArchiveError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in &self.entries {
            zip.start_file(entry.path.as_str(), options)?;
            zip.write_all(&entry.bytes)?;
        }

        let cursor = zip.finish()?;
        Ok(Bytes::from(cursor.into_inner()))
    }
}

/// Bundle file name.
///
/// A custom filename wins when the run had exactly one downloadable target
/// (`.zip` is appended when missing); otherwise `"{title} #{post_number}.zip"`
/// with path separators in the title replaced.
pub fn suggested_name(
    title: &str,
    post_number: u32,
    custom_filename: Option<&str>,
    downloadable: usize,
    invalid_char_substitute: &str,
) -> String {
    if let Some(custom) = custom_filename.filter(|_| downloadable == 1) {
        return if custom.to_ascii_lowercase().ends_with(".zip") {
            custom.to_string()
        } else {
            format!("{}.zip", custom)
        };
    }

    format!(
        "{} #{}.zip",
        replace_separators(title.trim(), invalid_char_substitute),
        post_number
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn read_back(bytes: Bytes) -> Vec<(String, String)> {
        let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut content = String::new();
                file.read_to_string(&mut content).unwrap();
                (file.name().to_string(), content)
            })
            .collect()
    }

    #[test]
    fn test_bundle_with_generated_files() {
        let mut builder = ArchiveBuilder::new();
        builder
            .extend([
                ArchiveEntry::new("Trip/a.jpg", b"aaa".to_vec()),
                ArchiveEntry::new("b.jpg", b"bbb".to_vec()),
            ])
            .unwrap();
        builder.add_links(["https://x/a.jpg", "https://x/b.jpg"]);
        builder.add_log("[INFO] #1 done");

        let files = read_back(builder.finish().unwrap());

        assert_eq!(
            files,
            vec![
                ("Trip/a.jpg".to_string(), "aaa".to_string()),
                ("b.jpg".to_string(), "bbb".to_string()),
                (LINKS_PATH.to_string(), "https://x/a.jpg\nhttps://x/b.jpg".to_string()),
                (LOG_PATH.to_string(), "[INFO] #1 done".to_string()),
            ]
        );
    }

    #[test]
    fn test_duplicate_paths_are_rejected() {
        let mut builder = ArchiveBuilder::new();
        builder.add(ArchiveEntry::new("a.jpg", b"1".to_vec())).unwrap();
        assert!(matches!(
            builder.add(ArchiveEntry::new("a.jpg", b"2".to_vec())),
            Err(ArchiveError::DuplicatePath(path)) if path == "a.jpg"
        ));
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_generated_files_step_around_downloaded_paths() {
        let mut builder = ArchiveBuilder::new();
        builder
            .extend([
                ArchiveEntry::new(LINKS_PATH, b"downloaded".to_vec()),
                ArchiveEntry::new(LOG_PATH, b"first".to_vec()),
                ArchiveEntry::new("generated/log (2).txt", b"second".to_vec()),
            ])
            .unwrap();

        assert_eq!(builder.add_links(["https://x/a.jpg"]), "generated/links (2).txt");
        assert_eq!(builder.add_log("[INFO] done"), "generated/log (3).txt");

        let files = read_back(builder.finish().unwrap());
        assert_eq!(files.len(), 5);
        assert_eq!(files[0], (LINKS_PATH.to_string(), "downloaded".to_string()));
        assert_eq!(
            files[3],
            ("generated/links (2).txt".to_string(), "https://x/a.jpg".to_string())
        );
        assert_eq!(files[4], ("generated/log (3).txt".to_string(), "[INFO] done".to_string()));
    }

    #[test]
    fn test_suggested_name() {
        assert_eq!(suggested_name("Cats / Dogs", 12, None, 3, "-"), "Cats - Dogs #12.zip");
        assert_eq!(suggested_name("Cats", 12, Some("my pack"), 1, "-"), "my pack.zip");
        assert_eq!(suggested_name("Cats", 12, Some("my pack.ZIP"), 1, "-"), "my pack.ZIP");
        assert_eq!(suggested_name("Cats", 12, Some("my pack"), 2, "-"), "Cats #12.zip");
    }
}
