//! Deduplication of resolved targets and archive naming
//!
//! Targets are deduplicated by case-insensitive basename before any
//! transfer starts. Names for completed transfers come from the response
//! headers or the URL and are made unique by a [`FilenameTable`], in
//! completion order.

mod dedup;
mod filename;
mod table;

pub use dedup::{dedup, dedup_key};
pub use filename::{
    content_disposition_filename, extension_for_content_type, filename_from_url, has_extension,
    percent_decode, sanitize, transfer_filename,
};
pub use table::{FilenameTable, PathOptions, entry_path, numbered_name, replace_separators};
