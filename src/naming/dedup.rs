use std::collections::HashMap;

use crate::resolvers::{DownloadTarget, extract};
use crate::run::RunLog;

/// Case-insensitive basename of a resolved URL, query and fragment ignored
pub fn dedup_key(url: &str) -> String {
    extract::last_segment(url).to_lowercase()
}

/// Drop targets whose basename repeats an earlier one.
///
/// Among duplicates the target attributed to a single-file host wins over
/// one from a folder host; otherwise the first seen wins. Groups keep the
/// position of their first member and every dropped target is logged.
pub fn dedup(targets: Vec<DownloadTarget>, log: &RunLog) -> Vec<DownloadTarget> {
    let mut kept: Vec<DownloadTarget> = Vec::with_capacity(targets.len());
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for target in targets {
        let key = dedup_key(&target.url);

        let Some(&index) = by_key.get(&key) else {
            by_key.insert(key, kept.len());
            kept.push(target);
            continue;
        };

        let dropped = if kept[index].host.is_folder() && !target.host.is_folder() {
            std::mem::replace(&mut kept[index], target)
        } else {
            target
        };

        log.info(format!(
            "Skipped duplicate: {} from {}",
            extract::last_segment(&dropped.url),
            dropped.url
        ));
    }

    kept
}
