use std::collections::{HashMap, HashSet};

/// Collision-free archive names, in assignment order.
///
/// The first use of a name keeps it; the N-th reuse becomes
/// `stem (N).ext`, N counting from 2.
#[derive(Debug, Default)]
pub struct FilenameTable {
    uses: HashMap<String, usize>,
    assigned: HashSet<String>,
}

fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}

/// `stem (n).ext`, or `name (n)` without an extension
pub fn numbered_name(name: &str, n: usize) -> String {
    match split_extension(name) {
        (stem, Some(ext)) => format!("{} ({}).{}", stem, n, ext),
        (stem, None) => format!("{} ({})", stem, n),
    }
}

impl FilenameTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, name: &str) -> String {
        let uses = self.uses.entry(name.to_string()).or_insert(0);
        *uses += 1;

        let mut n = *uses;
        let mut candidate = if n == 1 { name.to_string() } else { numbered_name(name, n) };

        // A literal "a (2).jpg" in the input must not collide with a
        // generated one
        while self.assigned.contains(&candidate) {
            n += 1;
            candidate = numbered_name(name, n);
        }

        if let Some(uses) = self.uses.get_mut(name) {
            *uses = n;
        }
        self.assigned.insert(candidate.clone());
        candidate
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

/// Options that shape archive entry paths
#[derive(Debug, Clone, Copy)]
pub struct PathOptions<'a> {
    /// Targets that were downloadable after dedup
    pub downloadable: usize,
    pub flatten: bool,
    /// Expanded custom filename, used only for single-target runs
    pub custom_filename: Option<&'a str>,
    pub invalid_char_substitute: &'a str,
}

/// Replace path separators in a folder or title with `substitute`
pub fn replace_separators(name: &str, substitute: &str) -> String {
    name.replace(['/', '\\'], substitute)
}

/// Archive path of one entry
pub fn entry_path(basename: &str, folder_name: Option<&str>, options: &PathOptions<'_>) -> String {
    if options.downloadable == 1 {
        return options.custom_filename.unwrap_or(basename).to_string();
    }

    match folder_name.map(str::trim).filter(|folder| !folder.is_empty()) {
        Some(folder) if !options.flatten => format!(
            "{}/{}",
            replace_separators(folder, options.invalid_char_substitute),
            basename
        ),
        _ => basename.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(downloadable: usize, flatten: bool, custom: Option<&str>) -> PathOptions<'_> {
        PathOptions {
            downloadable,
            flatten,
            custom_filename: custom,
            invalid_char_substitute: "-",
        }
    }

    #[test]
    fn test_collision_discriminators() {
        let mut table = FilenameTable::new();
        assert_eq!(table.assign("a.jpg"), "a.jpg");
        assert_eq!(table.assign("a.jpg"), "a (2).jpg");
        assert_eq!(table.assign("a.jpg"), "a (3).jpg");
        assert_eq!(table.assign("b"), "b");
        assert_eq!(table.assign("b"), "b (2)");
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn test_generated_name_never_repeats_a_literal_one() {
        let mut table = FilenameTable::new();
        assert_eq!(table.assign("a (2).jpg"), "a (2).jpg");
        assert_eq!(table.assign("a.jpg"), "a.jpg");
        assert_eq!(table.assign("a.jpg"), "a (3).jpg");
        assert_eq!(table.assign("a.jpg"), "a (4).jpg");
    }

    #[test]
    fn test_entry_paths() {
        assert_eq!(entry_path("x.jpg", Some("Trip/2023"), &options(2, false, None)), "Trip-2023/x.jpg");
        assert_eq!(entry_path("x.jpg", Some("Trip"), &options(2, true, None)), "x.jpg");
        assert_eq!(entry_path("x.jpg", Some("  "), &options(2, false, None)), "x.jpg");
        assert_eq!(entry_path("x.jpg", None, &options(2, false, Some("custom"))), "x.jpg");
        assert_eq!(entry_path("x.jpg", Some("Trip"), &options(1, false, Some("custom.jpg"))), "custom.jpg");
        assert_eq!(entry_path("x.jpg", Some("Trip"), &options(1, false, None)), "x.jpg");
    }
}
