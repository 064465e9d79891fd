use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A forum post handed to a run by the content source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub number: u32,
    pub thread_title: String,
    /// Raw HTML fragment of the post body
    pub content: String,
    /// Passphrase candidates found in the post, e.g. spoiler contents
    #[serde(default)]
    pub passwords: Vec<String>,
}

impl Post {
    /// Passwords as written followed by their lower-cased variants, without
    /// repeats and in that order
    pub fn password_candidates(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.passwords
            .iter()
            .cloned()
            .chain(self.passwords.iter().map(|p| p.to_lowercase()))
            .filter(|p| seen.insert(p.clone()))
            .collect()
    }
}
