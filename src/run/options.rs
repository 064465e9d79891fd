use serde::{Deserialize, Serialize};

use super::post::Post;
use crate::naming::replace_separators;

/// Options recognized by a run. Unknown keys are ignored when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RunOptions {
    /// Put album files at the bundle root instead of per-folder directories
    pub flatten: bool,
    /// Add `generated/links.txt` with every resolved URL
    pub generate_links: bool,
    /// Add `generated/log.txt` with the run transcript
    pub generate_log: bool,
    pub skip_duplicates: bool,
    /// Resolve only; package the links manifest without transferring files
    pub skip_download: bool,
    /// Bundle/file name for single-target runs. Supports `:title:`, `:#:`
    /// (post number) and `:id:` (post id).
    pub custom_filename_template: Option<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            flatten: false,
            generate_links: false,
            generate_log: false,
            skip_duplicates: true,
            skip_download: false,
            custom_filename_template: None,
        }
    }
}

impl RunOptions {
    /// The template with placeholders substituted, if one is set. Path
    /// separators in the title become `invalid_char_substitute`.
    pub fn custom_filename(&self, post: &Post, invalid_char_substitute: &str) -> Option<String> {
        self.custom_filename_template
            .as_deref()
            .filter(|template| !template.trim().is_empty())
            .map(|template| {
                template
                    .replace(
                        ":title:",
                        &replace_separators(&post.thread_title, invalid_char_substitute),
                    )
                    .replace(":#:", &post.number.to_string())
                    .replace(":id:", &post.id)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_placeholders() {
        let post = Post {
            id: "p42".to_string(),
            number: 3,
            thread_title: "Summer".to_string(),
            ..Post::default()
        };
        let options = RunOptions {
            custom_filename_template: Some(":title: #:#: (:id:).jpg".to_string()),
            ..RunOptions::default()
        };
        assert_eq!(
            options.custom_filename(&post, "-").as_deref(),
            Some("Summer #3 (p42).jpg")
        );
    }

    #[test]
    fn test_title_separators_replaced() {
        let post = Post {
            thread_title: "Cats/Dogs \\ more".to_string(),
            ..Post::default()
        };
        let options = RunOptions {
            custom_filename_template: Some(":title:.jpg".to_string()),
            ..RunOptions::default()
        };
        assert_eq!(
            options.custom_filename(&post, "-").as_deref(),
            Some("Cats-Dogs - more.jpg")
        );
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let options: RunOptions =
            serde_json::from_str(r#"{"flatten": true, "open_in_new_tab": true}"#).unwrap();
        assert!(options.flatten);
        assert!(options.skip_duplicates);
    }
}
