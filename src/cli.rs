use clap::{Parser, Subcommand};
use std::path::PathBuf;

use postgrab::run::RunOptions;

#[derive(Parser, Debug)]
#[command(name = "postgrab")]
#[command(about = "Download the media linked from a forum post", long_about = None)]
pub struct Cli {
    /// Configuration file; defaults to $POSTGRAB_CONFIG or config/postgrab.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the host references found in a saved post fragment
    Scan(ScanArgs),
    /// Resolve, download and bundle everything a post links to
    Download(DownloadArgs),
    /// List the supported hosts
    Hosts,
}

#[derive(clap::Args, Debug)]
pub struct ScanArgs {
    /// HTML fragment of the post body
    pub file: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct DownloadArgs {
    /// HTML fragment of the post body
    pub file: PathBuf,

    /// Post id used in logs and the `:id:` placeholder (default: file stem)
    #[arg(long)]
    pub post_id: Option<String>,

    #[arg(long, default_value_t = 1)]
    pub post_number: u32,

    /// Thread title used for the bundle name (default: file stem)
    #[arg(long)]
    pub title: Option<String>,

    /// Passphrase candidate for gated folders; repeatable
    #[arg(long = "password")]
    pub passwords: Vec<String>,

    /// Put album files at the bundle root
    #[arg(long)]
    pub flatten: bool,

    /// Add generated/links.txt
    #[arg(long)]
    pub links: bool,

    /// Add generated/log.txt
    #[arg(long)]
    pub log: bool,

    /// Keep targets that share a basename
    #[arg(long)]
    pub keep_duplicates: bool,

    /// Resolve only; nothing is transferred
    #[arg(long)]
    pub skip_download: bool,

    /// Name template for single-target runs (`:title:`, `:#:`, `:id:`)
    #[arg(long = "name")]
    pub name_template: Option<String>,

    /// Output directory (default: output.dir from the configuration)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl DownloadArgs {
    /// Flags layered over the configured defaults
    pub fn run_options(&self, defaults: &RunOptions) -> RunOptions {
        RunOptions {
            flatten: defaults.flatten || self.flatten,
            generate_links: defaults.generate_links || self.links,
            generate_log: defaults.generate_log || self.log,
            skip_duplicates: defaults.skip_duplicates && !self.keep_duplicates,
            skip_download: defaults.skip_download || self.skip_download,
            custom_filename_template: self
                .name_template
                .clone()
                .or_else(|| defaults.custom_filename_template.clone()),
        }
    }

    pub fn file_stem(&self) -> String {
        self.file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "post".to_string())
    }
}
