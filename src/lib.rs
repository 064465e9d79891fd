//! Forum post media downloader
//!
//! A post fragment is scanned for references to known hosts
//! ([`hosts`]), each reference is resolved into direct-download URLs
//! ([`resolvers`]), the targets are deduplicated and transferred
//! concurrently ([`naming`], [`orchestrator`]) and the results are packed
//! into one ZIP bundle ([`archive`]) handed to an output sink
//! ([`storage`]). [`run::PostDownloader`] ties the stages together.

pub mod archive;
pub mod config;
pub mod fetch;
pub mod hosts;
pub mod humanize;
pub mod naming;
pub mod observability;
pub mod orchestrator;
pub mod resolvers;
pub mod run;
pub mod storage;
