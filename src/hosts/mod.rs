//! Host classification
//!
//! A [`HostTable`] is an ordered list of [`HostSignature`]s. The
//! [`PatternMatcher`] compiles their patterns once and scans post fragments,
//! attributing every extracted reference to each host whose matcher fired.

mod matcher;
mod signature;
mod table;

pub use matcher::{HostLabel, HostMatches, MatcherError, PatternMatcher};
pub use signature::{HostSignature, MatcherKind};
pub use table::HostTable;
