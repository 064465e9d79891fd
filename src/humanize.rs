//! Human-readable sizes for progress lines

use std::fmt;

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Byte count rendered with binary units, two decimals above bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ByteSize(pub u64);

impl ByteSize {
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn to_human_readable(&self) -> String {
        let mut value = self.0 as f64;
        let mut unit = 0;

        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }

        if unit == 0 {
            format!("{} {}", self.0, UNITS[0])
        } else {
            format!("{:.2} {}", value, UNITS[unit])
        }
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_human_readable())
    }
}

/// Whole percentage of `loaded` over `total`; `None` without a known total
pub fn percent(loaded: u64, total: Option<u64>) -> Option<u64> {
    match total {
        Some(0) | None => None,
        Some(total) => Some((loaded.min(total) * 100) / total),
    }
}
