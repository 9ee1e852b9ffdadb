// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 lipiflow contributors

//! Ionisation polarity tagging
//!
//! Stage outputs are keyed by the polarity of the acquisition they came from.
//! Polarity is inferred from the file name by case-insensitive substring
//! match; negative substrings are checked before positive ones.

use std::fmt;
use std::path::Path;

/// Ionisation polarity of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Negative,
    Positive,
    Unknown,
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative => write!(f, "negative"),
            Self::Positive => write!(f, "positive"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Infer the polarity of a file from its name.
///
/// Matches `neg`/`negative` before `pos`/`positive`; a name containing
/// neither yields [`Polarity::Unknown`]. Only the final path component is
/// inspected, so directory names do not influence the result.
pub fn infer_polarity(path: &Path) -> Polarity {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if name.contains("neg") {
        Polarity::Negative
    } else if name.contains("pos") {
        Polarity::Positive
    } else {
        Polarity::Unknown
    }
}
