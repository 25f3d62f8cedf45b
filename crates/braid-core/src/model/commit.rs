//! Commit records as captured from the version-control stream.
//!
//! Read-only once captured. The correlator in `braid-correlate` consumes
//! these to derive issue events; nothing in the engine ever mutates a
//! commit after parsing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One file touched by a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub insertions: u32,
    pub deletions: u32,
}

/// One commit from the version-control stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    /// Full hash.
    pub sha: String,
    /// First seven characters of the hash.
    pub short_sha: String,
    pub timestamp: DateTime<Utc>,
    pub author: String,
    pub author_email: String,
    /// Subject line only.
    pub message: String,
    pub files: Vec<FileChange>,
}

impl Commit {
    /// Shorten an arbitrary hash to the conventional seven characters.
    #[must_use]
    pub fn shorten(sha: &str) -> String {
        if sha.len() > 7 {
            sha[..7].to_string()
        } else {
            sha.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorten_truncates_long_hashes() {
        assert_eq!(
            Commit::shorten("abc123def456789012345678901234567890abcd"),
            "abc123d"
        );
        assert_eq!(Commit::shorten("abc"), "abc");
    }
}
