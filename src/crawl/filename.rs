//! Filename derivation for persisted pages
//!
//! Maps a URL path to a flat, filesystem-safe name. Deterministic and pure:
//! the same path always yields the same name, the name never contains a path
//! separator, and its length is bounded by hashing overlong paths.

use md5::{Digest, Md5};

/// Paths longer than this (after cleanup) are replaced by their hash
const MAX_NAME_CHARS: usize = 200;

/// Derive a safe filename stem from a URL path
///
/// Leading and trailing `/` are stripped and inner `/` become `-`; an empty
/// result maps to `index`. Cleaned paths over 200 characters collapse to
/// their 32-character hex MD5 digest to stay under filesystem name limits.
pub fn safe_name(url_path: &str) -> String {
    let cleaned = url_path.trim_matches('/').replace('/', "-");
    let name = if cleaned.is_empty() {
        "index".to_string()
    } else {
        cleaned
    };

    if name.chars().count() > MAX_NAME_CHARS {
        format!("{:x}", Md5::digest(name.as_bytes()))
    } else {
        name
    }
}
