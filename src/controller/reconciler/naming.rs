//! Deterministic execution unit names.
//!
//! The name is `job-<resource name>-<hash>` where `<hash>` is the first 8 hex
//! characters of SHA-256 over `<namespace>/<name>`. Two resources with the same
//! name in different namespaces therefore never share a unit, even when all
//! units land in one execution namespace.

use crate::constants::{MAX_UNIT_NAME_LEN, UNIT_NAME_PREFIX};
use crate::crd::ResourceKey;
use sha2::{Digest, Sha256};

const HASH_LEN: usize = 8;

/// Unit name for a resource. Stable across processes and restarts.
#[must_use]
pub fn unit_name(key: &ResourceKey) -> String {
    let digest = format!("{:x}", Sha256::digest(key.to_string().as_bytes()));
    let hash = &digest[..HASH_LEN];

    // job- + <middle> + - + hash
    let budget = MAX_UNIT_NAME_LEN - UNIT_NAME_PREFIX.len() - HASH_LEN - 2;
    let middle = sanitize(&key.name, budget);

    if middle.is_empty() {
        format!("{UNIT_NAME_PREFIX}-{hash}")
    } else {
        format!("{UNIT_NAME_PREFIX}-{middle}-{hash}")
    }
}

/// Lower-case, map anything outside `[a-z0-9-]` to `-`, truncate, and strip
/// dashes from both ends so the result joins cleanly
fn sanitize(name: &str, max_len: usize) -> String {
    let mapped: String = name
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .take(max_len)
        .collect();
    mapped.trim_matches('-').to_string()
}
