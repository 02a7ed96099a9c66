//! Room-key derivation.
//!
//! Room membership is determined entirely by key equality on the server:
//! every client that presents the same key lands in the same room. Keys come
//! from a shared passphrase, or (for "quick sync" between players already in
//! a party) from a digest of the party's member identifiers so nobody has to
//! type anything.

use std::fmt::Write;

use sha2::{Digest, Sha256};
use tracing::debug;

/// Derive the room key for a shared passphrase. Whitespace around the secret
/// is not significant.
#[must_use]
pub fn passphrase_room_key(passphrase: &str) -> String {
    passphrase.trim().to_owned()
}

/// Derive a deterministic "quick sync" room key from party-member
/// identifiers. Order does not matter: the members are sorted before hashing
/// so every party member derives the same key.
///
/// An empty or placeholder roster still hashes deterministically; the result
/// is meaningless as a shared namespace, which is the roster provider's
/// problem, not ours.
#[must_use]
pub fn party_room_key<S: AsRef<str>>(members: &[S]) -> String {
    if members.is_empty() {
        debug!("deriving quick-sync room key from an empty member list");
    }

    let mut sorted: Vec<&str> = members.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();

    let mut hasher = Sha256::new();
    for member in &sorted {
        hasher.update(member.as_bytes());
        // Separator so ["ab","c"] and ["a","bc"] hash differently.
        hasher.update([0]);
    }
    bytes_to_hex(&hasher.finalize())
}

fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}
