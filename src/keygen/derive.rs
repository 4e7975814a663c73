//! Digest expansion into password characters.
//!
//! The source bytes are hashed once with SHA-256. Output characters are
//! read from the digest one byte at a time; every 32 characters the digest
//! is re-hashed (the ratchet) so that no digest byte is reused verbatim.

use sha2::{Digest, Sha256};

/// Characters a derived secret may contain, in index order.
pub const ALPHABET: &[u8; 74] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()_+";

/// Length used when a caller passes zero or a negative length.
pub const DEFAULT_LENGTH: usize = 16;

/// Bits credited per output character.
///
/// Kept at 6.1 for compatibility with previously issued estimates, even
/// though `log2(74)` is closer to 6.2095.
pub const BITS_PER_CHAR: f64 = 6.1;

const DIGEST_LEN: usize = 32;

/// Derives a deterministic secret of `length` characters from `source`.
///
/// Lengths of zero or below fall back to [`DEFAULT_LENGTH`]. The result is
/// a pure function of `(source, length)`; an empty `source` is valid.
pub fn derive(source: &[u8], length: i64) -> String {
    let length = usize::try_from(length)
        .ok()
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_LENGTH);

    let mut digest: [u8; DIGEST_LEN] = Sha256::digest(source).into();
    let mut secret = String::with_capacity(length);

    for i in 0..length {
        if i > 0 && i % DIGEST_LEN == 0 {
            digest = Sha256::digest(digest).into();
        }

        let byte = digest[i % DIGEST_LEN];
        secret.push(ALPHABET[byte as usize % ALPHABET.len()] as char);
    }

    tracing::trace!(
        source_bytes = source.len(),
        length,
        "Derived secret from source digest"
    );

    secret
}

/// Returns the entropy estimate for `secret` in bits.
///
/// Computed as `floor(bytes * 6.1)` over the UTF-8 length, so multi-byte
/// characters count once per byte.
pub fn entropy_estimate(secret: &str) -> u32 {
    (secret.len() as f64 * BITS_PER_CHAR) as u32
}
