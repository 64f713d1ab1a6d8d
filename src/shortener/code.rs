//! Random short-code generation
//!
//! Codes are six symbols drawn independently and uniformly from a 64-symbol
//! alphabet, giving 64^6 (about 6.9e10) possible codes. With N links stored,
//! a fresh code collides with probability roughly N / 64^6, so a handful of
//! retries is enough in practice.

use rand::{Rng, RngExt};

/// Symbols a short code may contain
pub const ALPHABET: &[u8; 64] =
    b"abcdefghijklmnopqrstuvwxyz0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_-";

pub const CODE_LENGTH: usize = 6;

/// Generate a code from the thread-local CSPRNG
pub fn generate_code() -> String {
    generate_code_with(&mut rand::rng())
}

/// Generate a code from an explicit RNG.
///
/// `random_range` samples without modulo bias.
pub fn generate_code_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LENGTH)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}
