//! Challenge strings for intent verification.

use rand::Rng;

/// Lowest code point a challenge may contain (`!`).
pub const CHALLENGE_MIN: u8 = 33;

/// Highest code point a challenge may contain (`~`).
pub const CHALLENGE_MAX: u8 = 126;

/// Generate a challenge of `length` characters drawn uniformly from printable
/// ASCII 33..=126.
pub fn generate(length: usize) -> String {
    generate_with(&mut rand::thread_rng(), length)
}

/// Generate a challenge using the given RNG.
pub fn generate_with<R: Rng>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| char::from(rng.gen_range(CHALLENGE_MIN..=CHALLENGE_MAX)))
        .collect()
}

/// Whether `s` only contains characters a challenge may contain.
pub fn is_valid(s: &str) -> bool {
    s.bytes()
        .all(|b| (CHALLENGE_MIN..=CHALLENGE_MAX).contains(&b))
}
