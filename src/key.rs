//! Password based seeding of the placement generators.
//!
//! Encoder and decoder derive the very same seed from the same password, so both
//! visit the same locations in the same order without the order ever being stored.

use crate::password::Password;

/// Seed used when no password is given
pub const DEFAULT_SEED: u64 = 0x5354_4547_414e_4f21;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Stable 64 bit seed for a password, FNV-1a over its UTF-8 bytes.
pub fn derive_seed(password: &Password) -> u64 {
    match password.as_str() {
        Some(p) => hash_seed(p.as_bytes()),
        None => DEFAULT_SEED,
    }
}

fn hash_seed(seed: &[u8]) -> u64 {
    seed.iter().fold(FNV_OFFSET, |hash, &byte| {
        (hash ^ (byte as u64)).wrapping_mul(FNV_PRIME)
    })
}
