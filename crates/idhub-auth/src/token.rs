//! Correlation token minting

use rand::Rng;

/// Length of a correlation token
pub const TOKEN_LENGTH: usize = 32;

const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Mint a fresh correlation token: 32 symbols from `0-9A-Z`, drawn from the
/// thread-local CSPRNG.
pub fn mint_token() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_LENGTH)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect()
}
