use ring::digest;
use ring::rand::{SecureRandom, SystemRandom};

const TOKEN_BYTES: usize = 32;

#[derive(thiserror::Error, Debug)]
pub enum TokenError {
    #[error("Failed to generate random token")]
    RandomFailed,
}

/// Generates an opaque login token: 32 random bytes, hex encoded.
pub fn generate_token() -> Result<String, TokenError> {
    let rng = SystemRandom::new();

    let mut bytes = [0u8; TOKEN_BYTES];
    rng.fill(&mut bytes).map_err(|_| TokenError::RandomFailed)?;

    Ok(hex::encode(bytes))
}

/// Hex SHA-256 of a token. Only this digest is persisted, so a leaked
/// table cannot be replayed as login links.
pub fn hash_token(token: &str) -> String {
    let hash = digest::digest(&digest::SHA256, token.as_bytes());
    hex::encode(hash.as_ref())
}
