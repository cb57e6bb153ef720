//! Code, token and password hashing helpers.

use anyhow::Context as _;
use rand::RngExt;
use sha2::{Digest, Sha256};

use crate::domain::types::{BCRYPT_COST, OTP_LEN, TOKEN_BYTES};

/// Uniformly random, zero-padded 6-digit code.
pub fn generate_otp() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{n:0width$}", width = OTP_LEN)
}

/// 32 random bytes, hex-encoded.
pub fn generate_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::random();
    hex::encode(bytes)
}

/// SHA-256 of a raw token, hex-encoded. Only the digest is ever persisted.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    bcrypt::hash(password, BCRYPT_COST).context("bcrypt hash")
}

pub fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    bcrypt::verify(password, hash).context("bcrypt verify")
}
