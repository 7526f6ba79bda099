use crate::errors::{AppError, AppResult};
use rand::RngCore;
use sha2::{Digest, Sha256};

pub const MIN_SEED_LEN: usize = 16;
pub const MAX_SEED_LEN: usize = 32;

/// Fresh 256-bit seed from the OS random source
pub fn generate_seed() -> Vec<u8> {
    let mut seed = vec![0u8; MAX_SEED_LEN];
    rand::rngs::OsRng.fill_bytes(&mut seed);
    seed
}

pub fn validate_seed(seed: &[u8]) -> AppResult<()> {
    if !(MIN_SEED_LEN..=MAX_SEED_LEN).contains(&seed.len()) {
        return Err(AppError::MalformedSeed { len: seed.len() });
    }
    Ok(())
}

/// Short identifier safe to log in place of the seed itself
pub fn seed_fingerprint(seed: &[u8]) -> String {
    let digest = Sha256::digest(seed);
    hex::encode(&digest[..4])
}
