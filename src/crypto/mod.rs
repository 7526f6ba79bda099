//! Key material for the cold wallets
//!
//! Seed handling and BIP44 derivation of per-account keys and addresses.

pub mod hd_key;
pub mod seed;

pub use hd_key::HdKeyDeriver;
pub use seed::{generate_seed, seed_fingerprint, validate_seed};
