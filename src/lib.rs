//! Air-gapped Bitcoin custody wallet
//!
//! Three cooperating roles share one engine: Keygen (offline, owns the
//! seed), Signature (offline, owns an authorization key) and Watch
//! (online, no private keys). State crosses roles only via handoff files.

pub mod cli;
pub mod config;
pub mod crypto;
pub mod database;
pub mod errors;
pub mod handoff;
pub mod processor;
pub mod rpc;
pub mod types;
pub mod wallet;
