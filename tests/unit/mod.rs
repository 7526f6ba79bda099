//! Unit Tests Module
//!
//! Component tests that use the public API of one engine part at a time.

pub mod derivation;
pub mod lifecycle;
