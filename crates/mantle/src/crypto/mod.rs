//! AES-256-GCM-SIV payload encryption and the random source feeding it.
//!
//! This module is intentionally free of KMS and CLI dependencies.
//! It provides the low-level seal/open operations used by the envelope codec.

pub mod cipher;
pub mod random;

pub use cipher::{KEY_LEN, NONCE_LEN, TAG_LEN};
pub use random::{OsRandom, RandomSource};
