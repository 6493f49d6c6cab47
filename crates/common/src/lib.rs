//! Common types and errors shared across `mantle` crates.

pub mod error;
pub mod key_ref;

pub use error::EnvelopeError;
pub use key_ref::{KeyRef, KmsBackendKind};
