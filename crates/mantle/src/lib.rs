//! Envelope encryption: each plaintext is sealed under a fresh data key, and
//! that key is wrapped by an external KMS.
//!
//! The codec lives in [`envelope`]; [`kms`] holds the pluggable backends;
//! [`cli`], [`config`], [`files`] and [`telemetry`] are the plumbing around it
//! used by the `mantle` binary.

pub mod cli;
pub mod config;
pub mod crypto;
pub mod dek;
pub mod envelope;
pub mod files;
pub mod kms;
pub mod telemetry;

pub use envelope::{CodecOptions, EnvelopeCodec};
pub use kms::{Kms, KmsProvider};
pub use mantle_common::{EnvelopeError, KeyRef, KmsBackendKind};
