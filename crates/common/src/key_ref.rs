//! Identifiers naming which external key protects a DEK.
//!
//! A key reference is configuration, never data: it is not stored in the
//! envelope, so the caller must supply the same one to open as was used to seal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque name of a KMS-managed key (an AWS key id, ARN, or alias; a local key label).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyRef(String);

impl KeyRef {
    /// Wrap an identifier. Surrounding whitespace is trimmed.
    pub fn new(id: impl Into<String>) -> Self {
        let id: String = id.into();
        Self(id.trim().to_owned())
    }

    /// The identifier as handed to the backend.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which KMS backend performs wrap/unwrap.
///
/// Deserialisation goes through [`FromStr`], so configuration values are
/// case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum KmsBackendKind {
    /// AWS Key Management Service.
    Aws,
    /// Offline wrapping under a locally configured master key.
    Local,
}

impl KmsBackendKind {
    /// Lowercase name as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            KmsBackendKind::Aws => "aws",
            KmsBackendKind::Local => "local",
        }
    }
}

impl fmt::Display for KmsBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KmsBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aws" => Ok(KmsBackendKind::Aws),
            "local" => Ok(KmsBackendKind::Local),
            other => Err(format!("unknown kms provider: {other} (expected `aws` or `local`)")),
        }
    }
}

impl TryFrom<String> for KmsBackendKind {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_ref_trims_whitespace() {
        let k = KeyRef::new("  alias/mantle \n");
        assert_eq!(k.as_str(), "alias/mantle");
        assert_eq!(k.to_string(), "alias/mantle");
        assert_eq!(KeyRef::new("   ").as_str(), "");
    }

    #[test]
    fn backend_kind_parses_case_insensitively() {
        assert_eq!("AWS".parse::<KmsBackendKind>().unwrap(), KmsBackendKind::Aws);
        assert_eq!(" local".parse::<KmsBackendKind>().unwrap(), KmsBackendKind::Local);
        assert!("gcp-hsm".parse::<KmsBackendKind>().is_err());
    }

    #[test]
    fn backend_kind_deserialises_case_insensitively() {
        use serde::de::value::{Error, StringDeserializer};

        let de = StringDeserializer::<Error>::new("AWS".to_owned());
        assert_eq!(KmsBackendKind::deserialize(de).unwrap(), KmsBackendKind::Aws);
        let de = StringDeserializer::<Error>::new("gcp".to_owned());
        assert!(KmsBackendKind::deserialize(de).is_err());
    }

    #[test]
    fn backend_kind_display_round_trips() {
        for kind in [KmsBackendKind::Aws, KmsBackendKind::Local] {
            assert_eq!(kind.to_string().parse::<KmsBackendKind>().unwrap(), kind);
        }
    }
}
