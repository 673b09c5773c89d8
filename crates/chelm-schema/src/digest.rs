use serde::{Serialize, Serializer};
use sha2::{Digest as _, Sha256};
use std::fmt;

/// Deterministic stand-in for an image digest, derived from an image identifier.
///
/// The value is `sha256:<hex>` of the identifier's UTF-8 bytes. It carries no
/// meaning beyond being stable: the same identifier always yields the same
/// digest, in every process.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestDigest {
    hex: String,
}

impl TestDigest {
    pub const ALGORITHM: &'static str = "sha256";

    /// Compute the test digest for `image_id`.
    pub fn of(image_id: &str) -> Self {
        let hash = Sha256::digest(image_id.as_bytes());
        Self {
            hex: format!("{hash:x}"),
        }
    }

    pub fn algorithm(&self) -> &'static str {
        Self::ALGORITHM
    }

    /// Lower-case hex encoding of the hash, without the algorithm prefix.
    pub fn hex(&self) -> &str {
        &self.hex
    }
}

impl fmt::Display for TestDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", Self::ALGORITHM, self.hex)
    }
}

impl Serialize for TestDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
