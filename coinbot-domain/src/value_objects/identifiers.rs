// Identifier value objects

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One-way hash of a platform user id. Raw ids never reach the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserHash(pub String);

impl UserHash {
    /// sha256 over the decimal id, lowercase hex; matches the hashes already
    /// stored in the ledger.
    pub fn from_user_id(user_id: u64) -> Self {
        let digest = Sha256::digest(user_id.to_string().as_bytes());
        let mut out = String::with_capacity(digest.len() * 2);
        for byte in digest {
            out.push_str(&format!("{:02x}", byte));
        }
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
