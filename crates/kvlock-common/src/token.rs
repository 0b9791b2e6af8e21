//! Ownership tokens
//!
//! A token is stored as the value of a claimed key and proves which lock
//! handle owns it. A fresh one is minted for every acquisition.

use std::fmt::{Display, Formatter};

use uuid::Uuid;

/// Opaque, globally unique proof of lock ownership
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OwnershipToken(String);

impl OwnershipToken {
    /// Mint a new random token (UUID v4)
    pub fn generate() -> Self {
        OwnershipToken(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OwnershipToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for OwnershipToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
