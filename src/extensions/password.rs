//! Password hashing.

use super::ExtensionError;

/// bcrypt hasher with a fixed cost factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bcrypt {
    cost: u32,
}

impl Bcrypt {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hashes `password` with a fresh salt.
    pub fn hash(&self, password: &str) -> Result<String, ExtensionError> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    /// Checks `password` against a stored hash.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, ExtensionError> {
        Ok(bcrypt::verify(password, hash)?)
    }
}
