//! Secret token used to sign cookies and CSRF tokens.

use std::env;
use std::ffi::OsString;
use std::fmt;

use rand::RngCore;

/// Environment variable supplying the secret token.
pub const SECRET_KEY_VAR: &str = "SECRET_KEY";

/// Length of a generated secret, in bytes.
const GENERATED_LEN: usize = 24;

/// Where a secret key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrigin {
    /// Supplied through `SECRET_KEY`.
    Environment,
    /// Randomly generated at process start. Not persisted.
    Generated,
}

/// Opaque signing key.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey {
    bytes: Vec<u8>,
    origin: KeyOrigin,
}

impl SecretKey {
    /// Reads `SECRET_KEY`, falling back to a random key.
    ///
    /// The raw bytes are used as-is, so a value that is not valid UTF-8
    /// still counts as set.
    pub fn from_env() -> Self {
        Self::from_bytes(env::var_os(SECRET_KEY_VAR).map(OsString::into_encoded_bytes))
    }

    /// Uses `value` when present and non-empty, otherwise generates a key.
    pub fn from_value(value: Option<String>) -> Self {
        Self::from_bytes(value.map(String::into_bytes))
    }

    pub fn from_bytes(value: Option<Vec<u8>>) -> Self {
        match value {
            Some(bytes) if !bytes.is_empty() => Self {
                bytes,
                origin: KeyOrigin::Environment,
            },
            _ => Self::generate(),
        }
    }

    pub fn generate() -> Self {
        let mut bytes = vec![0u8; GENERATED_LEN];
        rand::rng().fill_bytes(&mut bytes);
        Self {
            bytes,
            origin: KeyOrigin::Generated,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn origin(&self) -> KeyOrigin {
        self.origin
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("len", &self.bytes.len())
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}
