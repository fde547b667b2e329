//! Call codes: the short rendezvous identifier for a call.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a generated call code in characters.
pub const CODE_LENGTH: usize = 5;

/// The base-36 alphabet codes are drawn from (digits + uppercase).
const CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// A short public identifier a caller shares out-of-band with a
/// receiver to rendezvous.
///
/// Generated codes are [`CODE_LENGTH`] uppercase base-36 characters.
/// Codes received from the wire are kept as-is; lookup is exact-match,
/// so a code that was never minted simply finds no call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallCode(String);

impl CallCode {
    /// Mint a new random call code.
    ///
    /// Uniqueness against live calls is the registry's job; this
    /// function only samples the code space (36^5 values).
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let code = (0..CODE_LENGTH)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// View the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
