//! Signer key handling that keeps the key out of logs and reports.

use serde::{Serialize, Serializer};
use std::fmt;

const REDACTED: &str = "<redacted>";

/// Hex-encoded private key
///
/// `Debug`, `Display` and `Serialize` all render `<redacted>`; the key is
/// only reachable through [`SecretKey::expose`].
///
/// ```
/// use bridge_relayer::redact::SecretKey;
///
/// let key = SecretKey::new("0x4c0883a69102937d6231471b5dbb6204fe512961708279f8b1a3b8e6f1d2e3a4");
/// assert_eq!(format!("{:?}", key), "<redacted>");
/// assert!(key.expose().starts_with("0x4c08"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(String);

impl SecretKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl Serialize for SecretKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_key_never_rendered() {
        let key = SecretKey::new("0xdeadbeef");
        assert_eq!(format!("{:?}", key), "<redacted>");
        assert_eq!(key.to_string(), "<redacted>");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"<redacted>\"");
        assert_eq!(key.expose(), "0xdeadbeef");
    }

    #[test]
    fn test_secret_key_in_derived_debug() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Holder {
            key: Option<SecretKey>,
        }
        let rendered = format!("{:?}", Holder { key: Some(SecretKey::new("0xfeed")) });
        assert!(!rendered.contains("feed"));
    }
}
