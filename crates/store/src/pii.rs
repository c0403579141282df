//! Reversible field-level PII protection.
//!
//! Display names and addresses are encrypted before they reach the store and
//! decrypted on authorized reads. Tokens are Fernet (AES-128-CBC + HMAC), so
//! a truncated or tampered ciphertext fails authentication instead of
//! decrypting to garbage.
//!
//! Every stored token is prefixed with the id of the key that produced it
//! (`k1:gAAAAA...`). The keyring is provisioned from `PII_KEYS`; `encrypt`
//! always uses the first (primary) key, `decrypt` accepts any key in the
//! ring, so rotation is: add the new key at the front, keep the old one
//! until the last row written under it is gone.

use std::sync::Arc;

use fernet::Fernet;
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::PiiKeyConfig;

/// Errors from the PII cipher.
#[derive(Debug, Error)]
pub enum PiiError {
    /// The keyring is empty.
    #[error("no PII keys configured")]
    NoKeys,

    /// A configured key is not a valid Fernet key.
    #[error("PII key '{0}' is not a valid base64 Fernet key")]
    InvalidKey(String),

    /// The token references a key id that is not in the keyring.
    #[error("ciphertext references unknown PII key '{0}'")]
    UnknownKey(String),

    /// The token is malformed, truncated, or fails authentication.
    #[error("PII decryption failed")]
    DecryptionFailure,
}

/// Keyed, reversible cipher for PII fields.
///
/// Cheaply cloneable; the keyring is shared behind an `Arc`.
#[derive(Clone)]
pub struct PiiCipher {
    inner: Arc<Keyring>,
}

struct Keyring {
    /// Key used for every encryption.
    primary: (String, Fernet),
    /// Older keys still accepted for decryption.
    retired: Vec<(String, Fernet)>,
}

impl PiiCipher {
    /// Build a cipher from the provisioned keyring, primary key first.
    ///
    /// # Errors
    ///
    /// Returns [`PiiError::NoKeys`] for an empty keyring and
    /// [`PiiError::InvalidKey`] if any entry is not a valid Fernet key.
    pub fn from_config(keys: &[PiiKeyConfig]) -> Result<Self, PiiError> {
        let mut entries = keys.iter();
        let primary = entries.next().ok_or(PiiError::NoKeys)?;
        let primary = (primary.id.clone(), build_fernet(primary)?);

        let mut retired = Vec::new();
        for entry in entries {
            retired.push((entry.id.clone(), build_fernet(entry)?));
        }

        Ok(Self {
            inner: Arc::new(Keyring { primary, retired }),
        })
    }

    /// Encrypt a PII field value with the primary key.
    ///
    /// The result is `"{key_id}:{fernet_token}"`, safe to store as TEXT.
    #[must_use]
    pub fn encrypt(&self, plaintext: &str) -> String {
        let (id, fernet) = &self.inner.primary;
        format!("{id}:{}", fernet.encrypt(plaintext.as_bytes()))
    }

    /// Decrypt a stored PII token.
    ///
    /// # Errors
    ///
    /// Returns [`PiiError::DecryptionFailure`] if the token is malformed or
    /// fails authentication, and [`PiiError::UnknownKey`] if it was written
    /// under a key that is no longer provisioned.
    pub fn decrypt(&self, stored: &str) -> Result<String, PiiError> {
        let (key_id, token) = stored.split_once(':').ok_or(PiiError::DecryptionFailure)?;

        let fernet = self
            .key(key_id)
            .ok_or_else(|| PiiError::UnknownKey(key_id.to_owned()))?;

        let plaintext = fernet
            .decrypt(token)
            .map_err(|_| PiiError::DecryptionFailure)?;

        String::from_utf8(plaintext).map_err(|_| PiiError::DecryptionFailure)
    }

    fn key(&self, key_id: &str) -> Option<&Fernet> {
        let (primary_id, primary) = &self.inner.primary;
        if primary_id == key_id {
            return Some(primary);
        }
        self.inner
            .retired
            .iter()
            .find(|(id, _)| id == key_id)
            .map(|(_, fernet)| fernet)
    }
}

fn build_fernet(entry: &PiiKeyConfig) -> Result<Fernet, PiiError> {
    Fernet::new(entry.key.expose_secret()).ok_or_else(|| PiiError::InvalidKey(entry.id.clone()))
}

impl std::fmt::Debug for PiiCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids = vec![self.inner.primary.0.as_str()];
        ids.extend(self.inner.retired.iter().map(|(id, _)| id.as_str()));
        f.debug_struct("PiiCipher").field("keys", &ids).finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn key_config(id: &str, key: String) -> PiiKeyConfig {
        PiiKeyConfig {
            id: id.to_owned(),
            key: SecretString::from(key),
        }
    }

    fn cipher_with_one_key() -> PiiCipher {
        PiiCipher::from_config(&[key_config("k1", Fernet::generate_key())]).unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let cipher = cipher_with_one_key();
        for value in ["Maya Quintero", "12 Rue des Lilas, Lyon", "日本語", "a"] {
            let token = cipher.encrypt(value);
            assert_ne!(token, value);
            assert_eq!(cipher.decrypt(&token).unwrap(), value);
        }
    }

    #[test]
    fn test_roundtrip_empty_string() {
        let cipher = cipher_with_one_key();
        let token = cipher.encrypt("");
        assert_eq!(cipher.decrypt(&token).unwrap(), "");
    }

    #[test]
    fn test_roundtrip_separator_characters() {
        // Values containing the internal key-id separator must survive.
        let cipher = cipher_with_one_key();
        for value in [":", "k1:", "a:b:c", "k1:gAAAAA"] {
            let token = cipher.encrypt(value);
            assert_eq!(cipher.decrypt(&token).unwrap(), value);
        }
    }

    #[test]
    fn test_token_carries_key_id() {
        let cipher = cipher_with_one_key();
        assert!(cipher.encrypt("x").starts_with("k1:"));
    }

    #[test]
    fn test_decrypt_rejects_tampering() {
        let cipher = cipher_with_one_key();
        let token = cipher.encrypt("sensitive");

        // Flip a character near the end of the token body
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });
        assert!(matches!(
            cipher.decrypt(&tampered),
            Err(PiiError::DecryptionFailure)
        ));

        // Truncation
        let mut truncated = token;
        truncated.truncate(truncated.len() / 2);
        assert!(cipher.decrypt(&truncated).is_err());
    }

    #[test]
    fn test_decrypt_rejects_missing_key_id() {
        let cipher = cipher_with_one_key();
        assert!(matches!(
            cipher.decrypt("no-separator-token"),
            Err(PiiError::DecryptionFailure)
        ));
    }

    #[test]
    fn test_decrypt_unknown_key_id() {
        let cipher = cipher_with_one_key();
        let token = cipher.encrypt("x");
        let body = token.split_once(':').unwrap().1;
        assert!(matches!(
            cipher.decrypt(&format!("k9:{body}")),
            Err(PiiError::UnknownKey(id)) if id == "k9"
        ));
    }

    #[test]
    fn test_rotation_decrypts_old_tokens() {
        let old_key = Fernet::generate_key();
        let old = PiiCipher::from_config(&[key_config("k1", old_key.clone())]).unwrap();
        let token = old.encrypt("carried over");

        // New primary key added at the front; old key retained for reads.
        let rotated = PiiCipher::from_config(&[
            key_config("k2", Fernet::generate_key()),
            key_config("k1", old_key),
        ])
        .unwrap();

        assert_eq!(rotated.decrypt(&token).unwrap(), "carried over");
        assert!(rotated.encrypt("fresh").starts_with("k2:"));
    }

    #[test]
    fn test_rejects_invalid_key_material() {
        let result = PiiCipher::from_config(&[key_config("k1", "not base64!!".to_owned())]);
        assert!(matches!(result, Err(PiiError::InvalidKey(id)) if id == "k1"));
    }

    #[test]
    fn test_rejects_empty_keyring() {
        assert!(matches!(PiiCipher::from_config(&[]), Err(PiiError::NoKeys)));
    }
}
