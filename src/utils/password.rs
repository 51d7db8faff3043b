//! Password hashing and verification.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHashString, PasswordVerifier, SaltString},
    Argon2, PasswordHasher,
};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

static DEFAULT_HASHER: Lazy<Argon2<'static>> = Lazy::new(Argon2::default);

/// Hash of the empty password, verified against when the account does not
/// exist so that lookups and misses take comparable time.
static EMPTY_HASH: Lazy<PwHash> = Lazy::new(|| hash(""));

/// A salted Argon2id password hash.
#[derive(Clone)]
pub struct PwHash(PasswordHashString);

impl fmt::Debug for PwHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never leak hash material into logs
        f.write_str("PwHash(..)")
    }
}

impl Serialize for PwHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_str().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PwHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let hash = PasswordHashString::from_str(&s)
            .map_err(|_| <D::Error as serde::de::Error>::custom("Invalid PHC string"))?;
        Ok(PwHash(hash))
    }
}

/// Hashes a cleartext password with a freshly generated salt.
pub fn hash(password: &str) -> PwHash {
    let salt = SaltString::generate(&mut OsRng);

    let hash = DEFAULT_HASHER
        .hash_password(password.as_bytes(), &salt)
        .expect("Argon2 hashing cannot fail with default parameters")
        .serialize();

    PwHash(hash)
}

/// Verifies a password against a stored hash.
///
/// When no hash is available (unknown email), the check still runs against
/// a decoy hash to keep the timing profile flat.
pub fn verify(password: &str, maybe_hash: Option<&PwHash>) -> bool {
    let hash = maybe_hash.unwrap_or(&EMPTY_HASH);

    DEFAULT_HASHER
        .verify_password(password.as_bytes(), &hash.0.password_hash())
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let h = hash("correct horse battery staple");
        assert!(verify("correct horse battery staple", Some(&h)));
        assert!(!verify("correct horse battery", Some(&h)));
    }

    #[test]
    fn missing_hash_never_verifies_nonempty_password() {
        assert!(!verify("anything", None));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash("same password");
        let b = hash("same password");
        assert_ne!(
            serde_yaml::to_string(&a).unwrap(),
            serde_yaml::to_string(&b).unwrap()
        );
    }
}
