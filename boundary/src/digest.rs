//! One-way digests of write-only secrets

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `secret`
pub fn secret_digest(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_and_fixed_length() {
        let digest = secret_digest("hunter22");
        assert_eq!(digest, secret_digest("hunter22"));
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(digest, secret_digest("hunter23"));
    }

    #[test]
    fn matches_known_vector() {
        assert_eq!(
            secret_digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
