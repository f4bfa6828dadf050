//! Request signing and credential hashing.
//!
//! Every call except the handshake carries an `api_sig` field. The remote
//! recomputes it from the values it issued during the handshake plus the
//! shared API key, so the concatenation order below must not change: a
//! permuted input produces a valid-looking signature that the remote
//! rejects on every call.

use md5::{Digest, Md5};

/// Length of a hex-encoded signature.
pub const SIGNATURE_HEX_LENGTH: usize = 32;

/// Hashes `input` and returns the lower-case hex digest.
pub fn md5_hex(input: &str) -> String {
    hex::encode(Md5::digest(input.as_bytes()))
}

/// Computes the request signature for a signed call.
///
/// The digest covers `access_token + client_id + secret + api_key`, in
/// exactly that order.
pub fn sign(access_token: &str, client_id: &str, secret: &str, api_key: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(access_token.as_bytes());
    hasher.update(client_id.as_bytes());
    hasher.update(secret.as_bytes());
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hashes a clear-text password the way the login form expects it.
///
/// Passwords never leave the client in clear text.
pub fn hash_password(password: &str) -> String {
    md5_hex(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_md5_hex_known_vectors() {
        assert_eq!(md5_hex(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(md5_hex("abc"), "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(md5_hex("password"), "5f4dcc3b5aa765d61d8327deb882cf99");
    }

    #[test]
    fn test_sign_matches_concatenation() {
        let signature = sign("tok", "cid", "sec", "key");
        assert_eq!(signature, md5_hex("tokcidseckey"));
        assert_eq!(signature.len(), SIGNATURE_HEX_LENGTH);
    }

    #[test]
    fn test_sign_is_deterministic() {
        assert_eq!(
            sign("tok", "cid", "sec", "key"),
            sign("tok", "cid", "sec", "key")
        );
    }

    #[test]
    fn test_sign_changes_with_each_input() {
        let base = sign("tok", "cid", "sec", "key");
        assert_ne!(base, sign("tok2", "cid", "sec", "key"));
        assert_ne!(base, sign("tok", "cid2", "sec", "key"));
        assert_ne!(base, sign("tok", "cid", "sec2", "key"));
        assert_ne!(base, sign("tok", "cid", "sec", "key2"));
    }

    #[test]
    fn test_sign_is_order_sensitive() {
        assert_ne!(
            sign("tok", "cid", "sec", "key"),
            sign("cid", "tok", "sec", "key")
        );
    }

    #[test]
    fn test_hash_password() {
        assert_eq!(hash_password("password"), "5f4dcc3b5aa765d61d8327deb882cf99");
        assert_eq!(hash_password("pw"), md5_hex("pw"));
    }
}
