use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Checks a hex HMAC-SHA256 signature of `body`. An empty secret never
/// verifies, so an unconfigured deployment rejects every notification.
pub fn verify_signature(body: &[u8], signature_hex: &str, secret: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
pub fn sign(body: &[u8], secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts keys of any length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time token comparison over SHA-256 digests.
pub fn tokens_match(given: &str, expected: &str) -> bool {
    let a = Sha256::digest(given.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = br#"{"list_folder":{"accounts":["dbid:1"]}}"#;

    #[test]
    fn valid_signature_verifies() {
        let sig = sign(BODY, "s3cret");
        assert!(verify_signature(BODY, &sig, "s3cret"));
        assert!(verify_signature(BODY, &sig.to_uppercase(), "s3cret"));
    }

    #[test]
    fn any_body_change_fails() {
        let sig = sign(BODY, "s3cret");
        let mut tampered = BODY.to_vec();
        tampered[3] ^= 1;
        assert!(!verify_signature(&tampered, &sig, "s3cret"));
        assert!(!verify_signature(BODY, &sig, "other"));
    }

    #[test]
    fn malformed_or_missing_input_fails() {
        assert!(!verify_signature(BODY, "not hex", "s3cret"));
        assert!(!verify_signature(BODY, "", "s3cret"));
        assert!(!verify_signature(BODY, &sign(BODY, ""), ""));
    }

    #[test]
    fn token_comparison() {
        assert!(tokens_match("abc", "abc"));
        assert!(!tokens_match("abc", "abd"));
        assert!(!tokens_match("", "abc"));
    }
}
