//! API key table (constant-time compare) and the captcha-path session token.
//!
//! Built on `hmac`/`sha2`/`subtle`: HMAC-SHA256 signs the session token,
//! and `subtle`'s constant-time equality keeps both checks free of
//! timing side channels.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::ApiConfig;

type HmacSha256 = Hmac<Sha256>;

/// Constant-time membership check against the configured key set.
///
/// Spec §4.8 step 2: header presence and set membership are distinguished
/// (`API_KEY_REQUIRED` vs `API_KEY_INVALID`); this function only answers the
/// membership question.
#[must_use]
pub fn is_valid_api_key(config: &ApiConfig, candidate: &str) -> bool {
    config
        .keys
        .iter()
        .any(|key| key.as_bytes().ct_eq(candidate.as_bytes()).into())
}

/// Mint a short-lived session token from an already-verified third-party
/// captcha result. This is the *entire* captcha surface per spec's
/// Non-goals — no challenge issuance or verification happens here.
pub struct SessionTokens {
    secret: Vec<u8>,
    ttl: std::time::Duration,
}

impl SessionTokens {
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>, ttl: std::time::Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    /// Mint `"{expires_at_unix}.{hex_mac}"` binding the expiry to the subject
    /// via HMAC-SHA256; the subject is typically an opaque verification id.
    #[must_use]
    pub fn mint(&self, subject: &str) -> String {
        let expires_at = (chrono::Utc::now() + self.ttl).timestamp();
        let payload = format!("{subject}.{expires_at}");
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(payload.as_bytes());
        let tag = hex::encode(mac.finalize().into_bytes());
        format!("{expires_at}.{tag}")
    }

    /// Verify a token minted by `mint` for the same subject, and that it has
    /// not expired.
    #[must_use]
    pub fn verify(&self, subject: &str, token: &str) -> bool {
        let Some((expires_at_str, tag)) = token.split_once('.') else {
            return false;
        };
        let Ok(expires_at) = expires_at_str.parse::<i64>() else {
            return false;
        };
        if expires_at < chrono::Utc::now().timestamp() {
            return false;
        }
        let payload = format!("{subject}.{expires_at}");
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(payload.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());
        expected.as_bytes().ct_eq(tag.as_bytes()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_key_matches() {
        let config = ApiConfig {
            enabled: true,
            keys: vec!["secret-1".to_string(), "secret-2".to_string()],
        };
        assert!(is_valid_api_key(&config, "secret-2"));
        assert!(!is_valid_api_key(&config, "nope"));
    }

    #[test]
    fn session_token_round_trips() {
        let tokens = SessionTokens::new(b"test-secret".to_vec(), std::time::Duration::from_secs(60));
        let token = tokens.mint("verification-123");
        assert!(tokens.verify("verification-123", &token));
        assert!(!tokens.verify("other-subject", &token));
    }

    #[test]
    fn expired_session_token_rejected() {
        let tokens = SessionTokens::new(b"test-secret".to_vec(), std::time::Duration::from_secs(0));
        let token = tokens.mint("verification-123");
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert!(!tokens.verify("verification-123", &token));
    }
}
