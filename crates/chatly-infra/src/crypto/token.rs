//! HMAC-SHA256 signed session tokens.
//!
//! Token format: `base64url(claims_json) "." base64url(hmac_sha256(payload))`,
//! both parts unpadded. The signature covers the encoded payload, so the
//! payload is never parsed before the signature checks out.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use chatly_core::auth::TokenIssuer;
use chatly_types::error::AuthError;
use chatly_types::identity::{AuthenticatedIdentity, IssuedToken, TokenClaims};

type HmacSha256 = Hmac<Sha256>;

/// Lowercase hex SHA-256 of a token. Blacklists store this, not the token.
pub fn token_digest(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// The configured token lifetime can't be represented as an expiry date.
#[derive(Debug, thiserror::Error)]
#[error("token_ttl_secs = {0} is out of range")]
pub struct TtlOutOfRange(pub u64);

pub struct HmacTokenIssuer {
    secret: SecretString,
    validity: Duration,
}

impl HmacTokenIssuer {
    pub fn new(secret: SecretString, ttl_secs: u64) -> Result<Self, TtlOutOfRange> {
        let validity = i64::try_from(ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .filter(|validity| Utc::now().checked_add_signed(*validity).is_some())
            .ok_or(TtlOutOfRange(ttl_secs))?;

        Ok(Self { secret, validity })
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        // HMAC accepts keys of any length; this only fails on a broken build
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| AuthError::Hashing)
    }

    fn sign(&self, payload: &str) -> Result<String, AuthError> {
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }
}

impl TokenIssuer for HmacTokenIssuer {
    fn issue(&self, identity: &AuthenticatedIdentity) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.validity)
            .ok_or(AuthError::Hashing)?;
        let claims = TokenClaims {
            sub: identity.id,
            username: identity.username.clone(),
            email: identity.email.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::now_v7(),
        };

        let json = serde_json::to_vec(&claims).map_err(|_| AuthError::Hashing)?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = self.sign(&payload)?;

        Ok(IssuedToken {
            token: format!("{payload}.{signature}"),
            expires_at,
        })
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let (payload, signature) = token.split_once('.').ok_or(AuthError::InvalidToken)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::InvalidToken)?;
        let claims: TokenClaims =
            serde_json::from_slice(&json).map_err(|_| AuthError::InvalidToken)?;

        if claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }

    fn validity(&self) -> Duration {
        self.validity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer(secret: &str, ttl_secs: u64) -> HmacTokenIssuer {
        HmacTokenIssuer::new(SecretString::from(secret.to_string()), ttl_secs).unwrap()
    }

    fn identity() -> AuthenticatedIdentity {
        AuthenticatedIdentity {
            id: Uuid::now_v7(),
            username: "asha".to_string(),
            email: "asha@example.com".to_string(),
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = issuer("test-secret", 86_400);
        let user = identity();
        let issued = issuer.issue(&user).unwrap();

        let claims = issuer.verify(&issued.token).unwrap();
        assert_eq!(claims.identity(), user);
        assert_eq!(claims.exp - claims.iat, 86_400);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn test_tokens_are_unique() {
        let issuer = issuer("test-secret", 60);
        let user = identity();
        let a = issuer.issue(&user).unwrap().token;
        let b = issuer.issue(&user).unwrap().token;
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issuer("secret-a", 60).issue(&identity()).unwrap().token;
        let err = issuer("secret-b", 60).verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let issuer = issuer("test-secret", 60);
        let token = issuer.issue(&identity()).unwrap().token;
        let (_, signature) = token.split_once('.').unwrap();

        let forged = TokenClaims {
            sub: Uuid::now_v7(),
            username: "mallory".to_string(),
            email: "m@example.com".to_string(),
            iat: 0,
            exp: i64::MAX,
            jti: Uuid::now_v7(),
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());

        let err = issuer.verify(&format!("{payload}.{signature}")).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = issuer("test-secret", 0);
        let token = issuer.issue(&identity()).unwrap().token;
        assert!(matches!(
            issuer.verify(&token).unwrap_err(),
            AuthError::InvalidToken
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        let issuer = issuer("test-secret", 60);
        for token in ["", "no-dot", "a.b", "!!!.???"] {
            assert!(issuer.verify(token).is_err(), "accepted {token:?}");
        }
    }

    #[test]
    fn test_unrepresentable_ttl_is_an_error() {
        for ttl_secs in [u64::MAX, i64::MAX as u64, (i64::MAX / 1000) as u64 + 1] {
            let result = HmacTokenIssuer::new(SecretString::from("s".to_string()), ttl_secs);
            assert!(result.is_err(), "accepted ttl {ttl_secs}");
        }

        let err = HmacTokenIssuer::new(SecretString::from("s".to_string()), u64::MAX)
            .err()
            .unwrap();
        assert_eq!(
            err.to_string(),
            format!("token_ttl_secs = {} is out of range", u64::MAX)
        );
    }

    #[test]
    fn test_long_ttl_within_range_is_accepted() {
        // Ten years
        let issuer = issuer("test-secret", 10 * 365 * 86_400);
        let issued = issuer.issue(&identity()).unwrap();
        assert!(issued.expires_at > Utc::now() + Duration::days(3649));
    }

    #[test]
    fn test_token_digest_is_hex_sha256() {
        assert_eq!(
            token_digest(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
