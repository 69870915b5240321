//! Token issuance and verification.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::warn;

use super::config::AuthConfig;
use super::{AuthError, Claims, Identity};

/// Clock-skew leeway applied when validating expiry, in seconds.
const EXPIRY_LEEWAY_SECS: u64 = 5;

/// An access/refresh token pair.
///
/// Ephemeral: access tokens are never stored server-side, refresh tokens
/// exist server-side only as their hash.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs and verifies access and refresh tokens.
///
/// The two token classes use distinct HS256 secrets, so a token only ever
/// verifies against the class it was issued for. Issuance is a pure function
/// of identity and current time; the issuer holds no mutable state.
pub struct TokenIssuer {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenIssuer {
    /// Create an issuer from raw secrets and lifetimes.
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
    ) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    /// Create an issuer from a validated configuration.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        config
            .validate()
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        // validate() guarantees both secrets resolve.
        let access = config
            .resolve_access_secret()
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or_else(|| AuthError::Internal("access secret missing".to_string()))?;
        let refresh = config
            .resolve_refresh_secret()
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or_else(|| AuthError::Internal("refresh secret missing".to_string()))?;

        Ok(Self::new(
            &access,
            &refresh,
            config.access_ttl_secs,
            config.refresh_ttl_secs,
        ))
    }

    /// Issue a signed access/refresh pair for an identity.
    pub fn issue(&self, identity: &Identity) -> Result<TokenPair, AuthError> {
        self.issue_with_ttls(identity, self.access_ttl_secs, self.refresh_ttl_secs)
    }

    /// Issue a pair with explicit lifetimes (negative values produce tokens
    /// that are already expired).
    pub fn issue_with_ttls(
        &self,
        identity: &Identity,
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
    ) -> Result<TokenPair, AuthError> {
        let now = Utc::now().timestamp();

        let access_claims = Claims {
            sub: identity.id,
            email: identity.email.clone(),
            role: identity.role,
            iat: now,
            exp: now + access_ttl_secs,
        };
        let refresh_claims = Claims {
            exp: now + refresh_ttl_secs,
            ..access_claims.clone()
        };

        let access_token = encode(&Header::default(), &access_claims, &self.access_encoding)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        let refresh_token = encode(&Header::default(), &refresh_claims, &self.refresh_encoding)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Verify an access token and extract the identity.
    pub fn verify_access(&self, token: &str) -> Result<Identity, AuthError> {
        Self::verify(token, &self.access_decoding)
    }

    /// Verify a refresh token and extract the identity.
    ///
    /// Signature and expiry only; whether the token still matches the stored
    /// session hash is the refresh session store's concern.
    pub fn verify_refresh(&self, token: &str) -> Result<Identity, AuthError> {
        Self::verify(token, &self.refresh_decoding)
    }

    fn verify(token: &str, key: &DecodingKey) -> Result<Identity, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = EXPIRY_LEEWAY_SECS;
        validation.required_spec_claims.clear(); // No iss/aud claims issued

        let token_data = decode::<Claims>(token, key, &validation).map_err(|e| {
            warn!("token validation failed: {:?}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        Ok(token_data.claims.identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    fn test_issuer() -> TokenIssuer {
        TokenIssuer::new(
            "access-secret-for-unit-tests-minimum-32-chars",
            "refresh-secret-for-unit-tests-minimum-32-chars",
            15 * 60,
            7 * 24 * 60 * 60,
        )
    }

    fn alice() -> Identity {
        Identity {
            id: 1,
            email: "alice@x.edu".to_string(),
            role: Role::Student,
        }
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let issuer = test_issuer();
        let pair = issuer.issue(&alice()).unwrap();

        let from_access = issuer.verify_access(&pair.access_token).unwrap();
        assert_eq!(from_access, alice());

        let from_refresh = issuer.verify_refresh(&pair.refresh_token).unwrap();
        assert_eq!(from_refresh, alice());
    }

    #[test]
    fn test_tokens_do_not_cross_verify() {
        let issuer = test_issuer();
        let pair = issuer.issue(&alice()).unwrap();

        // A refresh token must not pass the access check, and vice versa.
        assert!(matches!(
            issuer.verify_access(&pair.refresh_token),
            Err(AuthError::InvalidToken(_))
        ));
        assert!(matches!(
            issuer.verify_refresh(&pair.access_token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = test_issuer();
        let other = TokenIssuer::new(
            "a-completely-different-access-secret-32-chars",
            "a-completely-different-refresh-secret-32-chars",
            15 * 60,
            7 * 24 * 60 * 60,
        );

        let pair = other.issue(&alice()).unwrap();
        assert!(matches!(
            issuer.verify_access(&pair.access_token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let issuer = test_issuer();
        assert!(matches!(
            issuer.verify_access("not.a.token"),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = test_issuer();
        // Expired well past the clock-skew leeway.
        let pair = issuer.issue_with_ttls(&alice(), -60, -60).unwrap();

        assert!(matches!(
            issuer.verify_access(&pair.access_token),
            Err(AuthError::TokenExpired)
        ));
        assert!(matches!(
            issuer.verify_refresh(&pair.refresh_token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_token_valid_just_before_expiry() {
        let issuer = test_issuer();
        let pair = issuer.issue_with_ttls(&alice(), 30, 30).unwrap();
        assert!(issuer.verify_access(&pair.access_token).is_ok());
    }

    #[test]
    fn test_leeway_absorbs_small_skew() {
        let issuer = test_issuer();
        // Nominally expired, but within the leeway window.
        let pair = issuer.issue_with_ttls(&alice(), -2, -2).unwrap();
        assert!(issuer.verify_access(&pair.access_token).is_ok());
    }
}
