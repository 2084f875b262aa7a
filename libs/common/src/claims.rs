//! Local verification of provider-issued access tokens
//!
//! When the project's JWT secret is configured the access token can be checked
//! without a round trip to the auth endpoint. Without it the caller falls back
//! to `AuthApi::get_user`.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::AuthUser;

/// Audience the provider stamps on user access tokens
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User ID
    pub sub: Uuid,
    /// User email, when the identity provider shared it
    #[serde(default)]
    pub email: Option<String>,
    /// Expiration time
    pub exp: u64,
    /// Audience
    pub aud: String,
}

/// Outcome of a failed local verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    /// Signature and shape were fine but the token has expired
    Expired,
    /// Anything else: bad signature, wrong audience, garbage
    Invalid,
}

/// HS256 verifier for access tokens
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Initialize a verifier from the project's JWT secret
    pub fn from_secret(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_audience(&[AUTHENTICATED_AUDIENCE]);

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Validate a token and return the user it was issued to
    pub fn verify(&self, token: &str) -> Result<AuthUser, TokenRejection> {
        let data = decode::<AccessClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenRejection::Expired,
                _ => TokenRejection::Invalid,
            },
        )?;

        Ok(AuthUser {
            id: data.claims.sub,
            email: data.claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::time::{SystemTime, UNIX_EPOCH};

    const SECRET: &str = "super-secret-jwt-token-with-at-least-32-characters";

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn token(exp: u64, aud: &str, secret: &str) -> (Uuid, String) {
        let sub = Uuid::new_v4();
        let claims = AccessClaims {
            sub,
            email: Some("rater@example.com".to_string()),
            exp,
            aud: aud.to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();
        (sub, token)
    }

    #[test]
    fn accepts_fresh_token() {
        let verifier = TokenVerifier::from_secret(SECRET);
        let (sub, token) = token(now() + 3600, AUTHENTICATED_AUDIENCE, SECRET);

        let user = verifier.verify(&token).unwrap();
        assert_eq!(user.id, sub);
        assert_eq!(user.email.as_deref(), Some("rater@example.com"));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let verifier = TokenVerifier::from_secret(SECRET);
        let (_, token) = token(now() - 3600, AUTHENTICATED_AUDIENCE, SECRET);

        assert_eq!(verifier.verify(&token), Err(TokenRejection::Expired));
    }

    #[test]
    fn wrong_secret_or_audience_is_invalid() {
        let verifier = TokenVerifier::from_secret(SECRET);

        let (_, forged) = token(now() + 3600, AUTHENTICATED_AUDIENCE, "another-secret-value");
        assert_eq!(verifier.verify(&forged), Err(TokenRejection::Invalid));

        let (_, anon) = token(now() + 3600, "anon", SECRET);
        assert_eq!(verifier.verify(&anon), Err(TokenRejection::Invalid));

        assert_eq!(verifier.verify("not-a-jwt"), Err(TokenRejection::Invalid));
    }
}
