//! HS256 session tokens.
//!
//! A token's `sub` claim is the user's database ID. Tokens carry an `exp`
//! claim and are rejected once it has passed.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::AccountError;

/// Claims carried by a DevFlow session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The user ID, as a decimal string.
    pub sub: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

/// Issues and verifies session tokens with a shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Creates a token service signing with `secret`; tokens live `ttl_secs`.
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        }
    }

    /// Issues a token for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::TokenSigning` if encoding fails.
    pub fn issue(&self, user_id: i64) -> Result<String, AccountError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AccountError::TokenSigning(e.to_string()))
    }

    /// Verifies a token and returns the user ID it was issued for.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidToken` for bad signatures, expired
    /// tokens, or a non-numeric subject.
    pub fn verify(&self, token: &str) -> Result<i64, AccountError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|e| AccountError::InvalidToken(e.to_string()))?;
        data.claims
            .sub
            .parse()
            .map_err(|_| AccountError::InvalidToken("subject is not a user id".to_string()))
    }
}
