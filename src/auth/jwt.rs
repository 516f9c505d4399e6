// JWT token creation and verification
// Bearer tokens identify the caller; the e-mail claim is used to claim invites

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Token lifetime in hours
pub const TOKEN_TTL_HOURS: i64 = 8;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),

    #[error("{0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// JWT claims structure
///
/// # Fields
/// * `sub` - Subject (user_id)
/// * `email` - Verified e-mail address, when the issuer knows it
/// * `exp` - Expiry time (seconds since epoch)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: usize,
}

/// Creates a signed token for a user
///
/// # Token Properties
/// - Expires after [`TOKEN_TTL_HOURS`]
/// - Signed with HS256 algorithm
///
/// # Example
/// ```
/// use prompt_teams_api::auth::jwt::{create_token, verify_token};
/// use uuid::Uuid;
///
/// let user_id = Uuid::new_v4();
/// let token = create_token(user_id, Some("bob@example.com"), "secret").expect("valid token");
///
/// let claims = verify_token(&token, "secret").expect("valid token");
/// assert_eq!(claims.sub, user_id);
/// assert_eq!(claims.email.as_deref(), Some("bob@example.com"));
/// ```
pub fn create_token(user_id: Uuid, email: Option<&str>, secret: &str) -> Result<String, TokenError> {
    let expiry = Utc::now() + Duration::hours(TOKEN_TTL_HOURS);
    let claims = Claims {
        sub: user_id,
        email: email.map(str::to_string),
        exp: expiry.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(TokenError::Encode)
}

/// Verifies signature and expiry and returns the claims
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(TokenError::Invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-for-unit-tests";

    #[test]
    fn token_round_trips_subject_and_email() {
        let user_id = Uuid::new_v4();
        let token = create_token(user_id, Some("a@b.c"), TEST_SECRET).expect("valid token");

        let claims = verify_token(&token, TEST_SECRET).expect("valid verification");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn email_claim_is_optional() {
        let token = create_token(Uuid::new_v4(), None, TEST_SECRET).expect("valid token");

        let claims = verify_token(&token, TEST_SECRET).expect("valid verification");
        assert!(claims.email.is_none());
    }

    #[test]
    fn wrong_secret_fails() {
        let token = create_token(Uuid::new_v4(), None, TEST_SECRET).expect("valid token");

        let result = verify_token(&token, "wrong-secret");
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn invalid_token_fails() {
        let result = verify_token("invalid.token.string", TEST_SECRET);
        assert!(result.is_err());
    }

    #[test]
    fn token_expiry_set() {
        let token = create_token(Uuid::new_v4(), None, TEST_SECRET).expect("valid token");

        let claims = verify_token(&token, TEST_SECRET).expect("valid verification");
        let expiry_time = claims.exp as i64;
        let now = Utc::now().timestamp();
        let latest = (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp();

        assert!(expiry_time > now);
        assert!(expiry_time <= latest + 10);
    }
}
