//! Session credentials — an explicit value type verified by one pure
//! function, independent of how the token travels. Transport is the
//! `Authorization: Bearer` header only.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::Role;

pub const SESSION_TTL_HOURS: i64 = 24;

/// An authenticated identity, valid until `expires_at`.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    role: Role,
    exp: i64,
}

/// Issues a signed token for the user, expiring in 24 hours.
pub fn issue_token(
    user_id: Uuid,
    role: Role,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = Utc::now() + Duration::hours(SESSION_TTL_HOURS);
    let claims = Claims {
        sub: user_id,
        role,
        exp: exp.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Decodes and verifies a token. Any failure — malformed input, bad
/// signature, expiry — yields `None`: the caller is simply unauthenticated,
/// never a server error.
pub fn verify_token(token: &str, secret: &str) -> Option<Session> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()?;
    Some(Session {
        user_id: data.claims.sub,
        role: data.claims.role,
        expires_at: Utc.timestamp_opt(data.claims.exp, 0).single()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-signing-key";

    #[test]
    fn test_token_round_trip() {
        let id = Uuid::new_v4();
        let token = issue_token(id, Role::Admin, SECRET).unwrap();
        let session = verify_token(&token, SECRET).unwrap();
        assert_eq!(session.user_id, id);
        assert_eq!(session.role, Role::Admin);
        assert!(session.expires_at > Utc::now());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = issue_token(Uuid::new_v4(), Role::User, SECRET).unwrap();
        assert!(verify_token(&token, "another-key").is_none());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(verify_token("not.a.jwt", SECRET).is_none());
        assert!(verify_token("", SECRET).is_none());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            role: Role::User,
            exp: (Utc::now() - Duration::hours(2)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(verify_token(&token, SECRET).is_none());
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let token = issue_token(Uuid::new_v4(), Role::User, SECRET).unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });
        assert!(verify_token(&tampered, SECRET).is_none());
    }
}
