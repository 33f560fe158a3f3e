//! Client-side inspection of bearer tokens.
//!
//! The client holds no signing key, so claims are read without signature
//! validation and only ever used to skip a doomed network round trip.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;

use crate::session::CredentialToken;

#[derive(Debug, Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// Expiry encoded in the token's `exp` claim, `None` for opaque tokens
pub fn expiry(token: &CredentialToken) -> Option<DateTime<Utc>> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<Claims>(token.expose(), &DecodingKey::from_secret(&[]), &validation).ok()?;
    DateTime::from_timestamp(data.claims.exp?, 0)
}

/// True only when the token carries an `exp` claim in the past
pub fn is_expired(token: &CredentialToken, now: DateTime<Utc>) -> bool {
    expiry(token).is_some_and(|exp| exp <= now)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        exp: i64,
    }

    /// Signs a token the way the API does, with a key the client never sees
    pub(crate) fn signed_token(exp: DateTime<Utc>) -> CredentialToken {
        let claims = TestClaims {
            sub: "42".into(),
            exp: exp.timestamp(),
        };
        let jwt = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"server-side-secret"),
        )
        .unwrap();
        CredentialToken::new(jwt)
    }

    #[test]
    fn test_reads_exp_without_key() {
        let exp = Utc::now() + Duration::minutes(15);
        let token = signed_token(exp);
        assert_eq!(expiry(&token).unwrap().timestamp(), exp.timestamp());
        assert!(!is_expired(&token, Utc::now()));
    }

    #[test]
    fn test_expired_token() {
        let token = signed_token(Utc::now() - Duration::minutes(1));
        assert!(is_expired(&token, Utc::now()));
    }

    #[test]
    fn test_opaque_token_has_unknown_expiry() {
        let token = CredentialToken::new("not-a-jwt");
        assert!(expiry(&token).is_none());
        assert!(!is_expired(&token, Utc::now()));
    }
}
