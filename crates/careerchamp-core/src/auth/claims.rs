//! Token decoding and validity checks.
//!
//! Tokens are decoded for their payload only. The signature is not verified
//! and no key is configured: the backend is the authority on authenticity,
//! this module only answers "is it well formed and unexpired right now".

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("token is empty")]
    Empty,

    #[error("malformed token: {0}")]
    Malformed(#[from] jsonwebtoken::errors::Error),

    #[error("token is missing the `{0}` claim")]
    MissingClaim(&'static str),
}

/// Decoded token payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Claims {
    /// Subject: the backend's user id, as a string
    pub sub: String,
    /// Expiry as whole seconds since the Unix epoch. A fractional `exp` in the
    /// token is rounded down.
    pub exp: i64,
    /// Every other payload field, kept as-is
    #[serde(flatten)]
    #[cfg_attr(feature = "ts", ts(skip))]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Claims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Expired at or before `now`. No leeway is applied.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }

    /// Seconds left before expiry, clamped at zero.
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.exp - now.timestamp()).max(0)
    }
}

/// Payload as it appears in the token, before required claims are checked.
#[derive(Deserialize)]
struct RawClaims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    exp: Option<serde_json::Number>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl RawClaims {
    fn into_claims(self) -> Result<Claims, DecodeError> {
        let sub = self
            .sub
            .filter(|sub| !sub.is_empty())
            .ok_or(DecodeError::MissingClaim("sub"))?;
        let exp = self
            .exp
            .and_then(|n| n.as_i64().or_else(|| n.as_f64().map(|f| f.floor() as i64)))
            .ok_or(DecodeError::MissingClaim("exp"))?;
        Ok(Claims {
            sub,
            exp,
            extra: self.extra,
        })
    }
}

fn payload_only_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    // `sub` and `exp` are checked in `RawClaims::into_claims`, expiry against
    // the caller's clock in `validate_at`
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation
}

/// Decode a token's payload without checking expiry or signature.
pub fn decode_claims(token: &str) -> Result<Claims, DecodeError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(DecodeError::Empty);
    }

    let data = decode::<RawClaims>(
        token,
        &DecodingKey::from_secret(&[]),
        &payload_only_validation(),
    )?;
    data.claims.into_claims()
}

/// Check a token against an explicit reference instant.
pub fn validate_at(token: &str, now: DateTime<Utc>) -> bool {
    match decode_claims(token) {
        Ok(claims) => !claims.is_expired_at(now),
        Err(_) => false,
    }
}

/// Check that a token is well formed, carries `sub` and `exp`, and has not
/// expired according to the local wall clock.
pub fn validate(token: &str) -> bool {
    validate_at(token, Utc::now())
}

#[cfg(test)]
pub(crate) mod test_tokens {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    /// Mint an HS256 token with `sub` and `exp`.
    pub fn token(sub: &str, exp: i64) -> String {
        raw(json!({ "sub": sub, "exp": exp }))
    }

    /// Mint an HS256 token from an arbitrary payload.
    pub fn raw(payload: serde_json::Value) -> String {
        encode(
            &Header::default(),
            &payload,
            &EncodingKey::from_secret(b"backend-secret"),
        )
        .expect("encode token")
    }
}

#[cfg(test)]
mod tests {
    use super::test_tokens::{raw, token};
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_validate_unexpired_token() {
        let now = Utc::now();
        let t = token("42", (now + Duration::seconds(3600)).timestamp());
        assert!(validate_at(&t, now));
        assert!(validate(&t));
    }

    #[test]
    fn test_validate_expired_one_second_ago() {
        let now = Utc::now();
        let t = token("42", (now - Duration::seconds(1)).timestamp());
        assert!(!validate_at(&t, now));
        assert!(!validate(&t));
    }

    #[test]
    fn test_validate_expiry_equal_to_now_is_expired() {
        let now = Utc::now();
        let t = token("42", now.timestamp());
        assert!(!validate_at(&t, now));
    }

    #[test]
    fn test_missing_required_claims() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let no_sub = raw(json!({ "exp": exp }));
        let no_exp = raw(json!({ "sub": "42" }));

        assert!(!validate(&no_sub));
        assert!(!validate(&no_exp));
        assert!(matches!(decode_claims(&no_sub), Err(DecodeError::MissingClaim("sub"))));
        assert!(matches!(decode_claims(&no_exp), Err(DecodeError::MissingClaim("exp"))));
    }

    #[test]
    fn test_empty_subject_rejected() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let t = raw(json!({ "sub": "", "exp": exp }));
        assert!(matches!(decode_claims(&t), Err(DecodeError::MissingClaim("sub"))));
    }

    #[test]
    fn test_garbage_fails_closed() {
        assert!(!validate(""));
        assert!(!validate("   "));
        assert!(!validate("not-a-token"));
        assert!(!validate("invalid.token.here"));
        assert!(matches!(decode_claims(""), Err(DecodeError::Empty)));
        assert!(matches!(
            decode_claims("invalid.token.here"),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_signature_is_not_checked() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let t = token("42", exp);
        let (unsigned, _) = t.rsplit_once('.').unwrap();
        let tampered = format!("{}.c2lnbmF0dXJl", unsigned);
        assert!(validate(&tampered));
    }

    #[test]
    fn test_extra_claims_preserved() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let t = raw(json!({ "sub": "42", "exp": exp, "name": "Ada", "role": "user" }));
        let claims = decode_claims(&t).unwrap();

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.exp, exp);
        assert_eq!(claims.extra.get("name"), Some(&json!("Ada")));
        assert_eq!(claims.extra.get("role"), Some(&json!("user")));
        assert!(!claims.extra.contains_key("sub"));
    }

    #[test]
    fn test_fractional_expiry_rounds_down() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let t = raw(json!({ "sub": "42", "exp": exp as f64 + 0.75 }));
        assert_eq!(decode_claims(&t).unwrap().exp, exp);
        assert!(validate(&t));
    }

    #[test]
    fn test_non_numeric_expiry_is_malformed() {
        let t = raw(json!({ "sub": "42", "exp": "tomorrow" }));
        assert!(matches!(decode_claims(&t), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_seconds_until_expiry_clamped() {
        let now = Utc::now();
        let claims = Claims {
            sub: "42".to_string(),
            exp: now.timestamp() - 10,
            extra: Default::default(),
        };
        assert_eq!(claims.seconds_until_expiry(now), 0);
        assert!(claims.is_expired_at(now));
    }
}
