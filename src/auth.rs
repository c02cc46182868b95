/// Token gate for subscriber connections
///
/// Stateless validation of the bearer credential carried by a `/stream`
/// upgrade request. The credential is taken from the `token` query parameter
/// first, falling back to an `Authorization: Bearer <token>` header. Tokens
/// are HS256-signed, time-bounded JWTs verified against the configured
/// secret. The decoded claims are opaque to the rest of the relay; admission
/// only requires that validation succeeded.
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no bearer credential presented")]
    MissingCredential,

    #[error("invalid bearer credential: {0}")]
    InvalidCredential(String),
}

/// Decoded token claims. Only `exp` is required; everything else is carried
/// through untouched for logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    pub exp: usize,
    #[serde(default)]
    pub iat: Option<usize>,
}

/// Extract the credential from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Validate a subscriber credential.
///
/// `query_token` wins over the header credential when both are present.
/// Absence of both, expiry, malformation, or a bad signature all reject.
pub fn authenticate(
    query_token: Option<&str>,
    header_token: Option<&str>,
    secret: &str,
) -> Result<Claims, AuthError> {
    let token = query_token
        .filter(|t| !t.is_empty())
        .or(header_token)
        .ok_or(AuthError::MissingCredential)?;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AuthError::InvalidCredential(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn make_token(secret: &str, exp_offset_secs: i64) -> String {
        let claims = Claims {
            sub: Some("dashboard".to_string()),
            exp: (chrono::Utc::now().timestamp() + exp_offset_secs) as usize,
            iat: Some(chrono::Utc::now().timestamp() as usize),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token_via_query_param() {
        let token = make_token(SECRET, 3600);
        let claims = authenticate(Some(&token), None, SECRET).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("dashboard"));
    }

    #[test]
    fn test_valid_token_via_bearer_header() {
        let token = make_token(SECRET, 3600);
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        let header_token = bearer_token(&headers);
        assert!(authenticate(None, header_token, SECRET).is_ok());
    }

    #[test]
    fn test_missing_credential_rejected() {
        assert!(matches!(
            authenticate(None, None, SECRET),
            Err(AuthError::MissingCredential)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        // Past the default validation leeway.
        let token = make_token(SECRET, -3600);
        assert!(matches!(
            authenticate(Some(&token), None, SECRET),
            Err(AuthError::InvalidCredential(_))
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = make_token("other-secret", 3600);
        assert!(matches!(
            authenticate(Some(&token), None, SECRET),
            Err(AuthError::InvalidCredential(_))
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(matches!(
            authenticate(Some("not-a-jwt"), None, SECRET),
            Err(AuthError::InvalidCredential(_))
        ));
    }

    #[test]
    fn test_bearer_header_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(bearer_token(&headers), None);
    }
}
