use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorMessage, HttpError};

// Tokens are issued by the external identity system; the engine only
// verifies the signature and reads the subject.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

pub fn decode_token<T: Into<String>>(token: T, secret: &[u8]) -> Result<String, HttpError> {
    let decoded = decode::<TokenClaims>(
        &token.into(),
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS256),
    );

    match decoded {
        Ok(token) => Ok(token.claims.sub),
        Err(_) => Err(HttpError::unauthorized(
            ErrorMessage::InvalidToken.to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &[u8] = b"test-secret";

    fn issue_token(user_id: &str, secret: &[u8], expires_in_seconds: i64) -> String {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: user_id.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + Duration::seconds(expires_in_seconds)).timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[test]
    fn round_trips_the_user_id() {
        let token = issue_token("a17c9aaa-61f6-4b3c-a8fc-a36f2b5fd02e", SECRET, 60);
        let sub = decode_token(token, SECRET).unwrap();
        assert_eq!(sub, "a17c9aaa-61f6-4b3c-a8fc-a36f2b5fd02e");
    }

    #[test]
    fn rejects_a_token_signed_with_another_secret() {
        let token = issue_token("a17c9aaa-61f6-4b3c-a8fc-a36f2b5fd02e", SECRET, 60);
        assert!(decode_token(token, b"other-secret").is_err());
    }

    #[test]
    fn rejects_an_expired_token() {
        let token = issue_token("a17c9aaa-61f6-4b3c-a8fc-a36f2b5fd02e", SECRET, -60);
        assert!(decode_token(token, SECRET).is_err());
    }
}
