use crate::application_port::AuthError;
use crate::domain_model::{Credential, SessionId, UserId};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Why a token failed to parse. Callers that must not leak codec detail
/// collapse this to `TokenInvalid` themselves.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TokenParseError {
    Malformed,
    BadSignature,
    Expired,
    InvalidClaims,
}

impl From<TokenParseError> for AuthError {
    fn from(err: TokenParseError) -> Self {
        match err {
            TokenParseError::Expired => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenCodecConfig {
    pub signing_key: Vec<u8>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    u: i64,    // user id
    s: String, // session id
    // Random per-mint id so two mints with the same claims in the same
    // second still produce distinct token values.
    jti: String,
    iat: i64,
    exp: i64,
}

/// Stateless HS256 mint/verify. Expiry is enforced at parse time with zero
/// leeway; revocation authority stays with the session cache.
pub struct TokenCodec {
    access_ttl: Duration,
    refresh_ttl: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenCodec {
    pub fn new(cfg: TokenCodecConfig) -> Self {
        TokenCodec {
            access_ttl: cfg.access_ttl,
            refresh_ttl: cfg.refresh_ttl,
            encoding_key: EncodingKey::from_secret(&cfg.signing_key),
            decoding_key: DecodingKey::from_secret(&cfg.signing_key),
        }
    }

    pub fn mint(
        &self,
        user_id: UserId,
        session_id: SessionId,
        ttl: Duration,
    ) -> Result<Credential, AuthError> {
        let iat = Utc::now();
        let exp = iat + ttl;
        let claims = Claims {
            u: user_id.0,
            s: session_id.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
            iat: iat.timestamp(),
            exp: exp.timestamp(),
        };
        let value = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        Ok(Credential {
            value,
            expires_at: exp,
        })
    }

    pub fn mint_access(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> Result<Credential, AuthError> {
        self.mint(user_id, session_id, self.access_ttl)
    }

    pub fn mint_refresh(
        &self,
        user_id: UserId,
        session_id: SessionId,
    ) -> Result<Credential, AuthError> {
        self.mint(user_id, session_id, self.refresh_ttl)
    }

    pub fn parse(&self, value: &str) -> Result<(UserId, SessionId), TokenParseError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;

        let data = decode::<Claims>(value, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenParseError::Expired,
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenParseError::BadSignature
                }
                ErrorKind::MissingRequiredClaim(_) => TokenParseError::InvalidClaims,
                _ => TokenParseError::Malformed,
            }
        })?;

        let session_id = data
            .claims
            .s
            .parse::<SessionId>()
            .map_err(|_| TokenParseError::InvalidClaims)?;
        Ok((UserId(data.claims.u), session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec_with_key(key: &[u8]) -> TokenCodec {
        TokenCodec::new(TokenCodecConfig {
            signing_key: key.to_vec(),
            access_ttl: Duration::hours(6),
            refresh_ttl: Duration::hours(24),
        })
    }

    fn codec() -> TokenCodec {
        codec_with_key(b"unit-test-signing-key")
    }

    #[test]
    fn mint_parse_roundtrip() {
        let codec = codec();
        let user_id = UserId(42);
        let session_id = SessionId::generate();

        let credential = codec.mint_access(user_id, session_id).unwrap();
        assert!(credential.expires_at > Utc::now());

        let (parsed_user, parsed_session) = codec.parse(&credential.value).unwrap();
        assert_eq!(parsed_user, user_id);
        assert_eq!(parsed_session, session_id);
    }

    #[test]
    fn repeated_mints_are_distinct() {
        let codec = codec();
        let session_id = SessionId::generate();
        let first = codec.mint_access(UserId(1), session_id).unwrap();
        let second = codec.mint_access(UserId(1), session_id).unwrap();
        assert_ne!(first.value, second.value);
    }

    #[test]
    fn refresh_outlives_access() {
        let codec = codec();
        let access = codec.mint_access(UserId(1), SessionId::generate()).unwrap();
        let refresh = codec.mint_refresh(UserId(1), SessionId::generate()).unwrap();
        assert!(refresh.expires_at > access.expires_at);
    }

    #[test]
    fn parse_rejects_expired() {
        let codec = codec();
        let credential = codec
            .mint(UserId(7), SessionId::generate(), Duration::seconds(-120))
            .unwrap();
        assert_eq!(
            codec.parse(&credential.value),
            Err(TokenParseError::Expired)
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(
            codec().parse("definitely-not-a-token"),
            Err(TokenParseError::Malformed)
        );
    }

    #[test]
    fn parse_rejects_foreign_signature() {
        let credential = codec_with_key(b"other-key")
            .mint_access(UserId(7), SessionId::generate())
            .unwrap();
        assert_eq!(
            codec().parse(&credential.value),
            Err(TokenParseError::BadSignature)
        );
    }

    #[test]
    fn parse_rejects_bad_session_claim() {
        #[derive(Serialize)]
        struct BadClaims {
            u: i64,
            s: String,
            jti: String,
            iat: i64,
            exp: i64,
        }
        let now = Utc::now().timestamp();
        let value = encode(
            &Header::new(Algorithm::HS256),
            &BadClaims {
                u: 7,
                s: "not-a-uuid".to_string(),
                jti: "x".to_string(),
                iat: now,
                exp: now + 600,
            },
            &EncodingKey::from_secret(b"unit-test-signing-key"),
        )
        .unwrap();
        assert_eq!(codec().parse(&value), Err(TokenParseError::InvalidClaims));
    }

    #[test]
    fn parse_error_maps_into_taxonomy() {
        assert!(matches!(
            AuthError::from(TokenParseError::Expired),
            AuthError::TokenExpired
        ));
        assert!(matches!(
            AuthError::from(TokenParseError::BadSignature),
            AuthError::TokenInvalid
        ));
    }
}
