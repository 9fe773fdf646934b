use anyhow::Context;
use jsonwebtoken::{crypto, Algorithm, DecodingKey, EncodingKey};
use time::OffsetDateTime;
use tracing::debug;

use super::{
    claims::{Claims, TokenHeader},
    codec::{self, CodecError},
};

const ALGORITHM: Algorithm = Algorithm::RS256;

/// Why a token was refused, or why one could not be minted.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token structure: {0}")]
    Malformed(&'static str),
    #[error("invalid token signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("failed to encode token: {0}")]
    Encode(#[from] CodecError),
    #[error("failed to sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

impl TokenError {
    /// True for outcomes caused by the presented token rather than by the server.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Malformed(_) | Self::BadSignature | Self::Expired)
    }
}

/// RSA key pair plus token lifetime, loaded once at startup.
///
/// There is no revocation list: a token stays valid until `exp`.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_secs: i64,
}

pub fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

impl TokenKeys {
    pub fn from_rsa_pem(
        private_pem: &[u8],
        public_pem: &[u8],
        lifetime_secs: i64,
    ) -> anyhow::Result<Self> {
        let encoding = EncodingKey::from_rsa_pem(private_pem).context("parse RSA private key")?;
        let decoding = DecodingKey::from_rsa_pem(public_pem).context("parse RSA public key")?;
        Ok(Self {
            encoding,
            decoding,
            lifetime_secs,
        })
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    pub fn issue(&self, email: &str) -> Result<String, TokenError> {
        self.issue_claims(Claims::for_subject(email))
    }

    /// Signs `claims`, defaulting `iat` to now and `exp` to `iat + lifetime`.
    pub fn issue_claims(&self, mut claims: Claims) -> Result<String, TokenError> {
        let iat = *claims.iat.get_or_insert_with(now_unix);
        claims.exp.get_or_insert(iat + self.lifetime_secs);

        let header = codec::encode_json(&TokenHeader::rs256())?;
        let payload = codec::encode_json(&claims)?;
        let signing_input = format!("{header}.{payload}");
        let signature = crypto::sign(signing_input.as_bytes(), &self.encoding, ALGORITHM)
            .map_err(TokenError::Signing)?;

        debug!(email = %claims.email, exp = ?claims.exp, "token signed");
        Ok(format!("{signing_input}.{signature}"))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, now_unix())
    }

    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let mut segments = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenError::Malformed("expected three segments"));
        };

        let signature = codec::decode_segment(signature)
            .map_err(|_| TokenError::Malformed("undecodable signature"))?;

        // Verify over the bytes as received, never over re-serialized claims.
        let signing_input = &token[..header.len() + 1 + payload.len()];
        let valid = crypto::verify(
            &codec::encode_segment(&signature),
            signing_input.as_bytes(),
            &self.decoding,
            ALGORITHM,
        )
        .unwrap_or(false);
        if !valid {
            return Err(TokenError::BadSignature);
        }

        let header: TokenHeader =
            codec::decode_json(header).map_err(|_| TokenError::Malformed("undecodable header"))?;
        if header.alg != "RS256" {
            return Err(TokenError::Malformed("unsupported algorithm"));
        }
        let claims: Claims =
            codec::decode_json(payload).map_err(|_| TokenError::Malformed("undecodable claims"))?;

        if let Some(exp) = claims.exp {
            if now > exp {
                return Err(TokenError::Expired);
            }
        }

        debug!(email = %claims.email, "token verified");
        Ok(claims)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::Value;

    pub(crate) const PRIVATE_PEM: &[u8] = include_bytes!("testdata/private.pem");
    pub(crate) const PUBLIC_PEM: &[u8] = include_bytes!("testdata/public.pem");
    const OTHER_PUBLIC_PEM: &[u8] = include_bytes!("testdata/other_public.pem");

    pub(crate) fn make_keys(lifetime_secs: i64) -> TokenKeys {
        TokenKeys::from_rsa_pem(PRIVATE_PEM, PUBLIC_PEM, lifetime_secs).expect("fixture keys")
    }

    #[test]
    fn issue_and_verify_round_trip() {
        let keys = make_keys(3600);
        let token = keys.issue("alice@example.com").expect("issue");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.email, "alice@example.com");
        let (iat, exp) = (claims.iat.unwrap(), claims.exp.unwrap());
        assert_eq!(exp - iat, 3600);
        assert!((now_unix() - iat).abs() <= 5);
    }

    #[test]
    fn header_segment_is_fixed() {
        let keys = make_keys(60);
        let token = keys.issue("a@b.co").unwrap();
        let header = token.split('.').next().unwrap();
        let value: Value = codec::decode_json(header).unwrap();
        assert_eq!(value, serde_json::json!({"alg": "RS256", "typ": "JWT"}));
    }

    #[test]
    fn extra_claims_are_preserved() {
        let keys = make_keys(60);
        let mut claims = Claims::for_subject("a@b.co");
        claims.extra.insert("role".into(), Value::from("admin"));
        claims.iat = Some(now_unix() - 10);
        let token = keys.issue_claims(claims.clone()).unwrap();
        let back = keys.verify(&token).unwrap();
        assert_eq!(back.email, claims.email);
        assert_eq!(back.iat, claims.iat);
        assert_eq!(back.exp, Some(claims.iat.unwrap() + 60));
        assert_eq!(back.extra, claims.extra);
    }

    #[test]
    fn flipping_any_segment_breaks_verification() {
        let keys = make_keys(3600);
        let token = keys.issue("alice@example.com").unwrap();
        let dots: Vec<usize> = token.match_indices('.').map(|(i, _)| i).collect();
        let middles = [dots[0] / 2, (dots[0] + dots[1]) / 2, (dots[1] + token.len()) / 2];
        for pos in middles {
            let mut bytes = token.clone().into_bytes();
            bytes[pos] = if bytes[pos] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();
            assert!(keys.verify(&tampered).is_err(), "tamper at {pos} accepted");
        }
    }

    #[test]
    fn expired_token_is_rejected_with_reason() {
        let keys = make_keys(3600);
        let mut claims = Claims::for_subject("a@b.co");
        claims.exp = Some(now_unix() - 1);
        let token = keys.issue_claims(claims).unwrap();
        let err = keys.verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
        assert_eq!(err.to_string(), "token expired");
    }

    #[test]
    fn token_expiring_in_an_hour_is_accepted() {
        let keys = make_keys(3600);
        let mut claims = Claims::for_subject("a@b.co");
        claims.exp = Some(now_unix() + 3600);
        let token = keys.issue_claims(claims).unwrap();
        assert!(keys.verify(&token).is_ok());
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let keys = make_keys(100);
        let mut claims = Claims::for_subject("a@b.co");
        claims.iat = Some(1_000);
        let token = keys.issue_claims(claims).unwrap();
        assert!(keys.verify_at(&token, 1_100).is_ok());
        assert!(matches!(keys.verify_at(&token, 1_101), Err(TokenError::Expired)));
    }

    #[test]
    fn wrong_segment_counts_are_malformed() {
        let keys = make_keys(60);
        let token = keys.issue("a@b.co").unwrap();
        let candidates = [
            String::new(),
            "abc".to_string(),
            "abc.def".to_string(),
            format!("{token}.extra"),
            format!("{token}.x.y"),
        ];
        for candidate in candidates {
            let err = keys.verify(&candidate).unwrap_err();
            assert!(matches!(err, TokenError::Malformed(_)), "{candidate:?}: {err}");
            assert!(err.is_rejection());
        }
    }

    #[test]
    fn token_from_another_key_pair_is_rejected() {
        let keys = make_keys(60);
        let other = TokenKeys::from_rsa_pem(PRIVATE_PEM, OTHER_PUBLIC_PEM, 60).unwrap();
        let token = keys.issue("a@b.co").unwrap();
        assert!(matches!(other.verify(&token), Err(TokenError::BadSignature)));
    }

    #[test]
    fn garbage_pem_fails_at_load() {
        assert!(TokenKeys::from_rsa_pem(b"nope", PUBLIC_PEM, 60).is_err());
    }
}
