//! Issuance and validation of signed access/refresh tokens (HS256 JWT).
//!
//! Both kinds carry the same claim set and differ in signing secret and
//! lifetime. Tokens are stateless: validity is signature + issuer/audience +
//! time window + token kind, nothing else.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use portal_core::{RoleId, UserId};

use crate::{Claims, Permission, TokenConfig};

/// Which secret (and lifetime) a token was minted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl core::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed: {0}")]
    Malformed(String),

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token not yet valid")]
    NotYetValid,

    #[error("token issuer mismatch")]
    IssuerMismatch,

    #[error("token audience mismatch")]
    AudienceMismatch,

    #[error("expected {expected} token, got {found}")]
    WrongKind { expected: TokenKind, found: TokenKind },

    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Access + refresh token pair returned by login and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// JWT payload as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct WireClaims {
    sub: String,
    email: String,
    jti: String,
    iat: i64,
    nbf: i64,
    exp: i64,
    iss: String,
    aud: String,
    role_id: RoleId,
    role_name: String,
    #[serde(default, rename = "permission")]
    permissions: Vec<String>,
    token_use: TokenKind,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Token issuer/validator.
///
/// Holds only immutable configuration, so one instance is shared by all
/// requests without locking.
pub struct TokenService {
    config: TokenConfig,
    access: SigningKeys,
    refresh: SigningKeys,
    validation: Validation,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time window is checked against an explicit clock in `validate_at`.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_issuer(&[config.issuer()]);
        validation.set_audience(&[config.audience()]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud", "sub"]);

        Self {
            access: SigningKeys::from_secret(config.access_secret()),
            refresh: SigningKeys::from_secret(config.refresh_secret()),
            config,
            validation,
        }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    pub fn issue_access(&self, claims: &Claims) -> Result<String, TokenError> {
        self.issue_at(TokenKind::Access, claims, Utc::now())
    }

    pub fn issue_refresh(&self, claims: &Claims) -> Result<String, TokenError> {
        self.issue_at(TokenKind::Refresh, claims, Utc::now())
    }

    pub fn issue_pair(&self, claims: &Claims) -> Result<TokenPair, TokenError> {
        let now = Utc::now();
        Ok(TokenPair {
            access_token: self.issue_at(TokenKind::Access, claims, now)?,
            refresh_token: self.issue_at(TokenKind::Refresh, claims, now)?,
        })
    }

    /// Mint a token of `kind` as if the current time were `now`.
    pub fn issue_at(
        &self,
        kind: TokenKind,
        claims: &Claims,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let iat = now.timestamp();
        let wire = WireClaims {
            sub: claims.user_id().to_string(),
            email: claims.email().to_string(),
            jti: Uuid::new_v4().simple().to_string(),
            iat,
            nbf: iat,
            exp: iat + self.ttl(kind).num_seconds(),
            iss: self.config.issuer().to_string(),
            aud: self.config.audience().to_string(),
            role_id: claims.role_id(),
            role_name: claims.role_name().to_string(),
            permissions: claims
                .permissions()
                .iter()
                .map(|p| p.as_str().to_string())
                .collect(),
            token_use: kind,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &wire, &self.keys(kind).encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    pub fn validate_access(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_at(TokenKind::Access, token, Utc::now())
    }

    pub fn validate_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_at(TokenKind::Refresh, token, Utc::now())
    }

    /// Verify a token of `kind` against an explicit clock.
    ///
    /// Expired iff `now > exp + leeway`; not yet valid iff `now + leeway < nbf`.
    pub fn validate_at(
        &self,
        kind: TokenKind,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Claims, TokenError> {
        let data = jsonwebtoken::decode::<WireClaims>(token, &self.keys(kind).decoding, &self.validation)
            .map_err(map_jwt_error)?;
        let wire = data.claims;

        let now = now.timestamp();
        let leeway = self.leeway(kind).num_seconds();
        if now > wire.exp.saturating_add(leeway) {
            return Err(TokenError::Expired);
        }
        if now.saturating_add(leeway) < wire.nbf {
            return Err(TokenError::NotYetValid);
        }
        if wire.token_use != kind {
            return Err(TokenError::WrongKind {
                expected: kind,
                found: wire.token_use,
            });
        }

        let user_id = UserId::from_str(&wire.sub).map_err(|e| TokenError::Malformed(e.to_string()))?;
        let permissions: BTreeSet<Permission> =
            wire.permissions.into_iter().map(Permission::new).collect();

        Ok(Claims::from_parts(
            user_id,
            wire.email,
            wire.role_id,
            wire.role_name,
            permissions,
        ))
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.config.access_ttl(),
            TokenKind::Refresh => self.config.refresh_ttl(),
        }
    }

    fn leeway(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.config.access_leeway(),
            TokenKind::Refresh => self.config.refresh_leeway(),
        }
    }
}

impl core::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::InvalidIssuer => TokenError::IssuerMismatch,
        ErrorKind::InvalidAudience => TokenError::AudienceMismatch,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::ImmatureSignature => TokenError::NotYetValid,
        _ => TokenError::Malformed(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn service() -> TokenService {
        let config = TokenConfig::new("access-secret", "refresh-secret", "portal-api", "portal-web").unwrap();
        TokenService::new(config)
    }

    fn claims() -> Claims {
        Claims::new(
            UserId::new(42),
            "seller@example.com",
            RoleId::new(3),
            [Permission::new("listing.create")],
        )
    }

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn refresh_round_trip_preserves_claims() {
        let svc = service();
        let token = svc.issue_at(TokenKind::Refresh, &claims(), t0()).unwrap();
        let decoded = svc.validate_at(TokenKind::Refresh, &token, t0()).unwrap();
        assert_eq!(decoded, claims());
    }

    #[test]
    fn access_token_is_rejected_as_refresh_and_vice_versa() {
        let svc = service();
        let access = svc.issue_at(TokenKind::Access, &claims(), t0()).unwrap();
        let refresh = svc.issue_at(TokenKind::Refresh, &claims(), t0()).unwrap();

        assert_eq!(
            svc.validate_at(TokenKind::Refresh, &access, t0()),
            Err(TokenError::InvalidSignature)
        );
        assert_eq!(
            svc.validate_at(TokenKind::Access, &refresh, t0()),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn token_use_claim_is_checked_even_with_matching_signature() {
        let svc = service();
        let now = t0().timestamp();
        let forged = WireClaims {
            sub: "42".to_string(),
            email: "seller@example.com".to_string(),
            jti: "x".to_string(),
            iat: now,
            nbf: now,
            exp: now + 60,
            iss: "portal-api".to_string(),
            aud: "portal-web".to_string(),
            role_id: RoleId::new(3),
            role_name: "private_seller".to_string(),
            permissions: vec![],
            token_use: TokenKind::Access,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &forged,
            &EncodingKey::from_secret(b"refresh-secret"),
        )
        .unwrap();

        assert_eq!(
            svc.validate_at(TokenKind::Refresh, &token, t0()),
            Err(TokenError::WrongKind {
                expected: TokenKind::Refresh,
                found: TokenKind::Access,
            })
        );
    }

    #[test]
    fn refresh_expiry_honours_clock_skew() {
        let svc = service();
        let token = svc.issue_at(TokenKind::Refresh, &claims(), t0()).unwrap();
        let exp = t0() + Duration::days(7);

        assert!(svc.validate_at(TokenKind::Refresh, &token, exp - Duration::seconds(30)).is_ok());
        assert!(svc.validate_at(TokenKind::Refresh, &token, exp + Duration::seconds(30)).is_ok());
        assert_eq!(
            svc.validate_at(TokenKind::Refresh, &token, exp + Duration::seconds(31)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn access_tokens_have_no_clock_skew() {
        let svc = service();
        let token = svc.issue_at(TokenKind::Access, &claims(), t0()).unwrap();
        let exp = t0() + Duration::hours(1);

        assert!(svc.validate_at(TokenKind::Access, &token, exp).is_ok());
        assert_eq!(
            svc.validate_at(TokenKind::Access, &token, exp + Duration::seconds(1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn token_from_the_future_is_not_yet_valid() {
        let svc = service();
        let token = svc.issue_at(TokenKind::Refresh, &claims(), t0()).unwrap();
        assert_eq!(
            svc.validate_at(TokenKind::Refresh, &token, t0() - Duration::minutes(5)),
            Err(TokenError::NotYetValid)
        );
        assert!(svc.validate_at(TokenKind::Refresh, &token, t0() - Duration::seconds(30)).is_ok());
    }

    #[test]
    fn issuer_and_audience_must_match() {
        let svc = service();
        let other_issuer = TokenService::new(
            TokenConfig::new("access-secret", "refresh-secret", "someone-else", "portal-web").unwrap(),
        );
        let other_audience = TokenService::new(
            TokenConfig::new("access-secret", "refresh-secret", "portal-api", "mobile").unwrap(),
        );

        let token = other_issuer.issue_at(TokenKind::Refresh, &claims(), t0()).unwrap();
        assert_eq!(
            svc.validate_at(TokenKind::Refresh, &token, t0()),
            Err(TokenError::IssuerMismatch)
        );

        let token = other_audience.issue_at(TokenKind::Refresh, &claims(), t0()).unwrap();
        assert_eq!(
            svc.validate_at(TokenKind::Refresh, &token, t0()),
            Err(TokenError::AudienceMismatch)
        );
    }

    #[test]
    fn tampered_payload_fails_signature() {
        let svc = service();
        let token = svc.issue_at(TokenKind::Refresh, &claims(), t0()).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let other = svc
            .issue_at(
                TokenKind::Refresh,
                &Claims::new(UserId::new(1), "admin@example.com", RoleId::new(1), []),
                t0(),
            )
            .unwrap();
        let other_payload = other.split('.').nth(1).unwrap().to_string();
        parts[1] = &other_payload;
        let tampered = parts.join(".");

        assert_eq!(
            svc.validate_at(TokenKind::Refresh, &tampered, t0()),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn garbage_is_malformed_not_a_panic() {
        let svc = service();
        for token in ["", "abc", "a.b.c", "....."] {
            assert!(matches!(
                svc.validate_refresh(token),
                Err(TokenError::Malformed(_))
            ));
        }
    }

    #[test]
    fn pair_tokens_are_distinct_and_carry_fresh_ids() {
        let svc = service();
        let pair = svc.issue_pair(&claims()).unwrap();
        assert_ne!(pair.access_token, pair.refresh_token);

        let again = svc.issue_pair(&claims()).unwrap();
        assert_ne!(pair.access_token, again.access_token);
    }

    fn arb_claims() -> impl Strategy<Value = Claims> {
        (
            any::<i64>(),
            "[a-z]{1,12}@[a-z]{1,8}\\.com",
            -5i32..10,
            prop::collection::vec("[a-zA-Z]{1,8}\\.[a-z]{1,8}", 0..6),
        )
            .prop_map(|(id, email, role, perms)| {
                Claims::new(
                    UserId::new(id),
                    email,
                    RoleId::new(role),
                    perms.into_iter().map(Permission::new),
                )
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: validate_refresh(issue_refresh(c)) == c for any claims.
        #[test]
        fn refresh_round_trip_for_any_claims(c in arb_claims()) {
            let svc = service();
            let token = svc.issue_at(TokenKind::Refresh, &c, t0()).unwrap();
            let decoded = svc.validate_at(TokenKind::Refresh, &token, t0()).unwrap();
            prop_assert_eq!(decoded, c);
        }
    }
}
