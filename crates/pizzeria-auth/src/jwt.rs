//! JWT token management

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

use crate::error::AuthError;

/// Access token lifetime when none is configured
pub const DEFAULT_ACCESS_TTL_MINUTES: i64 = 15;

/// Refresh token lifetime when none is configured (7 days)
pub const DEFAULT_REFRESH_TTL_MINUTES: i64 = 7 * 24 * 60;

/// Which half of a token pair a token is
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (username)
    #[serde(default)]
    pub sub: String,
    /// User ID
    #[serde(default)]
    pub id: Option<i64>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Token kind
    pub typ: TokenKind,
}

/// Signed access and refresh tokens issued together at login
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Process-wide token configuration
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub secret: String,
    /// The first algorithm signs; every listed algorithm is accepted on decode
    pub algorithms: Vec<Algorithm>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenSettings {
    /// Settings with the default lifetimes
    pub fn new(secret: impl Into<String>, algorithms: Vec<Algorithm>) -> Self {
        Self {
            secret: secret.into(),
            algorithms,
            access_ttl: Duration::minutes(DEFAULT_ACCESS_TTL_MINUTES),
            refresh_ttl: Duration::minutes(DEFAULT_REFRESH_TTL_MINUTES),
        }
    }
}

/// Parse algorithm names such as `HS256`
///
/// Only HMAC algorithms are accepted since the key is a shared secret.
pub fn parse_algorithms<S: AsRef<str>>(names: &[S]) -> Result<Vec<Algorithm>, AuthError> {
    if names.is_empty() {
        return Err(AuthError::Config("no signing algorithm configured".to_string()));
    }

    names
        .iter()
        .map(|name| {
            let name = name.as_ref().trim();
            let algorithm = Algorithm::from_str(name)
                .map_err(|_| AuthError::Config(format!("unknown algorithm: {}", name)))?;
            match algorithm {
                Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
                _ => Err(AuthError::Config(format!(
                    "algorithm {} needs a key pair, only HS256/HS384/HS512 are supported",
                    name
                ))),
            }
        })
        .collect()
}

/// Expiry instant for a token issued at `now`, or an error if it cannot be represented
fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, AuthError> {
    now.checked_add_signed(ttl)
        .ok_or_else(|| AuthError::Config(format!("token lifetime out of range: {}", ttl)))
}

/// Signs and verifies access and refresh tokens
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    /// Create a new codec, rejecting unusable settings
    pub fn new(settings: &TokenSettings) -> Result<Self, AuthError> {
        if settings.secret.is_empty() {
            return Err(AuthError::Config("secret key must not be empty".to_string()));
        }
        let signing = *settings
            .algorithms
            .first()
            .ok_or_else(|| AuthError::Config("no signing algorithm configured".to_string()))?;
        if settings.access_ttl <= Duration::zero() || settings.refresh_ttl <= Duration::zero() {
            return Err(AuthError::Config("token lifetimes must be positive".to_string()));
        }
        let now = Utc::now();
        expiry_after(now, settings.access_ttl)?;
        expiry_after(now, settings.refresh_ttl)?;

        let mut validation = Validation::new(signing);
        validation.algorithms = settings.algorithms.clone();
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
            header: Header::new(signing),
            validation,
            access_ttl: settings.access_ttl,
            refresh_ttl: settings.refresh_ttl,
        })
    }

    /// Configured access token lifetime
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Configured refresh token lifetime
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issue an access token; `None` uses the configured lifetime
    pub fn issue_access(
        &self,
        subject: &str,
        user_id: i64,
        ttl: Option<Duration>,
    ) -> Result<String, AuthError> {
        self.issue(TokenKind::Access, subject, user_id, ttl.unwrap_or(self.access_ttl))
    }

    /// Issue a refresh token; `None` uses the configured lifetime
    pub fn issue_refresh(
        &self,
        subject: &str,
        user_id: i64,
        ttl: Option<Duration>,
    ) -> Result<String, AuthError> {
        self.issue(TokenKind::Refresh, subject, user_id, ttl.unwrap_or(self.refresh_ttl))
    }

    /// Issue an access and refresh token for the same user
    pub fn issue_pair(&self, subject: &str, user_id: i64) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.issue_access(subject, user_id, None)?,
            refresh_token: self.issue_refresh(subject, user_id, None)?,
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    fn issue(
        &self,
        typ: TokenKind,
        subject: &str,
        user_id: i64,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            id: Some(user_id),
            exp: expiry_after(now, ttl)?.timestamp(),
            iat: now.timestamp(),
            typ,
        };

        debug!("Issuing {:?} token for user: {}", typ, subject);

        encode(&self.header, &claims, &self.encoding_key).map_err(AuthError::TokenEncoding)
    }

    /// Verify signature and expiry and return the claims
    ///
    /// Every failure is reported as `InvalidToken`.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                AuthError::InvalidToken
            })
    }

    /// Decode a token and require it to be of the given kind
    pub fn decode_kind(&self, token: &str, kind: TokenKind) -> Result<Claims, AuthError> {
        let claims = self.decode(token)?;
        if claims.typ != kind {
            debug!("Token rejected: expected {:?}, got {:?}", kind, claims.typ);
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }
}
