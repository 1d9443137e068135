//! Main token service implementation

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::entities::token::{Claims, TokenKind, TokenPair, TokenSubject};
use crate::errors::TokenError;

use super::config::TokenConfig;

/// SHA-256 hex digest of a refresh token, the form kept in the user record
pub fn refresh_token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

fn expiry(issued_at: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, TokenError> {
    issued_at
        .checked_add_signed(ttl)
        .ok_or_else(|| TokenError::SigningError {
            message: "token expiry is out of range".to_string(),
        })
}

/// Keys for one secret family
struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl KeyPair {
    fn from_secret(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

/// Issues and verifies HS256 access and refresh tokens.
///
/// The two token kinds are signed with independent secrets, so a token of one
/// kind never verifies as the other.
pub struct TokenService {
    access: KeyPair,
    refresh: KeyPair,
    issuer: String,
    validation: Validation,
}

impl TokenService {
    /// Creates a new token service instance
    ///
    /// # Returns
    ///
    /// * `Err(TokenError::SigningError)` - a secret is empty, both secrets are
    ///   the same, or a lifetime is not positive or too large to represent
    pub fn new(config: TokenConfig) -> Result<Self, TokenError> {
        let signing_error = |message: &str| TokenError::SigningError {
            message: message.to_string(),
        };

        if config.access_secret.is_empty() || config.refresh_secret.is_empty() {
            return Err(signing_error("signing secret is not configured"));
        }
        if config.access_secret == config.refresh_secret {
            return Err(signing_error("access and refresh secrets must differ"));
        }
        if config.access_ttl <= Duration::zero() || config.refresh_ttl <= Duration::zero() {
            return Err(signing_error("token lifetimes must be positive"));
        }
        let now = Utc::now();
        if now.checked_add_signed(config.access_ttl).is_none()
            || now.checked_add_signed(config.refresh_ttl).is_none()
        {
            return Err(signing_error("token lifetime is out of range"));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.leeway = 0;
        validation.validate_exp = true;

        Ok(Self {
            access: KeyPair::from_secret(&config.access_secret, config.access_ttl),
            refresh: KeyPair::from_secret(&config.refresh_secret, config.refresh_ttl),
            issuer: config.issuer,
            validation,
        })
    }

    /// Lifetime of access tokens
    pub fn access_ttl(&self) -> Duration {
        self.access.ttl
    }

    /// Lifetime of refresh tokens
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh.ttl
    }

    pub fn issue_access_token(&self, subject: &TokenSubject) -> Result<String, TokenError> {
        self.issue_access_token_at(subject, Utc::now())
    }

    /// Issue an access token as if it had been minted at `issued_at`
    pub fn issue_access_token_at(
        &self,
        subject: &TokenSubject,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        self.issue(TokenKind::Access, subject, issued_at)
    }

    pub fn issue_refresh_token(&self, subject: &TokenSubject) -> Result<String, TokenError> {
        self.issue_refresh_token_at(subject, Utc::now())
    }

    /// Issue a refresh token as if it had been minted at `issued_at`
    pub fn issue_refresh_token_at(
        &self,
        subject: &TokenSubject,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        self.issue(TokenKind::Refresh, subject, issued_at)
    }

    /// Generates a new token pair for a subject
    pub fn issue_pair(&self, subject: &TokenSubject) -> Result<TokenPair, TokenError> {
        self.issue_pair_at(subject, Utc::now())
    }

    pub fn issue_pair_at(
        &self,
        subject: &TokenSubject,
        issued_at: DateTime<Utc>,
    ) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue_access_token_at(subject, issued_at)?,
            refresh_token: self.issue_refresh_token_at(subject, issued_at)?,
            access_expires_at: expiry(issued_at, self.access.ttl)?,
            refresh_expires_at: expiry(issued_at, self.refresh.ttl)?,
        })
    }

    /// Verifies an access token and returns the claims
    ///
    /// # Returns
    ///
    /// * `Ok(Claims)` - signature, issuer and expiry all check out
    /// * `Err(TokenError::TokenExpired)` - well-formed but past `exp`
    /// * `Err(TokenError::TokenInvalid)` - anything else
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(TokenKind::Access, token)
    }

    /// Verifies a refresh token; same error split as [`Self::verify_access_token`]
    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(TokenKind::Refresh, token)
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    fn issue(
        &self,
        kind: TokenKind,
        subject: &TokenSubject,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let keys = self.keys(kind);
        let claims = Claims {
            user_id: subject.user_id,
            role: subject.role.clone(),
            iat: issued_at.timestamp(),
            exp: expiry(issued_at, keys.ttl)?.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).map_err(|e| {
            TokenError::SigningError {
                message: e.to_string(),
            }
        })
    }

    fn verify(&self, kind: TokenKind, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.keys(kind).decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::TokenExpired,
                _ => TokenError::TokenInvalid,
            })
    }
}
