/// Bearer-token provider
///
/// Verifies HS256 bearer tokens issued by the external token service. The
/// expiry boundary is part of the authentication contract, so validation
/// runs with zero clock-skew leeway. Permissions never travel inside the
/// token; only the role does, and it is re-resolved on every check.

use super::Credentials;
use crate::{
    error::{AuthError, Result},
    models::User,
};
use auth_rbac::Role;
use auth_session::Session;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Claims payload carried by a bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Stable subject identity
    pub sub: String,
    /// Expiry as a Unix timestamp
    pub exp: i64,
    /// Issued-at as a Unix timestamp
    #[serde(default)]
    pub iat: i64,
    /// Role name resolved against the permission table at check time
    pub role: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub profile: HashMap<String, serde_json::Value>,
}

pub struct TokenProvider {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenProvider {
    pub fn new(secret: &str) -> Result<Self> {
        if secret.is_empty() {
            return Err(AuthError::Configuration(
                "token secret must not be empty".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // No clock-skew grace: `exp < now` must fail, even by one second
        validation.leeway = 0;

        Ok(Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    pub async fn authenticate(&self, credentials: &Credentials) -> Result<User> {
        let Credentials::Bearer { token } = credentials else {
            return Err(AuthError::InvalidToken);
        };

        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation).map_err(
            |err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            },
        )?;

        let claims = data.claims;
        let username = claims.username.unwrap_or_else(|| claims.sub.clone());
        Ok(User {
            id: claims.sub,
            username,
            role: Role::new(&claims.role),
            profile: claims.profile,
        })
    }

    /// Best-effort logout hook; revocation belongs to the token issuer
    pub async fn logout(&self, session: &Session) {
        debug!(
            session_id = %session.id,
            "bearer session closed; token revocation is delegated to the issuer"
        );
    }
}

/// Unverified `sub` peek used for lockout bookkeeping before validation
pub fn peek_subject(token: &str) -> Option<String> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.as_bytes()).ok()?;
    let value: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    value.get("sub")?.as_str().map(|sub| sub.to_string())
}

/// Sign a claims payload
///
/// Token issuance normally lives in the external token service; this helper
/// backs tests and local tooling.
pub fn encode_claims(claims: &TokenClaims, secret: &str) -> Result<String> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|err| AuthError::Internal(format!("failed to sign token: {}", err)))
}
