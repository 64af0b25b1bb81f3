//! Bearer token authentication.
//!
//! The principal-resolution contract: given a request carrying an opaque
//! bearer credential, produce a `Principal { id, role }` or fail uniformly
//! with 401. Tokens are HS256 JWTs signed with the configured secret.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use jobdesk_models::{Role, UserId};

use crate::error::ApiError;
use crate::state::AppState;

/// Token lifetime.
const TOKEN_TTL_DAYS: i64 = 7;

/// Claims carried in a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Account role
    pub role: String,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
}

/// Signing and verification keys for bearer tokens.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    /// Create keys from a shared secret.
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Issue a token for a user.
    pub fn issue(&self, user_id: &UserId, role: Role) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.as_str().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to sign token: {e}")))
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|e| ApiError::unauthorized(format!("Token invalid: {e}")))?;
        Ok(data.claims)
    }
}

/// The authenticated actor performing an action.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
}

impl Principal {
    /// Build a principal from verified claims. Fails if the role claim is
    /// not part of the enumeration.
    fn from_claims(claims: Claims) -> Result<Self, ApiError> {
        let role = Role::parse(&claims.role)
            .ok_or_else(|| ApiError::unauthorized("Token invalid: unknown role"))?;
        Ok(Self {
            id: UserId::from_string(claims.sub),
            role,
        })
    }
}

/// Axum extractor for the authenticated principal.
#[axum::async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("No token"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header format"))?;

        let claims = state.keys.verify(token)?;
        Principal::from_claims(claims)
    }
}
