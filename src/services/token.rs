use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::models::{Identity, Role, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub role: Role,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Identity {
            user_id: claims.user_id,
            role: claims.role,
        }
    }
}

/// Issues and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    issuer: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(issuer: &str, secret: &str, lifetime_hours: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);

        Self {
            issuer: issuer.to_string(),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime: Duration::hours(lifetime_hours),
        }
    }

    pub fn issue(&self, user: &User) -> AppResult<String> {
        self.issue_for(&user.id, user.role)
    }

    pub fn issue_for(&self, user_id: &str, role: Role) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
            user_id: user_id.to_string(),
            role,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))
    }

    /// Checks signature, expiry and issuer.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                AppError::Unauthorized("invalid or expired token".to_string())
            })
    }

    /// Re-issues a still-valid token with a fresh expiry.
    pub fn refresh(&self, token: &str) -> AppResult<String> {
        let claims = self.verify(token)?;
        self.issue_for(&claims.user_id, claims.role)
    }
}
