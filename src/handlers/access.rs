use std::marker::PhantomData;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::errors::AppError;
use crate::models::{Identity, Role};
use crate::state::AppState;

/// Raw token from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AppError::Unauthorized("expected 'Bearer <token>' authorization".to_string())
            })?;

        Ok(Self(token.to_string()))
    }
}

/// Static allow-list of roles for a group of routes.
pub trait AccessPolicy {
    const ALLOWED: &'static [Role];
}

pub struct AnyRole;
pub struct Staff;
pub struct AdminOnly;
pub struct ApproverOnly;

impl AccessPolicy for AnyRole {
    const ALLOWED: &'static [Role] = &[Role::Admin, Role::Employee, Role::Approver];
}

impl AccessPolicy for Staff {
    const ALLOWED: &'static [Role] = &[Role::Admin, Role::Approver];
}

impl AccessPolicy for AdminOnly {
    const ALLOWED: &'static [Role] = &[Role::Admin];
}

impl AccessPolicy for ApproverOnly {
    const ALLOWED: &'static [Role] = &[Role::Approver];
}

/// A caller whose token verified and whose role is allowed by `P`.
///
/// Missing or invalid tokens reject with 401, a disallowed role with 403.
#[derive(Debug)]
pub struct Authorized<P> {
    pub identity: Identity,
    _policy: PhantomData<fn() -> P>,
}

#[async_trait]
impl<P: AccessPolicy> FromRequestParts<Arc<AppState>> for Authorized<P> {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let identity: Identity = state.tokens.verify(&token)?.into();

        if !P::ALLOWED.contains(&identity.role) {
            tracing::warn!(
                user_id = %identity.user_id,
                role = identity.role.as_str(),
                path = %parts.uri.path(),
                "role not allowed"
            );
            return Err(AppError::Forbidden("forbidden resource".to_string()));
        }

        Ok(Self {
            identity,
            _policy: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policies() {
        assert!(AdminOnly::ALLOWED.contains(&Role::Admin));
        assert!(!AdminOnly::ALLOWED.contains(&Role::Approver));
        assert!(ApproverOnly::ALLOWED.contains(&Role::Approver));
        assert!(!ApproverOnly::ALLOWED.contains(&Role::Admin));
        assert!(!Staff::ALLOWED.contains(&Role::Employee));
        assert_eq!(AnyRole::ALLOWED.len(), 3);
    }
}
