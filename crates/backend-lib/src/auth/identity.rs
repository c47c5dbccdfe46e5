//! Authenticated caller, extracted from the bearer token.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use social_common::Role;

use super::token::bearer_token;
use crate::error::AppError;
use crate::models::UserRecord;
use crate::storage::repo;
use crate::AppState;

/// Who is making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_self_or_admin(&self, user_id: &str) -> bool {
        self.user_id == user_id || self.is_admin()
    }
}

/// Verifies the bearer token and reloads the account, so deactivated
/// users and demoted admins lose access before their token expires.
impl FromRequestParts<Arc<AppState>> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(identity.clone());
        }

        let token = bearer_token(parts.headers.get(AUTHORIZATION))?;
        let claims = state.tokens.verify(token)?;

        let record: UserRecord = repo::find_one(state.store.as_ref(), &repo::active(&claims.sub))
            .await?
            .ok_or_else(|| AppError::Auth("account not found or inactive".to_string()))?;

        let identity = Identity::new(record.user.id, record.user.role);
        parts.extensions.insert(identity.clone());
        Ok(identity)
    }
}
