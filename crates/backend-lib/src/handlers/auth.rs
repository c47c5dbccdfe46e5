//! Registration, login and the current account.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use social_common::{LoginRequest, Role, TokenResponse, User, UserCreate};

use crate::auth::password::{
    hash_password_blocking, verify_password_blocking, verify_unknown_account,
};
use crate::auth::Identity;
use crate::error::AppError;
use crate::models::UserRecord;
use crate::storage::{repo, Filter};
use crate::validation::{normalize_email, ValidatedJson};
use crate::{metrics, AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

/// Create an account. Shared with `POST /users`.
pub(crate) async fn create_account(state: &AppState, payload: UserCreate) -> Result<User, AppError> {
    let email = normalize_email(&payload.email);
    let taken = repo::count::<UserRecord>(state.store.as_ref(), &Filter::eq("email", email.as_str()))
        .await?;
    if taken > 0 {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let role = if state.settings.auth.is_admin_email(&email) {
        Role::Admin
    } else {
        Role::User
    };
    let hashed = hash_password_blocking(payload.password.clone())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let record = UserRecord::new(&payload, hashed, role);
    repo::insert(state.store.as_ref(), &record).await?;

    ::metrics::counter!(metrics::USER_REGISTERED).increment(1);
    tracing::info!(user_id = %record.user.id, role = %role, "user registered");
    Ok(record.user)
}

async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<UserCreate>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = create_account(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let account = normalize_email(&payload.email);
    if !state.login_limiter.check_rate_limit(&account) {
        return Err(AppError::AuthRateLimited);
    }

    let record: Option<UserRecord> =
        repo::find_one(state.store.as_ref(), &Filter::eq("email", account.as_str())).await?;
    let verified = match &record {
        Some(record) => {
            verify_password_blocking(record.hashed_password.clone(), payload.password).await
        },
        None => verify_unknown_account(payload.password).await,
    };

    let record = match record {
        Some(record) if verified => record,
        _ => {
            state.login_limiter.record_failed_attempt(&account);
            ::metrics::counter!(metrics::LOGIN_FAILURE).increment(1);
            tracing::warn!(account = %account, "login failed");
            return Err(AppError::InvalidCredentials);
        },
    };

    if !record.user.is_active {
        return Err(AppError::BadRequest("Inactive user".to_string()));
    }

    state.login_limiter.record_success(&account);
    let access_token = state.tokens.issue(&record.user.id, record.user.role)?;

    ::metrics::counter!(metrics::LOGIN_SUCCESS).increment(1);
    tracing::info!(user_id = %record.user.id, "login succeeded");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        user_id: record.user.id,
        email: record.user.email,
        username: record.user.username,
    }))
}

async fn me(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<User>, AppError> {
    let record = super::active_user(state.store.as_ref(), &identity.user_id).await?;
    Ok(Json(record.user))
}
