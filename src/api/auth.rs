use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::constants::auth::LOGIN_PATH;
use crate::constants::session::IDENTITY_KEY;
use crate::services::AdminIdentity;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,

    /// Originally requested location, echoed back so the UI can return
    /// there after login.
    pub next: Option<String>,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub username: String,
    pub email: String,
    pub must_change_password: bool,
    pub redirect_to: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
}

#[derive(Serialize)]
pub struct ResetPasswordResponse {
    /// Plaintext temporary secret, shown exactly once.
    pub temp_password: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Route guard for the admin API: a valid session record is the only way
/// through. A missing or malformed record fails open to logged-out, never
/// to logged-in.
pub async fn require_auth(session: Session, request: Request, next: Next) -> Response {
    match read_identity(&session).await {
        Some(identity) => {
            tracing::debug!(user = %identity.username, "Authenticated request");
            next.run(request).await
        }
        None => {
            let body = ApiResponse::<()>::error("Not authenticated");
            (StatusCode::UNAUTHORIZED, Json(body)).into_response()
        }
    }
}

/// Route guard for admin pages: unauthenticated visitors are redirected to
/// the login entry point, carrying the originally requested location.
pub async fn guard_page(session: Session, request: Request, next: Next) -> Response {
    if read_identity(&session).await.is_some() {
        return next.run(request).await;
    }

    let original = request
        .uri()
        .path_and_query()
        .map_or_else(|| "/".to_string(), |pq| pq.as_str().to_string());

    let target = format!("{LOGIN_PATH}?next={}", urlencoding::encode(&original));
    Redirect::to(&target).into_response()
}

/// Read the identity stored under the fixed session key. Corrupt content is
/// discarded and treated as "no session".
async fn read_identity(session: &Session) -> Option<AdminIdentity> {
    match session.get::<AdminIdentity>(IDENTITY_KEY).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!("Discarding malformed session record: {e}");
            let _ = session.flush().await;
            None
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Authenticate with username and password, establishes a session on success
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state.auth.login(&payload.username, &payload.password).await?;

    session
        .insert(IDENTITY_KEY, &result.identity)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    // Only local paths are honored for the post-login redirect.
    let redirect_to = payload
        .next
        .filter(|n| n.starts_with('/') && !n.starts_with("//"))
        .unwrap_or_else(|| "/admin".to_string());

    Ok(Json(ApiResponse::success(LoginResponse {
        username: result.identity.username,
        email: result.identity.email,
        must_change_password: result.must_change_password,
        redirect_to,
    })))
}

/// POST /auth/logout
/// Destroy the current session. Idempotent.
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    (StatusCode::OK, "Logged out")
}

/// GET /auth/me
/// Current session identity (requires authentication)
pub async fn get_current_user(
    session: Session,
) -> Result<Json<ApiResponse<AdminIdentity>>, ApiError> {
    let identity = read_identity(&session)
        .await
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    Ok(Json(ApiResponse::success(identity)))
}

/// PUT /auth/password
/// Change password (requires current password verification). Every session
/// record is destroyed afterwards so nothing established under the old
/// credential stays valid, including the session that made the call.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .auth
        .change_password(&payload.current_password, &payload.new_password)
        .await?;

    state
        .store
        .clear_sessions()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to invalidate sessions: {e}")))?;
    let _ = session.flush().await;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password updated, please log in again".to_string(),
    })))
}

/// POST /auth/reset
/// Issue a one-time temporary password for the registered recovery address.
/// The plaintext is returned for direct display; delivery is out of scope.
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<ResetPasswordResponse>>, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }

    let temp_password = state.auth.reset_password(&payload.email).await?;

    Ok(Json(ApiResponse::success(ResetPasswordResponse {
        temp_password,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_sessions::{MemoryStore, Session};

    #[tokio::test]
    async fn test_malformed_session_record_reads_as_logged_out() {
        let store = Arc::new(MemoryStore::default());
        let session = Session::new(None, store, None);

        // Something other than an AdminIdentity under the identity key.
        session.insert(IDENTITY_KEY, 42).await.unwrap();

        assert!(read_identity(&session).await.is_none());

        // The corrupt record was flushed, not left behind.
        assert_eq!(session.get::<i32>(IDENTITY_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_valid_session_record_round_trips() {
        let store = Arc::new(MemoryStore::default());
        let session = Session::new(None, store, None);

        let identity = AdminIdentity {
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
        };
        session.insert(IDENTITY_KEY, &identity).await.unwrap();

        assert_eq!(read_identity(&session).await, Some(identity));
    }
}
