use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthSession, SignUp};
use crate::error::{AppError, Result};
use crate::models::{Profile, User};
use crate::store::{profiles, run_blocking};
use crate::AppState;

/// The signed-in user behind a request's bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let user = state.auth.get_session(token).await?;
        Ok(AuthUser {
            user,
            token: token.to_string(),
        })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: User,
    pub profile: Option<Profile>,
}

#[derive(Debug, Serialize)]
pub struct SignOutResponse {
    pub success: bool,
}

/// Register a new account
///
/// POST /auth/signup
///
/// Returns 409 Conflict if the email is already registered.
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUp>,
) -> Result<(StatusCode, Json<AuthSession>)> {
    let session = state.auth.sign_up(payload).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// POST /auth/signin
pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<AuthSession>> {
    let session = state.auth.sign_in(&payload.email, &payload.password).await?;
    Ok(Json(session))
}

/// POST /auth/signout
pub async fn sign_out(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<SignOutResponse>> {
    state.auth.sign_out(&auth.token).await?;
    Ok(Json(SignOutResponse { success: true }))
}

/// Current user and profile
///
/// GET /auth/session
pub async fn current_session(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<SessionResponse>> {
    let (user, profile) = state.auth.get_session_with_profile(&auth.token).await?;
    Ok(Json(SessionResponse { user, profile }))
}

/// GET /api/profile
pub async fn get_profile(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Profile>> {
    let user_id = auth.user.id;
    let profile = run_blocking(&state.db, move |db| profiles::fetch_profile(db, &user_id))
        .await?
        .ok_or(AppError::ProfileNotFound)?;
    Ok(Json(profile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
