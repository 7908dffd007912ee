use axum::{extract::State, Json};

use crate::{
    api::models::{
        auth::{AuthResponse, AuthSuccessResponse, LoginRequest, LoginResponse, LogoutResponse},
        users::{CurrentUser, UserResponse},
    },
    auth::{password, session},
    db::handlers::{Repository, Users},
    errors::Error,
    AppState,
};

/// Login with username and password
#[utoipa::path(
    post,
    path = "/authentication/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<LoginResponse, Error> {
    if !state.config.auth.native.enabled {
        return Err(Error::BadRequest {
            message: "Native authentication is disabled".to_string(),
        });
    }
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut user_repo = Users::new(&mut pool_conn);

    let user = user_repo
        .get_user_by_username(&request.username)
        .await?
        .ok_or_else(|| Error::Unauthenticated {
            message: Some("Invalid username or password".to_string()),
        })?;

    // An admin seeded without a password cannot log in yet
    let password_hash = user.password_hash.clone().ok_or_else(|| Error::Unauthenticated {
        message: Some("Invalid username or password".to_string()),
    })?;

    // Verify password on a blocking thread to avoid blocking the async runtime
    let candidate = request.password.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&candidate, &password_hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(Error::Unauthenticated {
            message: Some("Invalid username or password".to_string()),
        });
    }

    let current_user = CurrentUser::from(user.clone());
    let token = session::create_session_token(&current_user, &state.config)?;
    let cookie = create_session_cookie(&token, &state.config);

    let auth_response = AuthResponse {
        user: UserResponse::from(user),
        message: "Login successful".to_string(),
    };

    Ok(LoginResponse { auth_response, cookie })
}

/// Logout (clear session)
#[utoipa::path(
    post,
    path = "/authentication/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful", body = AuthSuccessResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> Result<LogoutResponse, Error> {
    // Expired cookie clears the session client-side; tokens themselves stay
    // valid until they expire
    let cookie = format!(
        "{}=; Path=/; HttpOnly; Secure; SameSite=Strict; Max-Age=0",
        state.config.auth.native.session.cookie_name
    );

    let auth_response = AuthSuccessResponse {
        message: "Logout successful".to_string(),
    };

    Ok(LogoutResponse { auth_response, cookie })
}

/// Get the currently authenticated user
#[utoipa::path(
    get,
    path = "/authentication/me",
    tag = "authentication",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(
        ("session_token" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn me(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<UserResponse>, Error> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut pool_conn);

    let user = user_repo.get_by_id(current_user.id).await?.ok_or_else(|| Error::Unauthenticated {
        message: Some("User not found".to_string()),
    })?;

    Ok(Json(UserResponse::from(user)))
}

/// Helper function to create a session cookie
fn create_session_cookie(token: &str, config: &crate::config::Config) -> String {
    let session_config = &config.auth.native.session;
    let max_age = config.auth.security.jwt_expiry.as_secs();

    format!(
        "{}={}; Path=/; HttpOnly; Secure={}; SameSite={}; Max-Age={}",
        session_config.cookie_name, token, session_config.cookie_secure, session_config.cookie_same_site, max_age
    )
}
