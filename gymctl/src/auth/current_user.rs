use crate::{
    api::models::users::CurrentUser,
    auth::session,
    errors::{Error, Result},
    AppState,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{debug, instrument, trace};

/// Extract user from JWT session cookie if present and valid
/// Returns:
/// - None: No JWT cookie present
/// - Some(Ok(user)): Valid JWT found and verified
/// - Some(Err(error)): JWT cookie present but invalid/malformed
#[instrument(skip(parts, config))]
fn try_jwt_session_auth(parts: &Parts, config: &crate::config::Config) -> Option<Result<CurrentUser>> {
    let cookie_header = parts.headers.get(axum::http::header::COOKIE)?;

    let cookie_str = match cookie_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid cookie header: {e}"),
            }))
        }
    };
    let cookie_name = &config.auth.native.session.cookie_name;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=') {
            if name == cookie_name {
                match session::verify_session_token(value, config) {
                    Ok(user) => return Some(Ok(user)),
                    Err(_) => {
                        // Invalid/expired token; expired sessions are routine,
                        // so keep scanning rather than propagating
                        continue;
                    }
                }
            }
        }
    }
    None
}

/// Extract user from a bearer session token in the Authorization header
/// Returns:
/// - None: No Authorization header or not a Bearer token
/// - Some(Ok(user)): Valid session token
/// - Some(Err(error)): Bearer token present but invalid or expired
#[instrument(skip(parts, config))]
fn try_bearer_token_auth(parts: &Parts, config: &crate::config::Config) -> Option<Result<CurrentUser>> {
    let auth_header = parts.headers.get(axum::http::header::AUTHORIZATION)?;

    let auth_str = match auth_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid authorization header: {e}"),
            }))
        }
    };

    let token = auth_str.strip_prefix("Bearer ")?;

    Some(session::verify_session_token(token, config))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // Each method returns Option<Result<CurrentUser>>:
        // - None means the auth method is not applicable (no credentials present)
        // - Some(Ok(user)) means successful authentication
        // - Some(Err(error)) means auth credentials were present but invalid
        //
        // Try all methods and return the first successful one; fail only if
        // every method either wasn't present or failed.

        if !state.config.auth.native.enabled {
            trace!("Native authentication disabled");
            return Err(Error::Unauthenticated { message: None });
        }

        let mut auth_errors = Vec::new();

        match try_bearer_token_auth(parts, &state.config) {
            Some(Ok(user)) => {
                debug!("Found bearer token authenticated user: {}", user.id);
                return Ok(user);
            }
            Some(Err(e)) => {
                trace!("Bearer token authentication failed: {:?}", e);
                auth_errors.push(("Bearer token", e));
            }
            None => {
                trace!("No bearer token authentication attempted");
            }
        }

        match try_jwt_session_auth(parts, &state.config) {
            Some(Ok(user)) => {
                debug!("Found JWT session authenticated user: {}", user.id);
                return Ok(user);
            }
            Some(Err(e)) => {
                trace!("JWT session authentication failed: {:?}", e);
                auth_errors.push(("JWT session", e));
            }
            None => {
                trace!("No JWT session authentication attempted");
            }
        }

        if auth_errors.is_empty() {
            trace!("No authentication credentials found in request");
        } else {
            trace!("All authentication attempts failed ({}): {:?}", auth_errors.len(), auth_errors);
        }
        Err(Error::Unauthenticated { message: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::create_session_token;
    use crate::test_utils::create_test_config;
    use axum::extract::FromRequestParts as _;
    use sqlx::PgPool;
    use uuid::Uuid;

    fn test_user() -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            username: "testuser".to_string(),
            is_admin: true,
            display_name: None,
        }
    }

    fn parts_with_header(header_name: &str, header_value: &str) -> Parts {
        let request = axum::http::Request::builder()
            .uri("http://localhost/test")
            .header(header_name, header_value)
            .body(())
            .unwrap();

        let (parts, _body) = request.into_parts();
        parts
    }

    fn state_with(pool: PgPool) -> AppState {
        AppState::builder().db(pool).config(create_test_config()).build()
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_session_cookie_extraction(pool: PgPool) {
        let state = state_with(pool);
        let user = test_user();
        let token = create_session_token(&user, &state.config).unwrap();

        let cookie_name = &state.config.auth.native.session.cookie_name;
        let mut parts = parts_with_header("cookie", &format!("other=1; {cookie_name}={token}"));

        let extracted = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(extracted.id, user.id);
        assert!(extracted.is_admin);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_bearer_token_extraction(pool: PgPool) {
        let state = state_with(pool);
        let user = test_user();
        let token = create_session_token(&user, &state.config).unwrap();

        let mut parts = parts_with_header("authorization", &format!("Bearer {token}"));

        let extracted = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(extracted.username, "testuser");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_invalid_bearer_token_is_unauthorized(pool: PgPool) {
        let state = state_with(pool);
        let mut parts = parts_with_header("authorization", "Bearer not-a-real-token");

        let error = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(error.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_missing_credentials_is_unauthorized(pool: PgPool) {
        let state = state_with(pool);
        let request = axum::http::Request::builder().uri("http://localhost/test").body(()).unwrap();
        let (mut parts, _body) = request.into_parts();

        let error = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(error.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
