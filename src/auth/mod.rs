pub mod jwt;
pub mod password;
pub mod policy;

use axum::{
    async_trait,
    extract::{FromRequestParts, OriginalUri},
    http::{header::LOCATION, request::Parts, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use axum_extra::headers::Cookie;
use axum_extra::TypedHeader;
use chrono::Utc;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE_NAME: &str = "sessionid";
pub const LOGIN_PATH: &str = "/login/";

// Everything but unreserved characters and the path separator.
const NEXT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: uuid::Uuid,
    pub username: String,
    pub role: String,
}

/// Rejection for pages that need a signed-in user.
#[derive(Debug)]
pub struct LoginRedirect {
    next: String,
}

impl LoginRedirect {
    pub fn new(next: impl Into<String>) -> Self {
        Self { next: next.into() }
    }

    pub fn location(&self) -> String {
        login_url(&self.next)
    }
}

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        found(&self.location())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = LoginRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let next = requested_path(parts);

        let TypedHeader(cookies) = TypedHeader::<Cookie>::from_request_parts(parts, state)
            .await
            .map_err(|_| LoginRedirect::new(next.clone()))?;

        let token = cookies
            .get(SESSION_COOKIE_NAME)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| LoginRedirect::new(next.clone()))?;

        let claims = state.jwt.verify_token(token).map_err(|err| {
            tracing::debug!(error = %err, "rejected session token");
            LoginRedirect::new(next.clone())
        })?;

        Ok(AuthenticatedUser {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
        })
    }
}

/// The signed-in user, if any. Never rejects.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<AuthenticatedUser>);

impl OptionalUser {
    pub fn username(&self) -> String {
        self.0
            .as_ref()
            .map(|user| user.username.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(
            AuthenticatedUser::from_request_parts(parts, state).await.ok(),
        ))
    }
}

/// Path and query the client asked for, before any router nesting.
fn requested_path(parts: &Parts) -> String {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or(&parts.uri);
    path_and_query(uri)
}

pub fn path_and_query(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

pub fn login_url(next: &str) -> String {
    format!(
        "{LOGIN_PATH}?next={}",
        utf8_percent_encode(next, NEXT_ENCODE_SET)
    )
}

/// Accepts only same-site absolute paths as post-login targets.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.map(str::trim).filter(|candidate| {
        candidate.starts_with('/') && !candidate.starts_with("//") && !candidate.contains('\\')
    })
}

/// 302 Found, the status browsers follow with a GET.
pub fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(LOCATION, value)]).into_response(),
        Err(err) => AppError::internal(format!("invalid redirect location {location:?}: {err}"))
            .into_response(),
    }
}

pub fn session_cookie(state: &AppState, token: &str) -> anyhow::Result<HeaderValue> {
    let expiry = state.jwt.expiry();
    let expires_at = Utc::now() + expiry;

    let mut parts = vec![format!("{}={}", SESSION_COOKIE_NAME, token)];
    parts.push("Path=/".into());
    parts.push("HttpOnly".into());
    parts.push("SameSite=Lax".into());
    parts.push(format!("Max-Age={}", expiry.num_seconds()));
    parts.push(format!("Expires={}", expires_at.to_rfc2822()));
    if state.config.session_cookie_secure {
        parts.push("Secure".into());
    }
    if let Some(domain) = &state.config.session_cookie_domain {
        parts.push(format!("Domain={}", domain));
    }

    Ok(HeaderValue::from_str(&parts.join("; "))?)
}

pub fn clear_session_cookie(state: &AppState) -> anyhow::Result<HeaderValue> {
    let mut parts = vec![format!("{}=", SESSION_COOKIE_NAME)];
    parts.push("Path=/".into());
    parts.push("HttpOnly".into());
    parts.push("SameSite=Lax".into());
    parts.push("Max-Age=0".into());
    parts.push("Expires=Thu, 01 Jan 1970 00:00:00 GMT".into());
    if state.config.session_cookie_secure {
        parts.push("Secure".into());
    }
    if let Some(domain) = &state.config.session_cookie_domain {
        parts.push(format!("Domain={}", domain));
    }

    Ok(HeaderValue::from_str(&parts.join("; "))?)
}
