/// Authentication middleware
use crate::{error::ServerError, state::AppState};
use accounts_core::UserId;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;

/// Authenticated caller, stored in request extensions by [`auth_middleware`]
/// Can be used as an extractor in handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    /// The token the request was authenticated with
    pub token: String,
}

impl AuthenticatedUser {
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }
}

/// Token from `Authorization: Bearer`, falling back to the named cookie
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|cookie| cookie.value_trimmed())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Middleware that validates the access token and checks it was not revoked
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let token = extract_token(request.headers(), &state.cookie.name)
        .ok_or_else(|| ServerError::Unauthorized("Missing access token".to_string()))?;

    let claims = state.auth.verify_token(&token)?;

    if !state.store.is_token_active(&token, Utc::now()).await? {
        tracing::warn!("Rejected revoked token for user {}", claims.sub);
        return Err(ServerError::Unauthorized("Token has been revoked".to_string()));
    }

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: claims.user_id(),
        token,
    });

    Ok(next.run(request).await)
}

/// Implement FromRequestParts so AuthenticatedUser can be used as an extractor
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ServerError::Unauthorized("Not authenticated".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(header::COOKIE, HeaderValue::from_static("AccessToken=from-cookie"));

        assert_eq!(extract_token(&headers, "AccessToken").as_deref(), Some("from-header"));
    }

    #[test]
    fn cookie_is_used_without_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; AccessToken=abc.def.ghi; lang=en"),
        );

        assert_eq!(extract_token(&headers, "AccessToken").as_deref(), Some("abc.def.ghi"));
        assert_eq!(extract_token(&headers, "Other"), None);
    }

    #[test]
    fn quoted_cookie_value_is_unwrapped() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("AccessToken=\"a.b.c\""));

        assert_eq!(extract_token(&headers, "AccessToken").as_deref(), Some("a.b.c"));
    }

    #[test]
    fn cookies_across_several_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(header::COOKIE, HeaderValue::from_static("AccessToken=abc"));

        assert_eq!(extract_token(&headers, "AccessToken").as_deref(), Some("abc"));
    }

    #[test]
    fn empty_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("AccessToken="));

        assert_eq!(extract_token(&headers, "AccessToken"), None);
    }

    #[test]
    fn missing_or_malformed_credentials() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_token(&headers, "AccessToken"), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(extract_token(&headers, "AccessToken"), None);
    }
}
