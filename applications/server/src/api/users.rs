/// User account API routes
use crate::{
    error::{Result, ServerError},
    middleware::AuthenticatedUser,
    services::{
        users::{AccountRequest, LoginRequest},
        LoginResult,
    },
    state::{AppState, CookieSettings},
};
use accounts_core::{ListUsersParams, User, UserId, UserPage};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::{
    cookie::{Cookie, CookieJar, SameSite},
    WithRejection,
};
use chrono::{DateTime, Utc};
use cookie::time::Duration;
use serde::Deserialize;

/// JSON body whose parse failures answer as `invalid_input`
type JsonBody<T> = WithRejection<Json<T>, ServerError>;

/// Query string whose parse failures answer as `invalid_input`
type QueryParams<T> = WithRejection<Query<T>, ServerError>;

#[derive(Debug, Deserialize)]
pub struct AddRoleRequest {
    pub role: String,
}

/// Cookie carrying the access token until `expires_at`
pub fn token_cookie(
    settings: &CookieSettings,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Cookie<'static> {
    let max_age = (expires_at - Utc::now()).num_seconds().max(0);
    base_cookie(settings, token.to_string())
        .max_age(Duration::seconds(max_age))
        .build()
}

/// Expired, empty cookie that makes the client drop the token
pub fn removal_cookie(settings: &CookieSettings) -> Cookie<'static> {
    base_cookie(settings, String::new())
        .max_age(Duration::ZERO)
        .build()
}

fn base_cookie(settings: &CookieSettings, value: String) -> cookie::CookieBuilder<'static> {
    Cookie::build((settings.name.clone(), value))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .secure(settings.secure)
}

/// POST /api/users/register
pub async fn register(
    State(app_state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<AccountRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = app_state.users.register(&req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/users/login
/// Returns the token and also sets it as a cookie
pub async fn login(
    State(app_state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(req), _): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse> {
    let result: LoginResult = app_state.users.login(&req).await?;
    let cookie = token_cookie(&app_state.cookie, &result.access_token, result.expires_at);

    Ok((jar.add(cookie), Json(result)))
}

/// POST /api/users/logout
pub async fn logout(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    jar: CookieJar,
) -> Result<impl IntoResponse> {
    app_state.users.logout(&auth.token).await?;
    tracing::info!("User {} logged out", auth.user_id());

    Ok((StatusCode::NO_CONTENT, jar.add(removal_cookie(&app_state.cookie))))
}

/// GET /api/users
pub async fn list_users(
    State(app_state): State<AppState>,
    _auth: AuthenticatedUser,
    WithRejection(Query(params), _): QueryParams<ListUsersParams>,
) -> Result<Json<UserPage>> {
    let page = app_state.users.list_users(&params).await?;
    Ok(Json(page))
}

/// GET /api/users/:id
pub async fn get_user(
    State(app_state): State<AppState>,
    _auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<User>> {
    let id = UserId::parse(&id)?;
    let user = app_state.users.get_user(&id).await?;
    Ok(Json(user))
}

/// PUT /api/users/:id
/// Replaces every field; omitted fields fail validation
pub async fn update_user(
    State(app_state): State<AppState>,
    _auth: AuthenticatedUser,
    Path(id): Path<String>,
    WithRejection(Json(req), _): JsonBody<AccountRequest>,
) -> Result<Json<User>> {
    let id = UserId::parse(&id)?;
    let user = app_state.users.update_user(&id, &req).await?;
    Ok(Json(user))
}

/// DELETE /api/users/:id
pub async fn delete_user(
    State(app_state): State<AppState>,
    _auth: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = UserId::parse(&id)?;
    app_state.users.delete_user(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/users/:id/roles
pub async fn add_role(
    State(app_state): State<AppState>,
    _auth: AuthenticatedUser,
    Path(id): Path<String>,
    WithRejection(Json(req), _): JsonBody<AddRoleRequest>,
) -> Result<Json<User>> {
    let id = UserId::parse(&id)?;
    let user = app_state.users.add_role(&id, &req.role).await?;
    Ok(Json(user))
}
