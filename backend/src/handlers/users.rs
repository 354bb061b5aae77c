//! Account HTTP handlers
//!
//! Login and refresh hand the token pair out both in the body and as
//! httpOnly cookies; logout clears the cookies again.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::error::ApiResult;
use crate::middleware::auth::{AuthenticatedUser, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::models::{
    ApiResponse, ChangePasswordRequest, LoginRequest, LoginResponse, RefreshTokenRequest,
    RegisterRequest, TokenPair, UpdateAccountRequest, UserDataResponse, UserResponse,
};
use crate::state::{AppState, CookieSettings};

fn token_cookie(name: &'static str, value: String, settings: CookieSettings) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(settings.secure)
        .same_site(SameSite::Lax)
        .build()
}

fn with_session_cookies(jar: CookieJar, pair: &TokenPair, settings: CookieSettings) -> CookieJar {
    jar.add(token_cookie(
        ACCESS_TOKEN_COOKIE,
        pair.access_token.clone(),
        settings,
    ))
    .add(token_cookie(
        REFRESH_TOKEN_COOKIE,
        pair.refresh_token.clone(),
        settings,
    ))
}

/// Expire both auth cookies, whichever of them the request carried
fn without_session_cookies(jar: CookieJar, settings: CookieSettings) -> CookieJar {
    let expired = |name: &'static str| {
        let mut cookie = token_cookie(name, String::new(), settings);
        cookie.make_removal();
        cookie
    };
    jar.add(expired(ACCESS_TOKEN_COOKIE))
        .add(expired(REFRESH_TOKEN_COOKIE))
}

/// POST /users/register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    let Json(req) = payload?;
    let user = state.auth_service.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(201, "User registered successfully", user)),
    ))
}

/// POST /users/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<(CookieJar, Json<ApiResponse<LoginResponse>>)> {
    let Json(req) = payload?;
    let session = state.auth_service.login(req).await?;

    let pair = TokenPair {
        access_token: session.access_token.clone(),
        refresh_token: session.refresh_token.clone(),
    };
    let jar = with_session_cookies(jar, &pair, state.cookies);

    Ok((
        jar,
        Json(ApiResponse::new(200, "User logged in successfully", session)),
    ))
}

/// POST /users/logout
pub async fn logout(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<ApiResponse<()>>)> {
    state.auth_service.logout(user.id).await?;

    Ok((
        without_session_cookies(jar, state.cookies),
        Json(ApiResponse::new(200, "User logged out successfully", ())),
    ))
}

/// POST /users/refresh-access-token
///
/// The `RefreshToken` cookie wins over a `refreshToken` body field.
pub async fn refresh_access_token(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Option<Json<RefreshTokenRequest>>,
) -> ApiResult<(CookieJar, Json<ApiResponse<TokenPair>>)> {
    let from_cookie = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty());
    let from_body = payload.and_then(|Json(body)| body.refresh_token);

    let pair = state
        .auth_service
        .refresh(from_cookie.or(from_body).as_deref())
        .await?;
    let jar = with_session_cookies(jar, &pair, state.cookies);

    Ok((
        jar,
        Json(ApiResponse::new(200, "Access token refreshed", pair)),
    ))
}

/// POST /users/change-password
pub async fn change_password(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let Json(req) = payload?;
    state.auth_service.change_password(user.id, req).await?;

    Ok(Json(ApiResponse::new(
        200,
        "Password changed successfully",
        (),
    )))
}

/// GET|POST /users/get-current-user
pub async fn get_current_user(
    AuthenticatedUser(user): AuthenticatedUser,
) -> Json<ApiResponse<UserResponse>> {
    Json(ApiResponse::new(200, "Current user fetched successfully", user))
}

/// PATCH /users/update-user-details
pub async fn update_user_details(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    payload: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let Json(req) = payload?;
    let user = state.auth_service.update_account(user.id, req).await?;

    Ok(Json(ApiResponse::new(
        200,
        "Account details updated successfully",
        user,
    )))
}

/// GET /users/get-current-user-data
pub async fn get_current_user_data(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> ApiResult<Json<ApiResponse<UserDataResponse>>> {
    let data = state.auth_service.user_data(user.id).await?;
    Ok(Json(ApiResponse::new(
        200,
        "User data fetched successfully",
        data,
    )))
}
