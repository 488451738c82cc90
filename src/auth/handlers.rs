use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        claims::Role,
        dto::{
            AuthResponse, CreateAdminRequest, LoginRequest, PublicUser, RefreshRequest,
            SignupRequest, UserResponse,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
        repo_types::User,
        services::{CredentialError, Provisioned},
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/create-admin", post(create_admin))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn issue_pair(keys: &JwtKeys, user: User) -> AppResult<AuthResponse> {
    let token = keys
        .sign_access(user.id, user.role)
        .map_err(|e| AppError::Internal(e.into()))?;
    let refresh_token = keys
        .sign_refresh(user.id, user.role)
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(AuthResponse {
        token,
        refresh_token,
        user: user.into(),
    })
}

fn session_cookie(keys: &JwtKeys, token: String) -> Cookie<'static> {
    Cookie::build((keys.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(keys.access_ttl_minutes()))
        .build()
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let Json(payload) = payload?;

    let role = payload.role.unwrap_or_default();
    if role == Role::Admin {
        warn!(email = %payload.email, "signup attempted to self-assign admin");
        return Err(CredentialError::AdminSignupForbidden.into());
    }

    let user = state
        .credentials
        .create_identity(&payload.name, &payload.email, &payload.password, role)
        .await?;

    info!(user_id = %user.id, "user signed up");
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            message: "User created successfully",
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn create_admin(
    State(state): State<AppState>,
    payload: Result<Json<CreateAdminRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let Json(payload) = payload?;

    if let Some(expected) = state.config.admin_creation_secret.as_deref() {
        if payload.secret.as_deref() != Some(expected) {
            warn!("create-admin with wrong or missing secret");
            return Err(AppError::unauthorized("Unauthorized"));
        }
    }

    let provisioned = state
        .credentials
        .provision_admin(&payload.name, &payload.email, &payload.password)
        .await?;

    Ok(match provisioned {
        Provisioned::Created(user) => {
            info!(user_id = %user.id, "admin user created");
            (
                StatusCode::CREATED,
                Json(UserResponse {
                    message: "Admin user created successfully",
                    user: user.into(),
                }),
            )
        }
        Provisioned::Elevated(user) => {
            info!(user_id = %user.id, "existing user elevated to admin");
            (
                StatusCode::OK,
                Json(UserResponse {
                    message: "User already exists. Role updated to admin.",
                    user: user.into(),
                }),
            )
        }
    })
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let Json(payload) = payload?;

    let Some(user) = state
        .credentials
        .verify_credentials(&payload.email, &payload.password)
        .await?
    else {
        return Err(AppError::unauthorized("Invalid credentials"));
    };

    info!(user_id = %user.id, role = %user.role, "user logged in");
    let response = issue_pair(&state.jwt, user)?;
    let jar = jar.add(session_cookie(&state.jwt, response.token.clone()));
    Ok((jar, Json(response)))
}

#[instrument(skip(state, jar, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let Json(payload) = payload?;

    let claims = state.jwt.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        AppError::unauthorized("Invalid or expired token")
    })?;

    // role is re-read so a promotion since the last login takes effect
    let user = state
        .credentials
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::unauthorized("User not found"))?;

    let response = issue_pair(&state.jwt, user)?;
    let jar = jar.add(session_cookie(&state.jwt, response.token.clone()));
    Ok((jar, Json(response)))
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<Value>) {
    let removal = Cookie::build((state.jwt.cookie_name.clone(), "")).path("/").build();
    (jar.remove(removal), Json(json!({ "message": "Logged out" })))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = state
        .credentials
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("User not found"))?;
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request},
    };
    use serde_json::json;
    use tower::ServiceExt;

    use crate::{app::build_app, state::AppState};

    use super::*;

    async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value, Option<String>) {
        let res = app
            .clone()
            .oneshot(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = res.status();
        let cookie = res
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value, cookie)
    }

    #[tokio::test]
    async fn signup_returns_user_without_password() {
        let app = build_app(AppState::fake());
        let (status, body, _) = post_json(
            &app,
            "/auth/signup",
            json!({"name": "Demo", "email": "Demo@UGA.edu", "password": "test123!"}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["email"], "demo@uga.edu");
        assert_eq!(body["user"]["role"], "student");
        let text = body.to_string();
        assert!(!text.contains("password"));
        assert!(!text.contains("argon2"));
    }

    #[tokio::test]
    async fn signup_rejects_duplicates_short_passwords_and_admin_role() {
        let app = build_app(AppState::fake());
        let ok = json!({"name": "A", "email": "a@uga.edu", "password": "secret1"});
        assert_eq!(post_json(&app, "/auth/signup", ok).await.0, StatusCode::CREATED);

        let (status, body, _) = post_json(
            &app,
            "/auth/signup",
            json!({"name": "B", "email": " A@uga.edu", "password": "secret2"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "User with this email already exists");

        let (status, _, _) = post_json(
            &app,
            "/auth/signup",
            json!({"name": "C", "email": "c@uga.edu", "password": "12345"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) = post_json(
            &app,
            "/auth/signup",
            json!({"name": "D", "email": "d@uga.edu", "password": "secret1", "role": "admin"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(
                Request::post("/auth/signup")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_sets_cookie_and_me_works() {
        let app = build_app(AppState::fake());
        post_json(
            &app,
            "/auth/signup",
            json!({"name": "A", "email": "a@uga.edu", "password": "secret1"}),
        )
        .await;

        let (status, body, cookie) = post_json(
            &app,
            "/auth/login",
            json!({"email": "A@uga.edu", "password": "secret1"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let cookie = cookie.expect("session cookie set");
        assert!(cookie.starts_with("session="));
        assert!(cookie.contains("HttpOnly"));

        let token = body["token"].as_str().unwrap();
        let res = app
            .clone()
            .oneshot(
                Request::get("/me")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn login_failures_look_identical() {
        let app = build_app(AppState::fake());
        post_json(
            &app,
            "/auth/signup",
            json!({"name": "A", "email": "a@uga.edu", "password": "secret1"}),
        )
        .await;

        let (s1, b1, _) =
            post_json(&app, "/auth/login", json!({"email": "a@uga.edu", "password": "nope!!"})).await;
        let (s2, b2, _) =
            post_json(&app, "/auth/login", json!({"email": "x@uga.edu", "password": "nope!!"})).await;
        assert_eq!(s1, StatusCode::UNAUTHORIZED);
        assert_eq!(s1, s2);
        assert_eq!(b1, b2);
    }

    #[tokio::test]
    async fn me_requires_session() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(Request::get("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_admin_checks_secret_then_creates_or_elevates() {
        let state = AppState::fake_with_admin_secret("letmein");
        let app = build_app(state);

        let (status, _, _) = post_json(
            &app,
            "/auth/create-admin",
            json!({"secret": "wrong", "name": "Coach", "email": "coach@uga.edu", "password": "admin123!"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body, _) = post_json(
            &app,
            "/auth/create-admin",
            json!({"secret": "letmein", "name": "Coach", "email": "coach@uga.edu", "password": "admin123!"}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["role"], "admin");

        post_json(
            &app,
            "/auth/signup",
            json!({"name": "S", "email": "s@uga.edu", "password": "student1"}),
        )
        .await;
        let (status, body, _) = post_json(
            &app,
            "/auth/create-admin",
            json!({"secret": "letmein", "name": "S", "email": "s@uga.edu", "password": "whatever"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["role"], "admin");
    }

    #[tokio::test]
    async fn refresh_picks_up_promotion() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        post_json(
            &app,
            "/auth/signup",
            json!({"name": "S", "email": "s@uga.edu", "password": "student1"}),
        )
        .await;
        let (_, body, _) =
            post_json(&app, "/auth/login", json!({"email": "s@uga.edu", "password": "student1"})).await;
        assert_eq!(body["user"]["role"], "student");
        let refresh_token = body["refresh_token"].as_str().unwrap().to_string();

        state.credentials.promote_to_admin("s@uga.edu").await.unwrap();

        let (status, body, _) =
            post_json(&app, "/auth/refresh", json!({"refresh_token": refresh_token})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["role"], "admin");
        let claims = state.jwt.verify_access(body["token"].as_str().unwrap()).unwrap();
        assert_eq!(claims.role, Role::Admin);

        // a session token is not a refresh token
        let session = body["token"].clone();
        let (status, _, _) = post_json(&app, "/auth/refresh", json!({"refresh_token": session})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_expires_cookie() {
        let app = build_app(AppState::fake());
        let (status, _, cookie) = post_json(&app, "/auth/logout", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        let cookie = cookie.expect("removal cookie");
        assert!(cookie.starts_with("session="));
        assert!(cookie.contains("Max-Age=0"));
    }
}
