//! HTTP routes.
//!
//! Public routes (`/health`, `/api/v1/auth/*`) run no gate. `/api/v1/users`
//! runs [`require_auth`]; `/api/v1/admin` additionally runs
//! [`require_role`] with [`Role::Admin`].

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
};
use serde_json::{Value, json};

use crate::auth::{
    CredentialHasher, HashingPool, Principal, Role, TokenManager, require_auth, require_role,
};
use crate::config::{ConfigError, ServerConfig};
use crate::error::ApiError;
use crate::time::TimeSource;
use crate::users::{
    LoginRequest, RegisterRequest, UpdateUserRequest, UserRepository, UserResponse, UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub tokens: Arc<TokenManager>,
    pub time_source: Arc<dyn TimeSource>,
}

impl AppState {
    /// Wire every component from the loaded configuration.
    ///
    /// # Errors
    /// Returns a `ConfigError` if the secret or hash cost is rejected.
    pub fn from_config(
        config: &ServerConfig,
        repository: Arc<dyn UserRepository>,
        time_source: Arc<dyn TimeSource>,
    ) -> Result<Self, ConfigError> {
        let tokens = TokenManager::new(config.jwt_secret.as_bytes(), Arc::clone(&time_source))
            .map_err(|e| ConfigError::InvalidValue {
                name: "INTRANET_JWT_SECRET".to_string(),
                message: e.to_string(),
            })?;
        let hasher =
            CredentialHasher::new(config.hash_cost).map_err(|e| ConfigError::InvalidValue {
                name: "INTRANET_HASH_COST".to_string(),
                message: e.to_string(),
            })?;

        let tokens = Arc::new(tokens);
        let users = UserService::new(
            repository,
            HashingPool::new(hasher, config.hash_concurrency),
            Arc::clone(&tokens),
            config.token_ttl,
            Arc::clone(&time_source),
        );

        Ok(Self {
            users: Arc::new(users),
            tokens,
            time_source,
        })
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let tokens = Arc::clone(&state.tokens);

    // Layers run bottom-up: the auth gate wraps the role check.
    let user_routes = Router::new()
        .route("/", get(list_users))
        .route("/{id}", get(get_user).put(update_user))
        .route_layer(middleware::from_fn_with_state(Arc::clone(&tokens), require_auth));

    let admin_routes = Router::new()
        .route("/users/{id}", delete(delete_user))
        .route_layer(middleware::from_fn_with_state(Role::Admin, require_role))
        .route_layer(middleware::from_fn_with_state(tokens, require_auth));

    let auth_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login));

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/admin", admin_routes);

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": state.time_source.now_secs(),
    }))
}

async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(request) = body.map_err(reject_body)?;
    let user = state.users.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "user created",
            "user": UserResponse::from(&user),
        })),
    ))
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = body.map_err(reject_body)?;
    let (token, user) = state.users.login(request).await?;

    Ok(Json(json!({
        "message": "login succeeded",
        "token": token,
        "user": UserResponse::from(&user),
    })))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let users: Vec<UserResponse> = state.users.list()?.iter().map(UserResponse::from).collect();
    Ok(Json(json!({ "users": users })))
}

async fn get_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(id) = id.map_err(reject_id)?;
    let user = state.users.get(id)?;
    Ok(Json(json!({ "user": UserResponse::from(&user) })))
}

async fn update_user(
    State(state): State<AppState>,
    principal: Principal,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(id) = id.map_err(reject_id)?;
    let Json(request) = body.map_err(reject_body)?;
    let user = state.users.update(&principal, id, request).await?;

    Ok(Json(json!({
        "message": "user updated",
        "user": UserResponse::from(&user),
    })))
}

async fn delete_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(id) = id.map_err(reject_id)?;
    state.users.delete(id)?;
    Ok(Json(json!({ "message": "user deleted" })))
}

fn reject_body(rejection: JsonRejection) -> ApiError {
    tracing::debug!("rejected request body: {rejection}");
    ApiError::BadRequest("invalid request body".to_string())
}

fn reject_id(rejection: PathRejection) -> ApiError {
    tracing::debug!("rejected path: {rejection}");
    ApiError::BadRequest("invalid user id".to_string())
}
