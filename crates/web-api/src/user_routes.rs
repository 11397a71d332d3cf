use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use application::{
    services::{RegisterUserRequest, UpdateUserRequest},
    ApplicationError,
};
use domain::User;
use serde::Deserialize;

use crate::{
    auth::AuthenticatedUser,
    error::{found_or_404, ApiError},
    state::AppState,
};

#[derive(Debug, Deserialize)]
struct RegisterPayload {
    username: String,
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct UpdateUserPayload {
    id: i32,
    username: String,
    email: String,
    password: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            post(register_user).get(list_users).put(update_user),
        )
        .route("/users/{id}", get(get_user).delete(delete_user))
        .route("/users/username/{username}", get(get_user_by_username))
}

async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let request = RegisterUserRequest {
        username: payload.username,
        email: payload.email,
        password: payload.password,
    };

    let user = state.user_service.add(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<HashSet<User>>, ApiError> {
    Ok(Json(state.user_service.find_all().await?))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<User>, ApiError> {
    let lookup = state.user_service.get_by_id(id).await?;
    found_or_404(lookup, "user").map(Json)
}

async fn get_user_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.user_service.get_by_username(&username).await?))
}

/// 只能修改自己仍然存在的账号；已删除账号的旧令牌不能借此重建用户
async fn update_user(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<Json<User>, ApiError> {
    if caller.value() != payload.id {
        return Err(ApplicationError::Authorization.into());
    }
    found_or_404(state.user_service.get_by_id(payload.id).await?, "user")?;

    let request = UpdateUserRequest {
        id: payload.id,
        username: payload.username,
        email: payload.email,
        password: payload.password,
    };
    Ok(Json(state.user_service.update(request).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if caller.value() != id {
        return Err(ApplicationError::Authorization.into());
    }

    state.user_service.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
