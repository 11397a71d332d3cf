use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use application::{
    services::{CreateCharacterRequest, UpdateCharacterRequest},
    ApplicationError,
};
use domain::{Character, UserId};
use serde::Deserialize;
use tracing::warn;

use crate::{
    auth::AuthenticatedUser,
    error::{found_or_404, ApiError},
    state::AppState,
};

/// 所有者取自令牌，请求体中不接受 owner_id
#[derive(Debug, Deserialize)]
struct CreateCharacterPayload {
    name: String,
    image_url: Option<String>,
    species_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct UpdateCharacterPayload {
    id: i32,
    name: String,
    image_url: Option<String>,
    species_id: Option<i32>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/characters", get(list_characters))
        .route("/characters/add", post(create_character))
        .route("/characters/update", put(update_character))
        .route(
            "/characters/{id}",
            get(get_character).delete(delete_character),
        )
        .route("/characters/find/{owner_id}", get(find_by_owner))
        .route("/characters/name/{name}", get(find_by_name))
        .route("/characters/species/{species_id}", get(find_by_species))
}

async fn list_characters(
    State(state): State<AppState>,
) -> Result<Json<HashSet<Character>>, ApiError> {
    Ok(Json(state.character_service.find_all().await?))
}

async fn get_character(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Character>, ApiError> {
    let lookup = state.character_service.get_by_id(id).await?;
    found_or_404(lookup, "character").map(Json)
}

async fn find_by_owner(
    State(state): State<AppState>,
    Path(owner_id): Path<i32>,
) -> Result<Json<HashSet<Character>>, ApiError> {
    Ok(Json(state.character_service.find_by_owner_id(owner_id).await?))
}

async fn find_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Character>, ApiError> {
    Ok(Json(state.character_service.find_by_name(&name).await?))
}

async fn find_by_species(
    State(state): State<AppState>,
    Path(species_id): Path<i32>,
) -> Result<Json<Vec<Character>>, ApiError> {
    Ok(Json(
        state.character_service.find_by_species_id(species_id).await?,
    ))
}

async fn create_character(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(payload): Json<CreateCharacterPayload>,
) -> Result<Json<Character>, ApiError> {
    let request = CreateCharacterRequest {
        name: payload.name,
        image_url: payload.image_url,
        owner_id: caller.value(),
        species_id: payload.species_id,
    };
    Ok(Json(state.character_service.add_character(request).await?))
}

/// 所有权不可转移：保存时沿用原所有者
async fn update_character(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(payload): Json<UpdateCharacterPayload>,
) -> Result<Json<Character>, ApiError> {
    let existing = owned_character(&state, payload.id, caller).await?;

    let request = UpdateCharacterRequest {
        id: payload.id,
        name: payload.name,
        image_url: payload.image_url,
        owner_id: existing.owner_id.value(),
        species_id: payload.species_id,
    };
    Ok(Json(state.character_service.update(request).await?))
}

async fn delete_character(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    owned_character(&state, id, caller).await?;
    state.character_service.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn owned_character(
    state: &AppState,
    id: i32,
    caller: UserId,
) -> Result<Character, ApiError> {
    let lookup = state.character_service.get_by_id(id).await?;
    let character = found_or_404(lookup, "character")?;
    if !character.is_owned_by(caller) {
        warn!(character_id = id, caller = %caller, "caller does not own character");
        return Err(ApplicationError::Authorization.into());
    }
    Ok(character)
}
