use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use application::services::CreateSpeciesRequest;
use domain::Species;
use serde::Deserialize;

use crate::{
    error::{found_or_404, ApiError},
    state::AppState,
};

#[derive(Debug, Deserialize)]
struct CreateSpeciesPayload {
    species_name: String,
    description: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/species", post(create_species).get(list_species))
        .route("/species/{name}", get(get_species_by_name))
}

async fn create_species(
    State(state): State<AppState>,
    Json(payload): Json<CreateSpeciesPayload>,
) -> Result<Json<Species>, ApiError> {
    let request = CreateSpeciesRequest {
        species_name: payload.species_name,
        description: payload.description,
    };
    Ok(Json(state.species_service.add(request).await?))
}

async fn list_species(State(state): State<AppState>) -> Result<Json<HashSet<Species>>, ApiError> {
    Ok(Json(state.species_service.find_all().await?))
}

async fn get_species_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Species>, ApiError> {
    let lookup = state.species_service.find_by_name(&name).await?;
    found_or_404(lookup, "species").map(Json)
}
