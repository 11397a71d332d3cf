use axum::{
    extract::State,
    http::{header::ACCESS_CONTROL_EXPOSE_HEADERS, HeaderName},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use domain::Credentials;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    auth::AUTH_TOKEN_HEADER, character_routes, error::ApiError, species_routes, state::AppState,
    user_routes,
};

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/login", post(login))
        .merge(user_routes::routes())
        .merge(character_routes::routes())
        .merge(species_routes::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// 令牌通过 `auth-token` 响应头返回，响应体只有用户信息
async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.user_service.login(credentials).await?;

    let headers = [
        (HeaderName::from_static(AUTH_TOKEN_HEADER), session.token),
        (ACCESS_CONTROL_EXPOSE_HEADERS, AUTH_TOKEN_HEADER.to_string()),
    ];
    Ok((headers, Json(session.user)))
}
