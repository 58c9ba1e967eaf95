use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    AppState,
    admin::{self, FormMode, MovieForm},
    catalog,
    error::{AppError, AppResult},
    models::{ApiResponse, Category, MovieRecord},
    resolver::Resolver,
    tmdb::{ListKind, SearchPage},
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/movies",
            get(list_movies).post(create_movie).put(update_movie).delete(delete_movie),
        )
        .route("/api/movies/{id}", get(get_movie))
        .route("/api/display/{category}/{id}", get(display))
        .route("/api/catalog", get(catalog_feed))
        .route("/api/home", get(home))
        .route("/api/search/{category}", get(search))
        .route("/api/lists/{kind}", get(lists))
        .route("/api/admin/movies", post(admin_save))
        .route("/api/admin/movies/{id}", get(admin_load))
        .route("/api/admin/clean-json", post(clean_json))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)),
        )
}

/// Body rejections get the same envelope as every other client error.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload.map(|Json(inner)| inner).map_err(|rejection| AppError::Validation(rejection.body_text()))
}

async fn health(State(state): State<Arc<AppState>>) -> AppResult<Json<ApiResponse<&'static str>>> {
    state.store.ping().await?;
    Ok(Json(ApiResponse::ok("ok")))
}

async fn list_movies(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let movies = state.store.all().await?;
    let count = movies.len();
    Ok(Json(ApiResponse::list(movies, count)))
}

async fn create_movie(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MovieRecord>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let created = state.store.create(body(payload)?).await?;
    info!(movie_id = %created.record.movie_id, "movie created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(created).with_message("Movie created successfully")),
    ))
}

async fn update_movie(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MovieRecord>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let updated = state.store.replace(body(payload)?).await?;
    info!(movie_id = %updated.record.movie_id, "movie updated");
    Ok(Json(ApiResponse::ok(updated).with_message("Movie updated successfully")))
}

#[derive(Debug, Deserialize)]
struct DeleteQuery {
    m_id: Option<String>,
    movie_id: Option<String>,
}

async fn delete_movie(
    State(state): State<Arc<AppState>>,
    Query(q): Query<DeleteQuery>,
) -> AppResult<impl IntoResponse> {
    let id = q
        .m_id
        .or(q.movie_id)
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("Movie ID (m_id) is required".to_string()))?;

    let removed = state.store.delete(&id).await?;
    info!(movie_id = %id, "movie deleted");
    Ok(Json(ApiResponse::ok(removed).with_message("Movie deleted successfully")))
}

async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let found = state
        .store
        .find(id.trim())
        .await?
        .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))?;
    Ok(Json(ApiResponse::ok(found)))
}

async fn display(
    State(state): State<Arc<AppState>>,
    Path((category, id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let category: Category = category.parse().map_err(AppError::Validation)?;
    let resolver = Resolver {
        records: &*state.records,
        metadata: &*state.tmdb,
        defaults: &state.defaults,
        images: &state.images,
    };
    Ok(Json(ApiResponse::ok(resolver.resolve(category, &id).await?)))
}

async fn catalog_feed(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let movies = state.store.all().await?;
    let cards =
        catalog::enrich(&*state.tmdb, &state.images, movies, state.config.max_concurrent).await;
    let count = cards.len();
    Ok(Json(ApiResponse::list(cards, count)))
}

async fn home(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let movies = state.store.all().await?;
    let cards =
        catalog::enrich(&*state.tmdb, &state.images, movies, state.config.max_concurrent).await;
    Ok(Json(ApiResponse::ok(catalog::home_feed(cards))))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    query: String,
    page: Option<u32>,
}

async fn search(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    Query(q): Query<SearchQuery>,
) -> AppResult<Json<ApiResponse<SearchPage>>> {
    let category: Category = category.parse().map_err(AppError::Validation)?;
    let page = match state.tmdb.search(category, q.query.trim(), q.page.unwrap_or(1)).await {
        Ok(page) => page,
        Err(err) => {
            warn!(query = %q.query, error = %err, "search failed; returning an empty page");
            SearchPage::default()
        },
    };
    Ok(Json(ApiResponse::ok(page)))
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<u32>,
}

async fn lists(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Query(q): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<SearchPage>>> {
    let kind: ListKind = kind.parse().map_err(AppError::Validation)?;
    let page = match state.tmdb.list(kind, q.page.unwrap_or(1)).await {
        Ok(page) => page,
        Err(err) => {
            warn!(list = kind.as_path(), error = %err, "list fetch failed; returning an empty page");
            SearchPage::default()
        },
    };
    Ok(Json(ApiResponse::ok(page)))
}

async fn admin_save(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MovieForm>, JsonRejection>,
) -> AppResult<axum::response::Response> {
    let form = body(payload)?;
    match form.mode {
        FormMode::Create => {
            let created = state.store.create(form.validate(MovieRecord::default())?).await?;
            info!(movie_id = %created.record.movie_id, "movie added from admin form");
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::ok(created).with_message("Movie added successfully")),
            )
                .into_response())
        },
        FormMode::Update => {
            let existing = state
                .store
                .find(form.movie_id.trim())
                .await?
                .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))?;
            let updated = state.store.replace(form.validate(existing.record)?).await?;
            info!(movie_id = %updated.record.movie_id, "movie updated from admin form");
            Ok(Json(ApiResponse::ok(updated).with_message("Movie updated successfully"))
                .into_response())
        },
    }
}

async fn admin_load(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let found = state
        .store
        .find(id.trim())
        .await?
        .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))?;
    let form = admin::form_from_record(&found.record)?;
    Ok(Json(
        ApiResponse::ok(form).with_message(format!("Loaded {}; now in edit mode", found.record.movie_id)),
    ))
}

#[derive(Debug, Deserialize, Serialize)]
struct JsonBlob {
    json: String,
}

async fn clean_json(payload: Result<Json<JsonBlob>, JsonRejection>) -> AppResult<impl IntoResponse> {
    let cleaned = admin::clean_json(&body(payload)?.json)?;
    Ok(Json(ApiResponse::ok(JsonBlob { json: cleaned }).with_message("JSON cleaned and formatted")))
}
