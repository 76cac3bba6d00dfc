use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use rand::Rng;
use serde::Deserialize;

use crate::{
    error::AppError,
    models::{ApiResponse, Meta},
    search::WordRepository,
    state::SharedState,
};

#[derive(Deserialize)]
pub struct SearchParams {
    q: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

pub async fn search_handler(
    State(state): State<SharedState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let term = params.q.filter(|q| !q.is_empty()).ok_or(AppError::MissingQuery)?;
    let page = params.page.filter(|&page| page >= 1).unwrap_or(1);
    let limit = params.limit.filter(|&limit| limit >= 1).unwrap_or(10);

    let mut results = state.repository.search(&term, page, limit).await?;
    for word in &mut results.words {
        word.sanitize();
    }

    let meta = Meta {
        total_count: results.total_count,
        current_page: page,
        page_size: limit,
        total_pages: (results.total_count + limit - 1) / limit,
    };

    Ok(Json(ApiResponse::paginated(results.words, meta)))
}

pub async fn random_handler(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let count = state.repository.count().await?;
    if count == 0 {
        return Err(AppError::EmptyPopulation);
    }

    // Plain process-local randomness: only the daily word has to agree
    // across replicas.
    let offset = rand::rng().random_range(0..count);

    let mut word = state
        .repository
        .fetch_at_offset(offset)
        .await?
        .ok_or_else(|| AppError::repository(format!("no word at offset {offset}")))?;
    word.sanitize();

    Ok(Json(ApiResponse::success(word)))
}

pub async fn word_of_day_handler(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let word = state.daily.word_of_day().await?;

    Ok(Json(ApiResponse::success(word)))
}

pub async fn word_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut word = state
        .repository
        .fetch_by_id(&id)
        .await?
        .ok_or(AppError::NotFound)?;
    word.sanitize();

    Ok(Json(ApiResponse::success(word)))
}
