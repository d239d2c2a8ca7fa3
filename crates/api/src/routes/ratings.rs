//! Rating CRUD, per-place queries and the ranking report.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use common::RatingId;
use ledger::{PlaceSummary, Rating, RatingLedger, RatingReport};
use serde::{Deserialize, Serialize};
use world_state::StateStore;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: StateStore> {
    pub ledger: RatingLedger<S>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateRatingRequest {
    /// Caller-chosen id; generated when omitted.
    pub id: Option<String>,
    pub place: String,
    pub grade: i64,
    #[serde(default)]
    pub comment: String,
}

#[derive(Deserialize)]
pub struct UpdateRatingRequest {
    pub place: String,
    pub grade: i64,
    #[serde(default)]
    pub comment: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct RatingResponse {
    pub id: String,
    pub place: String,
    pub grade: i64,
    pub comment: String,
}

impl From<Rating> for RatingResponse {
    fn from(rating: Rating) -> Self {
        Self {
            id: rating.id.into_inner(),
            place: rating.place,
            grade: rating.grade,
            comment: rating.comment,
        }
    }
}

#[derive(Serialize)]
pub struct RatingCreatedResponse {
    pub id: String,
}

#[derive(Serialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

#[derive(Serialize)]
pub struct EmptyResponse {
    pub empty: bool,
}

#[derive(Serialize)]
pub struct PlaceAverageResponse {
    pub place: String,
    pub average: f64,
}

#[derive(Serialize)]
pub struct PlaceSummaryResponse {
    pub place: String,
    pub average: f64,
    pub ratings: Vec<RatingResponse>,
}

impl From<PlaceSummary> for PlaceSummaryResponse {
    fn from(summary: PlaceSummary) -> Self {
        Self {
            place: summary.place,
            average: summary.average,
            ratings: summary.ratings.into_iter().map(Into::into).collect(),
        }
    }
}

// -- Handlers --

/// POST /ledger/init: run the idempotent bootstrap.
#[tracing::instrument(skip(state))]
pub async fn initialize<S: StateStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<StatusCode, ApiError> {
    state.ledger.initialize().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /ratings: store a new rating.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: StateStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateRatingRequest>,
) -> Result<(StatusCode, Json<RatingCreatedResponse>), ApiError> {
    let id = match req.id {
        Some(id) if id.is_empty() => {
            return Err(ApiError::BadRequest("id must not be empty".to_string()));
        }
        Some(id) => RatingId::new(id),
        None => RatingId::generate(),
    };

    let rating = state
        .ledger
        .create_rating(id.as_str(), &req.place, req.grade, &req.comment)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RatingCreatedResponse {
            id: rating.id.into_inner(),
        }),
    ))
}

/// GET /ratings: list every rating in key order.
#[tracing::instrument(skip(state))]
pub async fn list<S: StateStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<RatingResponse>>, ApiError> {
    let ratings = state.ledger.get_all_ratings().await?;
    Ok(Json(ratings.into_iter().map(Into::into).collect()))
}

/// GET /ledger/empty: whether the ledger holds no ratings.
#[tracing::instrument(skip(state))]
pub async fn empty<S: StateStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<EmptyResponse>, ApiError> {
    let empty = state.ledger.are_ratings_empty().await?;
    Ok(Json(EmptyResponse { empty }))
}

/// GET /ratings/:id: read one rating.
#[tracing::instrument(skip(state))]
pub async fn get<S: StateStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<RatingResponse>, ApiError> {
    let rating = state.ledger.read_rating(&id).await?;
    Ok(Json(rating.into()))
}

/// GET /ratings/:id/exists: existence probe.
#[tracing::instrument(skip(state))]
pub async fn exists<S: StateStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ExistsResponse>, ApiError> {
    let exists = state.ledger.rating_exists(&id).await?;
    Ok(Json(ExistsResponse { exists }))
}

/// PUT /ratings/:id: overwrite place, grade and comment.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: StateStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRatingRequest>,
) -> Result<Json<RatingResponse>, ApiError> {
    let rating = state
        .ledger
        .update_rating(&id, &req.place, req.grade, &req.comment)
        .await?;
    Ok(Json(rating.into()))
}

/// DELETE /ratings/:id: remove a rating.
#[tracing::instrument(skip(state))]
pub async fn delete<S: StateStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.ledger.delete_rating(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /places/:place: ratings for a place with their average.
#[tracing::instrument(skip(state))]
pub async fn place_summary<S: StateStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(place): Path<String>,
) -> Result<Json<PlaceSummaryResponse>, ApiError> {
    let summary = state.ledger.place_summary(&place).await?;
    Ok(Json(summary.into()))
}

/// GET /places/:place/ratings: ratings whose place matches exactly.
#[tracing::instrument(skip(state))]
pub async fn place_ratings<S: StateStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(place): Path<String>,
) -> Result<Json<Vec<RatingResponse>>, ApiError> {
    let ratings = state.ledger.get_ratings_for_place(&place).await?;
    Ok(Json(ratings.into_iter().map(Into::into).collect()))
}

/// GET /places/:place/average: mean grade for a place.
#[tracing::instrument(skip(state))]
pub async fn place_average<S: StateStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(place): Path<String>,
) -> Result<Json<PlaceAverageResponse>, ApiError> {
    let average = state
        .ledger
        .calculate_average_grade_for_place(&place)
        .await?;
    Ok(Json(PlaceAverageResponse { place, average }))
}

/// GET /report: the ranking as a plain-text table.
#[tracing::instrument(skip(state))]
pub async fn report<S: StateStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state.ledger.get_rating().await?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        report,
    ))
}

/// GET /report/json: the ranking as structured data.
#[tracing::instrument(skip(state))]
pub async fn report_json<S: StateStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<RatingReport>, ApiError> {
    Ok(Json(state.ledger.ranking().await?))
}
