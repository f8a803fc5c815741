//! Medicine listing handlers.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde::Deserialize;

use super::{AppState, session_from_headers};
use crate::error::MarketError;
use crate::listing::{self, CreateListingRequest};
use crate::model::Listing;
use crate::store::lock_store;

pub(super) async fn list_medicines(
    State(state): State<AppState>,
) -> Result<Json<Vec<Listing>>, MarketError> {
    let db = lock_store(&state.db)?;
    Ok(Json(db.list_listings()?))
}

pub(super) async fn get_medicine(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Listing>, MarketError> {
    let db = lock_store(&state.db)?;
    db.get_listing(&id)?
        .map(Json)
        .ok_or(MarketError::NotFound {
            entity: "medicine",
            id,
        })
}

pub(super) async fn create_medicine(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateListingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, MarketError> {
    let session = session_from_headers(&state.signer, &headers);
    let Json(req) = payload.map_err(|rej| MarketError::InvalidPayload {
        field: "body",
        reason: rej.body_text(),
    })?;

    let listing =
        listing::create_listing(&state.db, &state.registry, session.as_ref(), &req).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

pub(super) async fn delete_medicine(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, MarketError> {
    let session = session_from_headers(&state.signer, &headers);
    let db = lock_store(&state.db)?;
    listing::delete_listing(&db, &state.config, session.as_ref(), &id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchParams {
    #[serde(default)]
    name: Option<String>,
}

pub(super) async fn query_medicines(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Listing>>, MarketError> {
    let term = params.name.as_deref().unwrap_or_default();
    let db = lock_store(&state.db)?;
    Ok(Json(listing::search_by_generic_name(
        &db,
        term,
        state.config.match_mode,
    )?))
}
