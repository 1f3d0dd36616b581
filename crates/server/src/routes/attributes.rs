use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use service::attributes::{AttributeError, AttributeRecord};

use crate::errors::JsonApiError;
use crate::observability;
use crate::routes::AppState;

/// Request body for create and replace.
#[derive(Debug, Deserialize)]
pub struct AttributesPayload {
    #[serde(default)]
    pub urn: String,
    pub data: serde_json::Value,
}

/// The caller's credential, forwarded untouched to the authorizer.
fn credential(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

fn observe<T>(op: &str, res: &Result<T, AttributeError>) {
    let outcome = match res {
        Ok(_) => "ok",
        Err(AttributeError::Unauthorized | AttributeError::Denied { .. }) => "denied",
        Err(AttributeError::Conflict(_)) => "conflict",
        Err(e) if e.is_client_input() => "invalid",
        Err(_) => "error",
    };
    observability::record(op, outcome);
}

#[utoipa::path(
    get, path = "/attributes/{urn}", tag = "attributes",
    params(("urn" = String, Path, description = "Resource urn, raw or URL-safe base64")),
    responses(
        (status = 200, description = "Stored record, or null when none exists", body = crate::openapi::AttributesRecordDoc),
        (status = 401, description = "No Authorization header"),
        (status = 403, description = "Denied by the authorizer (its status is passed through)")
    )
)]
pub async fn get_attributes(
    State(state): State<AppState>,
    Path(urn): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Option<AttributeRecord>>, JsonApiError> {
    let res = state.attributes.read(credential(&headers), &urn).await;
    observe("read", &res);
    Ok(Json(res?))
}

#[utoipa::path(
    post, path = "/attributes", tag = "attributes",
    request_body = crate::openapi::AttributesRecordDoc,
    responses(
        (status = 201, description = "Created", body = crate::openapi::AttributesRecordDoc),
        (status = 400, description = "Invalid urn or data"),
        (status = 401, description = "No Authorization header"),
        (status = 409, description = "Attributes already exist for this urn")
    )
)]
pub async fn create_attributes(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<AttributesPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<AttributeRecord>), JsonApiError> {
    let Json(payload) = payload?;
    let data = payload.data.to_string();
    let res = state.attributes.create(credential(&headers), &payload.urn, &data).await;
    observe("create", &res);
    Ok((StatusCode::CREATED, Json(res?)))
}

#[utoipa::path(
    put, path = "/attributes/{urn}", tag = "attributes",
    params(("urn" = String, Path, description = "Resource urn; must equal the body urn")),
    request_body = crate::openapi::AttributesRecordDoc,
    responses(
        (status = 200, description = "Stored", body = crate::openapi::AttributesRecordDoc),
        (status = 400, description = "Urn mismatch or invalid data"),
        (status = 401, description = "No Authorization header")
    )
)]
pub async fn replace_attributes(
    State(state): State<AppState>,
    Path(urn): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<AttributesPayload>, JsonRejection>,
) -> Result<Json<AttributeRecord>, JsonApiError> {
    let Json(payload) = payload?;
    let data = payload.data.to_string();
    let res = state
        .attributes
        .replace(credential(&headers), &urn, &payload.urn, &data)
        .await;
    observe("replace", &res);
    Ok(Json(res?))
}
