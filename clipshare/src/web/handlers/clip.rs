// SPDX-License-Identifier: GPL-2.0-or-later
use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use clipshare_api_structs::{ClipCreated, ClipView, CreateClip};
use serde::Deserialize;
use tracing::instrument;

use crate::db::SqliteStore;
use crate::service::ClipService;
use crate::web::PASSWORD_HEADER;

#[derive(Debug, Default, Deserialize)]
pub struct PasswordQuery {
    password: Option<String>,
}

/// Create a new clip from a JSON [`CreateClip`] body.
#[instrument(skip_all)]
pub async fn create(
    Extension(service): Extension<ClipService<SqliteStore>>,
    request: Result<Json<CreateClip>, JsonRejection>,
) -> Result<Json<ClipCreated>, crate::Error> {
    let Json(request) = request.map_err(|e| crate::Error::InvalidInput(e.body_text()))?;
    Ok(service.create(request, Utc::now()).await?.into())
}

/// Read a clip by slug.
///
/// The password for a private clip is taken from the `x-clip-password` header, or failing
/// that, the `password` query parameter.
#[instrument(skip(service, query, headers))]
pub async fn get(
    Extension(service): Extension<ClipService<SqliteStore>>,
    Path(slug): Path<String>,
    Query(query): Query<PasswordQuery>,
    headers: HeaderMap,
) -> Result<Json<ClipView>, crate::Error> {
    let header_password = headers
        .get(PASSWORD_HEADER)
        .map(|value| {
            std::str::from_utf8(value.as_bytes()).map_err(|_| {
                crate::Error::InvalidInput(format!("{PASSWORD_HEADER} must be valid UTF-8"))
            })
        })
        .transpose()?;
    let password = header_password.or(query.password.as_deref());

    Ok(service.retrieve(&slug, password, Utc::now()).await?.into())
}
