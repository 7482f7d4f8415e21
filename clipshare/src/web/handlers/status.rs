// SPDX-License-Identifier: GPL-2.0-or-later
use axum::{extract::Extension, http::StatusCode, Json};

use clipshare_api_structs::Status;
use tracing::{error, instrument};

use crate::db::SqliteStore;
use crate::service::ClipService;

/// Report whether the clip store is reachable; 503 if it isn't.
#[instrument(skip(service))]
pub async fn get(
    Extension(service): Extension<ClipService<SqliteStore>>,
) -> Result<Json<Status>, StatusCode> {
    service.status().await.map(Json).map_err(|err| {
        error!("Clip store is unavailable: {}", err);
        StatusCode::SERVICE_UNAVAILABLE
    })
}
