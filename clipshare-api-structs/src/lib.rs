/// Defines public-facing structures used in the web API
use serde::{Deserialize, Serialize};

mod clip;

pub use clip::{ClipCreated, ClipView, CreateClip};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub db_connections: u32,
}

/// The body of every non-2xx response.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
