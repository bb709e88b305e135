//! Build information API endpoint
//!
//! Version and build metadata for the page header

use axum::response::Json;
use serde::Serialize;

/// Build information response
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub version: String,
    pub git_hash: String,
    pub build_timestamp: String,
    pub build_profile: String,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            git_hash: env!("GIT_HASH").to_string(),
            build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
            build_profile: env!("BUILD_PROFILE").to_string(),
        }
    }

    /// Hash shortened for display; "unknown" stays as is
    pub fn short_hash(&self) -> &str {
        self.git_hash.get(..8).unwrap_or(&self.git_hash)
    }
}

/// GET /api/buildinfo
pub async fn get_build_info() -> Json<BuildInfo> {
    Json(BuildInfo::current())
}
