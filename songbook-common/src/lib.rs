use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Base URL used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Error types for Songbook API operations
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SongbookError {
    #[error("{resource} {id} not found")]
    NotFound { resource: Resource, id: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("HTTP {0}: {1}")]
    HttpError(u16, String),

    #[error("Invalid JSON response: {0}")]
    InvalidJson(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// JSON error envelope the API may return alongside a non-2xx status
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Result type for Songbook API operations
pub type Result<T> = std::result::Result<T, SongbookError>;

/// The resource collections exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Users,
    Playlists,
    Songs,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Users, Resource::Playlists, Resource::Songs];

    /// Path segment of the collection, e.g. `users` for `/users`.
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Users => "users",
            Resource::Playlists => "playlists",
            Resource::Songs => "songs",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Resource {
    type Err = SongbookError;

    fn from_str(s: &str) -> Result<Self> {
        Resource::ALL
            .into_iter()
            .find(|r| r.path() == s)
            .ok_or_else(|| SongbookError::Config(format!("unknown resource {s:?}")))
    }
}

/// Where the API lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_string() }
    }
}

impl ApiConfig {
    /// Read an `ApiConfig` from a JSON file such as `{"base_url": "http://10.0.0.5:5000"}`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ApiConfig> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SongbookError::Config(format!("{}: {e}", path.display())))?;
        let config: ApiConfig = serde_json::from_str(&contents)
            .map_err(|e| SongbookError::Config(format!("{}: {e}", path.display())))?;
        if config.base_url.trim().is_empty() {
            return Err(SongbookError::Config(format!("{}: base_url is empty", path.display())));
        }
        Ok(config)
    }
}

/// Extract the `id` of an entity returned by the API. Accepts string and numeric ids.
pub fn entity_id(entity: &serde_json::Value) -> Option<String> {
    match entity.get("id")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
