use serde::Serialize;
use serde_json::Value;
use songbook_common::{ErrorResponse, Resource, Result, SongbookError};
use std::fmt::Display;

/// Songbook client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `http://127.0.0.1:5000`. A trailing `/` is ignored.
    pub base_url: String,
}

/// Songbook Client
pub struct Client {
    pub config: ClientConfig,
    http_client: reqwest::Client,
}

impl Client {
    /// Create a new client with the given configuration
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// CRUD operations scoped to one resource collection.
    pub fn resource(&self, resource: Resource) -> ResourceClient<'_> {
        ResourceClient { client: self, resource }
    }

    pub fn users(&self) -> ResourceClient<'_> {
        self.resource(Resource::Users)
    }

    pub fn playlists(&self) -> ResourceClient<'_> {
        self.resource(Resource::Playlists)
    }

    pub fn songs(&self) -> ResourceClient<'_> {
        self.resource(Resource::Songs)
    }

    /// Build the URL of a resource collection, e.g. `http://host/users`.
    pub fn build_collection_url(&self, resource: Resource) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), resource.path())
    }

    /// Build the URL of a single entity, e.g. `http://host/users/42`.
    pub fn build_entity_url(&self, resource: Resource, id: &str) -> String {
        format!("{}/{}", self.build_collection_url(resource), id)
    }
}

/// Create/list/get/update/delete against one collection.
#[derive(Clone, Copy)]
pub struct ResourceClient<'a> {
    client: &'a Client,
    resource: Resource,
}

impl<'a> ResourceClient<'a> {
    pub fn resource(&self) -> Resource {
        self.resource
    }

    /// `POST /<resource>`; returns the created entity.
    pub async fn create<B: Serialize + ?Sized>(&self, body: &B) -> Result<Value> {
        let url = self.client.build_collection_url(self.resource);
        let request = self.client.http_client.post(&url).json(body);
        self.send(request, None).await
    }

    /// `GET /<resource>`; the response must be a JSON array.
    pub async fn list(&self) -> Result<Vec<Value>> {
        let url = self.client.build_collection_url(self.resource);
        let request = self.client.http_client.get(&url);
        match self.send(request, None).await? {
            Value::Array(items) => Ok(items),
            other => Err(SongbookError::InvalidJson(format!(
                "expected an array from GET /{}, got {}",
                self.resource,
                json_kind(&other)
            ))),
        }
    }

    /// `GET /<resource>/{id}`
    pub async fn get(&self, id: impl Display) -> Result<Value> {
        let id = id.to_string();
        let url = self.client.build_entity_url(self.resource, &id);
        let request = self.client.http_client.get(&url);
        self.send(request, Some(id)).await
    }

    /// `PATCH /<resource>/{id}` with a partial object; returns the updated entity.
    pub async fn update<B: Serialize + ?Sized>(&self, id: impl Display, patch: &B) -> Result<Value> {
        let id = id.to_string();
        let url = self.client.build_entity_url(self.resource, &id);
        let request = self.client.http_client.patch(&url).json(patch);
        self.send(request, Some(id)).await
    }

    /// `DELETE /<resource>/{id}`; returns whatever the API reports for the deletion.
    pub async fn delete(&self, id: impl Display) -> Result<Value> {
        let id = id.to_string();
        let url = self.client.build_entity_url(self.resource, &id);
        let request = self.client.http_client.delete(&url);
        self.send(request, Some(id)).await
    }

    async fn send(&self, request: reqwest::RequestBuilder, id: Option<String>) -> Result<Value> {
        let response = request
            .send()
            .await
            .map_err(|e| SongbookError::NetworkError(e.to_string()))?;

        let status = response.status();
        tracing::debug!(resource = %self.resource, status = status.as_u16(), "response received");
        if !status.is_success() {
            return Err(parse_error_response(status, self.resource, id, response).await);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SongbookError::NetworkError(e.to_string()))?;

        serde_json::from_slice(&bytes).map_err(|e| SongbookError::InvalidJson(e.to_string()))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

async fn parse_error_response(
    status: reqwest::StatusCode,
    resource: Resource,
    id: Option<String>,
    response: reqwest::Response,
) -> SongbookError {
    if status == reqwest::StatusCode::NOT_FOUND {
        if let Some(id) = id {
            return SongbookError::NotFound { resource, id };
        }
    }

    let error_msg = response
        .json::<ErrorResponse>()
        .await
        .map(|r| r.error)
        .unwrap_or_else(|_| format!("Server returned status: {}", status));

    SongbookError::HttpError(status.as_u16(), error_msg)
}
