pub mod http_client;

use crate::models::{ApiRequest, RemoteResult};
use async_trait::async_trait;
use serde_json::Value;

pub use http_client::HttpRemoteClient;

/// Seam between the orchestrator and the generation service.
///
/// Implementations must never fail past this boundary: every transport
/// problem, non-200 status, malformed body or remote-reported error comes
/// back as a [`RemoteError`](crate::models::RemoteError). On success the
/// envelope's `data` value is returned.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn call(&self, credential: &str, request: ApiRequest) -> RemoteResult<Value>;
}
