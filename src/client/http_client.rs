use crate::{
    client::RemoteApi,
    config::GhiblioConfig,
    error::{GhiblioError, Result},
    logger::mask_secret,
    models::{ApiEnvelope, ApiRequest, HttpMethod, RemoteError, RemoteResult, UNKNOWN_ERROR},
};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION},
    Client, StatusCode,
};
use serde_json::{json, Value};

#[derive(Clone)]
pub struct HttpRemoteClient {
    client: Client,
    base_url: String,
}

impl HttpRemoteClient {
    pub fn new(config: &GhiblioConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| GhiblioError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.resolved_api_base(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_headers(&self, credential: &str) -> RemoteResult<HeaderMap> {
        let bearer = HeaderValue::from_str(&format!("Bearer {}", credential)).map_err(|_| {
            RemoteError::new(
                400,
                "API key contains characters that cannot be sent in a header",
                "InvalidCredential",
            )
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn send(&self, credential: &str, request: &ApiRequest) -> RemoteResult<Value> {
        let url = format!("{}{}", self.base_url, request.path.trim_start_matches('/'));
        let headers = self.build_headers(credential)?;

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
        }
        .headers(headers);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;

        normalize_response(status, &body)
    }
}

#[async_trait]
impl RemoteApi for HttpRemoteClient {
    async fn call(&self, credential: &str, request: ApiRequest) -> RemoteResult<Value> {
        log::debug!(
            "{} {}{} (key {})",
            request.method.as_str(),
            self.base_url,
            request.path,
            mask_secret(credential)
        );

        let result = self.send(credential, &request).await;

        if let Err(e) = &result {
            log::error!(
                "Error making request to {}: {}",
                request.path,
                json!({
                    "status": e.error_code,
                    "name": e.error_name,
                    "message": e.error_message,
                })
            );
        }

        result
    }
}

fn transport_error(e: reqwest::Error) -> RemoteError {
    let code = e.status().map(|s| i64::from(s.as_u16())).unwrap_or(500);
    let name = if e.is_timeout() {
        "TimeoutError"
    } else if e.is_connect() {
        "ConnectError"
    } else if e.is_decode() {
        "DecodeError"
    } else {
        "RequestError"
    };
    RemoteError::new(code, e.to_string(), name)
}

/// Turns a raw HTTP answer into the envelope's `data` or a [`RemoteError`].
pub(crate) fn normalize_response(status: StatusCode, body: &[u8]) -> RemoteResult<Value> {
    let envelope = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        serde_json::from_slice::<ApiEnvelope>(body).ok()
    };

    if status != StatusCode::OK {
        let code = envelope
            .as_ref()
            .and_then(|env| env.error_code)
            .filter(|code| *code != 0)
            .unwrap_or_else(|| i64::from(status.as_u16()));
        let message = envelope
            .as_ref()
            .and_then(|env| env.reason())
            .or_else(|| status.canonical_reason())
            .unwrap_or(UNKNOWN_ERROR);
        return Err(RemoteError::new(code, message, "HttpError"));
    }

    let envelope = envelope.ok_or_else(|| {
        RemoteError::new(500, "Response body is empty or not a JSON object", "ParseError")
    })?;

    match envelope.error_code {
        Some(code) if code != 0 => Err(RemoteError::new(
            code,
            envelope.reason().unwrap_or(UNKNOWN_ERROR),
            "ApiError",
        )),
        _ => Ok(envelope.data),
    }
}
