use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const UNKNOWN_ERROR: &str = "Unknown error";
pub const DEFAULT_ERROR_CODE: i64 = 500;

/// Uniform failure shape for everything that can go wrong talking to the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteError {
    pub error_code: i64,
    pub error_message: String,
    pub error_name: String,
}

impl RemoteError {
    pub fn new(
        error_code: i64,
        error_message: impl Into<String>,
        error_name: impl Into<String>,
    ) -> Self {
        let error_message = error_message.into();
        let error_name = error_name.into();
        Self {
            error_code,
            error_message: if error_message.is_empty() {
                UNKNOWN_ERROR.to_string()
            } else {
                error_message
            },
            error_name: if error_name.is_empty() {
                UNKNOWN_ERROR.to_string()
            } else {
                error_name
            },
        }
    }
}

impl Default for RemoteError {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_CODE, UNKNOWN_ERROR, UNKNOWN_ERROR)
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error_message)
    }
}

impl std::error::Error for RemoteError {}

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Body shape shared by every endpoint of the generation API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope {
    pub error_code: Option<i64>,
    pub error_message: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl ApiEnvelope {
    /// The envelope's own description of a failure, if it carries one.
    pub fn reason(&self) -> Option<&str> {
        self.error_message
            .as_deref()
            .or(self.message.as_deref())
            .filter(|reason| !reason.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_fields_fall_back_to_unknown_error() {
        let err = RemoteError::new(502, "", "");
        assert_eq!(err.error_message, UNKNOWN_ERROR);
        assert_eq!(err.error_name, UNKNOWN_ERROR);
        assert_eq!(RemoteError::default().error_code, 500);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let err = RemoteError::new(403, "quota exhausted", "QuotaError");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"errorCode": 403, "errorMessage": "quota exhausted", "errorName": "QuotaError"})
        );
    }

    #[test]
    fn envelope_reason_prefers_error_message() {
        let envelope: ApiEnvelope =
            serde_json::from_value(json!({"errorMessage": "bad key", "message": "other"})).unwrap();
        assert_eq!(envelope.reason(), Some("bad key"));
        assert!(envelope.data.is_null());

        let envelope: ApiEnvelope = serde_json::from_value(json!({"message": "rate limited"})).unwrap();
        assert_eq!(envelope.reason(), Some("rate limited"));
    }

    #[test]
    fn request_builder_keeps_query_order() {
        let request = ApiRequest::get("task_info")
            .with_query("taskId", "T1")
            .with_query("t", "1700000000000");
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.query_value("taskId"), Some("T1"));
        assert_eq!(request.query[1].0, "t");
        assert!(request.body.is_none());
    }
}
