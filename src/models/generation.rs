use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{GhiblioError, Result};

pub const MAX_REFERENCE_IMAGES: usize = 5;
pub const SUPPORTED_SIZES: [&str; 3] = ["1:1", "3:2", "2:3"];

/// Arguments of `image_generate`. Either `files_url` or `prompt` is expected,
/// but that convention is left to the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files_url: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

impl GenerationRequest {
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Default::default()
        }
    }

    pub fn with_files(mut self, files_url: Vec<String>) -> Self {
        self.files_url = Some(files_url);
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(files) = &self.files_url {
            if files.len() > MAX_REFERENCE_IMAGES {
                return Err(GhiblioError::InvalidArguments(format!(
                    "filesUrl accepts at most {} images, got {}",
                    MAX_REFERENCE_IMAGES,
                    files.len()
                )));
            }
        }
        if let Some(size) = &self.size {
            if !SUPPORTED_SIZES.contains(&size.as_str()) {
                log::warn!("Forwarding unrecognised size '{}' to the service", size);
            }
        }
        Ok(())
    }

    /// Body for the `generate` endpoint; absent fields are left out.
    pub fn to_body(&self, source: &str) -> Value {
        let mut body = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        body.insert("source".to_string(), Value::String(source.to_string()));
        Value::Object(body)
    }
}
