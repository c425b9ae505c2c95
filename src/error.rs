use thiserror::Error;

use crate::models::RemoteError;

#[derive(Debug, Error)]
pub enum GhiblioError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("Missing API key: set GHIBLIO_ART_API_KEY or pass an API key with the call")]
    MissingCredential,
    #[error("{0}")]
    Remote(#[from] RemoteError),
    #[error("Response error: {0}")]
    ResponseError(String),
}

pub type Result<T> = std::result::Result<T, GhiblioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_errors_display_the_remote_message() {
        let err: GhiblioError = RemoteError::new(401, "invalid api key", "AuthError").into();
        assert_eq!(err.to_string(), "invalid api key");
    }

    #[test]
    fn unknown_tool_names_the_tool() {
        let err = GhiblioError::UnknownTool("image_upscale".into());
        assert_eq!(err.to_string(), "Unknown tool: image_upscale");
    }
}
