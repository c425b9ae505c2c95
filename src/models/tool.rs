use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::GhiblioError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    ImageGenerate,
    CheckTask,
    Remains,
}

impl ToolName {
    pub const ALL: [ToolName; 3] = [ToolName::ImageGenerate, ToolName::CheckTask, ToolName::Remains];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::ImageGenerate => "image_generate",
            ToolName::CheckTask => "image_generate_check_task",
            ToolName::Remains => "image_generate_remains",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = GhiblioError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|tool| tool.as_str() == name)
            .ok_or_else(|| GhiblioError::UnknownTool(name.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

/// What a tool call hands back to the invoking framework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn error(message: impl fmt::Display) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: format!("Error: {}", message),
            }],
            is_error: true,
        }
    }

    /// All text blocks joined, mostly for logging and assertions.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .map(|ToolContent::Text { text }| text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Advertised shape of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_names_round_trip_through_from_str() {
        for tool in ToolName::ALL {
            assert_eq!(tool.as_str().parse::<ToolName>().unwrap(), tool);
        }
        assert!(matches!(
            "image_upscale".parse::<ToolName>(),
            Err(GhiblioError::UnknownTool(name)) if name == "image_upscale"
        ));
    }

    #[test]
    fn serializes_in_framework_shape() {
        let result = ToolResult::text("done");
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"content": [{"type": "text", "text": "done"}], "isError": false})
        );
    }

    #[test]
    fn error_results_are_prefixed_and_flagged() {
        let result = ToolResult::error("boom");
        assert!(result.is_error);
        assert_eq!(result.text_content(), "Error: boom");
    }
}
