use serde_json::json;

use crate::models::{ToolDefinition, ToolName, MAX_REFERENCE_IMAGES};

pub fn definition(tool: ToolName) -> ToolDefinition {
    let (description, input_schema) = match tool {
        ToolName::ImageGenerate => (
            "Generate an image with ChatGPT 4o from a prompt and/or reference images",
            json!({
                "type": "object",
                "properties": {
                    "filesUrl": {
                        "type": "array",
                        "items": {
                            "type": "string",
                            "description": "Reference image uploaded by the user"
                        },
                        "maxItems": MAX_REFERENCE_IMAGES
                    },
                    "prompt": {
                        "type": "string",
                        "description": "Describes what the image should show. At least one of filesUrl and prompt is required"
                    },
                    "size": {
                        "type": "string",
                        "description": "Aspect ratio, one of: 1:1, 3:2, 2:3"
                    }
                },
                "additionalProperties": false
            }),
        ),
        ToolName::CheckTask => (
            "Check the progress of an image generation task",
            json!({
                "type": "object",
                "properties": {
                    "taskId": { "type": "string", "description": "Task ID" }
                },
                "required": ["taskId"],
                "additionalProperties": false
            }),
        ),
        ToolName::Remains => (
            "Query how many image generations the user has left",
            json!({ "type": "object" }),
        ),
    };

    ToolDefinition {
        name: tool.as_str().to_string(),
        description: description.to_string(),
        input_schema,
    }
}

pub fn definitions() -> Vec<ToolDefinition> {
    ToolName::ALL.into_iter().map(definition).collect()
}
