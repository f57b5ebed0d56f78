//! The `check_website_exists` tool
//!
//! The model is offered exactly one tool. Its `tool_use` block is turned into
//! a [`ProposerCommand`] here, so nothing downstream sees the wire format.

use crate::types::{AnthropicTool, ContentBlock};
use scout_core::ProposerCommand;
use serde_json::json;

/// Name of the only tool the model may call
pub const CHECK_WEBSITE_TOOL: &str = "check_website_exists";

/// Tool definition sent with every request
pub fn check_website_tool() -> AnthropicTool {
    AnthropicTool {
        name: CHECK_WEBSITE_TOOL.to_string(),
        description: "Check whether a website exists and responds with a valid HTTP status, \
                      and record it if it is not a duplicate."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "Full URL of the candidate pricing page, including scheme"
                }
            },
            "required": ["url"]
        }),
    }
}

/// Pick the command out of a response.
///
/// The first well-formed `check_website_exists` call wins; anything after it
/// is ignored.
pub fn parse_command(blocks: &[ContentBlock]) -> ProposerCommand {
    let mut command = ProposerCommand::NoAction;

    for block in blocks {
        let ContentBlock::ToolUse { name, input, .. } = block else {
            continue;
        };

        if name != CHECK_WEBSITE_TOOL {
            tracing::warn!("Ignoring call to unknown tool: {}", name);
            continue;
        }

        let Some(url) = input.get("url").and_then(|v| v.as_str()) else {
            tracing::warn!("Ignoring {} call without a url: {}", name, input);
            continue;
        };

        if command != ProposerCommand::NoAction {
            tracing::warn!("Ignoring extra tool call for {}", url);
            continue;
        }

        command = ProposerCommand::ProposeUrl(url.trim().to_string());
    }

    command
}

/// Join the text blocks of a response
pub fn response_text(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .filter_map(|b| match b {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
