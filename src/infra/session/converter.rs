//! Classifies raw agent log events into normalized messages.
//!
//! Two log dialects are understood:
//! - rollout events: `{"type":"response_item","payload":{...}}` where the
//!   payload is a `message`, `function_call` or `custom_tool_call`;
//! - chat events: `{"type":"user"|"assistant","message":{"content":...}}`
//!   with `text`, `tool_use` and `tool_result` content blocks.

use super::traits::EventConverter;
use crate::domain::{ContentBlock, NormalizedMessage, ToolCall};
use serde_json::{Map, Value, json};

/// Markers of text the runtime injects into user turns.
const INJECTED_CONTEXT_MARKERS: &[&str] = &[
    "<environment_context>",
    "<user_instructions>",
    "<permissions instructions>",
    "# AGENTS.md instructions",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct AgentEventConverter;

impl EventConverter for AgentEventConverter {
    fn convert(&self, event: &Value) -> Option<NormalizedMessage> {
        match event.get("type").and_then(Value::as_str)? {
            "response_item" => convert_response_item(event.get("payload")?),
            "user" => convert_chat_user(event.get("message")?),
            "assistant" => convert_chat_assistant(event.get("message")?),
            _ => None,
        }
    }
}

fn convert_response_item(payload: &Value) -> Option<NormalizedMessage> {
    match payload.get("type").and_then(Value::as_str)? {
        "message" => {
            let texts = content_texts(payload.get("content")?);
            match payload.get("role").and_then(Value::as_str)? {
                "user" => user_prompt(texts),
                "assistant" => Some(NormalizedMessage::assistant(
                    texts.into_iter().map(ContentBlock::Text).collect(),
                )),
                _ => None,
            }
        }
        "function_call" => {
            let name = payload.get("name").and_then(Value::as_str)?;
            let input = match payload.get("arguments") {
                Some(Value::String(raw)) => parse_arguments(raw),
                Some(Value::Object(map)) => Value::Object(map.clone()),
                _ => Value::Object(Map::new()),
            };
            Some(tool_call_message(name, input))
        }
        "custom_tool_call" => {
            let name = payload.get("name").and_then(Value::as_str)?;
            let raw = payload.get("input").and_then(Value::as_str).unwrap_or_default();
            Some(tool_call_message(name, json!({ "raw_input": raw })))
        }
        _ => None,
    }
}

fn convert_chat_user(message: &Value) -> Option<NormalizedMessage> {
    match message.get("content")? {
        Value::String(text) => user_prompt(vec![text.clone()]),
        content => user_prompt(content_texts(content)),
    }
}

fn convert_chat_assistant(message: &Value) -> Option<NormalizedMessage> {
    let blocks = match message.get("content")? {
        Value::String(text) => vec![ContentBlock::Text(text.clone())],
        Value::Array(items) => items.iter().filter_map(assistant_block).collect(),
        _ => return None,
    };
    Some(NormalizedMessage::assistant(blocks))
}

fn assistant_block(item: &Value) -> Option<ContentBlock> {
    match item.get("type").and_then(Value::as_str)? {
        "text" | "output_text" => {
            let text = item.get("text").and_then(Value::as_str)?;
            Some(ContentBlock::Text(text.to_string()))
        }
        "tool_use" => {
            let name = item.get("name").and_then(Value::as_str)?;
            let input = item.get("input").cloned().unwrap_or(Value::Null);
            Some(ContentBlock::ToolCall(ToolCall::new(name, input)))
        }
        _ => None,
    }
}

fn tool_call_message(name: &str, input: Value) -> NormalizedMessage {
    NormalizedMessage::assistant(vec![ContentBlock::ToolCall(ToolCall::new(name, input))])
}

// Non-object arguments are kept verbatim under `raw_input`.
fn parse_arguments(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Value::Object(map),
        Ok(_) | Err(_) => json!({ "raw_input": raw }),
    }
}

fn content_texts(content: &Value) -> Vec<String> {
    let Some(items) = content.as_array() else {
        return content.as_str().map(|t| vec![t.to_string()]).unwrap_or_default();
    };
    items
        .iter()
        .filter(|item| {
            matches!(
                item.get("type").and_then(Value::as_str),
                Some("input_text" | "output_text" | "text")
            )
        })
        .filter_map(|item| item.get("text").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

/// A user message counts as a prompt only when it carries typed text.
fn user_prompt(texts: Vec<String>) -> Option<NormalizedMessage> {
    let typed: Vec<String> = texts
        .into_iter()
        .filter(|text| !text.trim().is_empty() && !is_injected_context(text))
        .collect();
    if typed.is_empty() {
        return None;
    }
    Some(NormalizedMessage::user(typed.join("\n")))
}

fn is_injected_context(text: &str) -> bool {
    let trimmed = text.trim_start();
    INJECTED_CONTEXT_MARKERS
        .iter()
        .any(|marker| trimmed.starts_with(marker))
}
