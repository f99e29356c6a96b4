use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Result;
use crate::memory::MemoryStore;

pub(crate) const STORE_MEMORY_TOOL_NAME: &str = "store_memory";
pub(crate) const DELETE_MEMORY_TOOL_NAME: &str = "delete_memory";

/// The narrow slice of JSON Schema the memory tools need.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum JsonSchema {
    String {
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Object {
        properties: BTreeMap<String, JsonSchema>,
        #[serde(skip_serializing_if = "Option::is_none")]
        required: Option<Vec<String>>,
        #[serde(
            rename = "additionalProperties",
            skip_serializing_if = "Option::is_none"
        )]
        additional_properties: Option<bool>,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub(crate) struct ResponsesApiTool {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) strict: bool,
    pub(crate) parameters: JsonSchema,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type")]
pub(crate) enum OpenAiTool {
    #[serde(rename = "function")]
    Function(ResponsesApiTool),
}

fn string_property(description: &str) -> JsonSchema {
    JsonSchema::String {
        description: Some(description.to_string()),
    }
}

/// The fixed tool set offered on every play request.
pub(crate) fn memory_tools() -> Vec<OpenAiTool> {
    let mut store_properties = BTreeMap::new();
    store_properties.insert(
        "key".to_string(),
        string_property("The key to store the memory under, added to the context for future turns."),
    );
    store_properties.insert(
        "value".to_string(),
        string_property(
            "The value to store in memory, which can be any relevant information to help the assistant in future turns.",
        ),
    );

    let mut delete_properties = BTreeMap::new();
    delete_properties.insert(
        "key".to_string(),
        string_property("The key of the memory to delete."),
    );

    vec![
        OpenAiTool::Function(ResponsesApiTool {
            name: STORE_MEMORY_TOOL_NAME.to_string(),
            description: "Store a memory for additional context in future turns.".to_string(),
            strict: false,
            parameters: JsonSchema::Object {
                properties: store_properties,
                required: Some(vec!["key".to_string(), "value".to_string()]),
                additional_properties: None,
            },
        }),
        OpenAiTool::Function(ResponsesApiTool {
            name: DELETE_MEMORY_TOOL_NAME.to_string(),
            description: "Delete a memory to remove it from future context.".to_string(),
            strict: false,
            parameters: JsonSchema::Object {
                properties: delete_properties,
                required: Some(vec!["key".to_string()]),
                additional_properties: None,
            },
        }),
    ]
}

/// Returns JSON values that are compatible with Function Calling in the
/// Responses API: <https://platform.openai.com/docs/guides/function-calling>
pub(crate) fn create_tools_json_for_responses_api(
    tools: &[OpenAiTool],
) -> Result<Vec<serde_json::Value>> {
    let mut tools_json = Vec::with_capacity(tools.len());
    for tool in tools {
        tools_json.push(serde_json::to_value(tool)?);
    }
    Ok(tools_json)
}

#[derive(Debug, Deserialize)]
struct StoreMemoryArgs {
    key: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct DeleteMemoryArgs {
    key: String,
}

/// Runs a model-requested tool against the memory store. Always yields a
/// textual result to feed back; malformed input becomes an error message
/// instead of a failed turn.
pub(crate) fn dispatch_tool_call(memory: &mut MemoryStore, name: &str, arguments: &str) -> String {
    match name {
        STORE_MEMORY_TOOL_NAME => match serde_json::from_str::<StoreMemoryArgs>(arguments) {
            Ok(args) => {
                let feedback = format!("Memory stored: {} = {}", args.key, args.value);
                memory.set(args.key, args.value);
                feedback
            }
            Err(err) => format!("Invalid arguments for {name}: {err}"),
        },
        DELETE_MEMORY_TOOL_NAME => match serde_json::from_str::<DeleteMemoryArgs>(arguments) {
            Ok(args) => {
                if memory.delete(&args.key) {
                    format!("Memory deleted: {}", args.key)
                } else {
                    format!("Memory not found: {}", args.key)
                }
            }
            Err(err) => format!("Invalid arguments for {name}: {err}"),
        },
        other => format!("Unknown function call: {other}"),
    }
}
