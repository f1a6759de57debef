//! 工具调用格式与 JSON Schema 生成（schemars）
//!
//! 用于将「合法 tool call」的 JSON 结构注入 system prompt，减少 LLM 输出格式错误。

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 推理方提出的原始动作：`{"tool": "...", "args": {...}}`，尚未校验
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ToolCall {
    /// 工具名：calculator、activities_by_date、run_evaluations、submit_final_answer
    pub tool: String,
    /// 工具参数，结构依工具而定
    #[serde(default)]
    pub args: Value,
}

impl ToolCall {
    pub fn new(tool: impl Into<String>, args: Value) -> Self {
        Self { tool: tool.into(), args }
    }
}

/// 返回工具调用的 JSON Schema 字符串，可拼入 system prompt
pub fn tool_call_schema_json() -> String {
    let schema = schema_for!(ToolCall);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

/// 某个参数类型的 JSON Schema
pub fn schema_value<T: JsonSchema>() -> Value {
    serde_json::to_value(schema_for!(T)).unwrap_or_default()
}
