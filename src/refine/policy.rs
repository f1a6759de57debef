//! 推理方（Policy）：根据 transcript 给出下一步的 thought 与 action
//!
//! LlmPolicy 调用 LLM 并解析 `{"thought": ..., "action": {"tool": ..., "args": ...}}`；
//! ScriptedPolicy / FnPolicy 用于确定性测试与演示。

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::core::AgentError;
use crate::llm::{extract_json, LlmClient, Message};
use crate::refine::Transcript;
use crate::tools::{tool_call_schema_json, ToolCall, ToolRegistry};

/// 内置系统提示词（可被 [refine] system_prompt_path 覆盖）
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a travel planner repairing an itinerary until it passes every check.
Work in cycles. In each cycle reply with exactly one JSON object:
{\"thought\": \"<your reasoning>\", \"action\": {\"tool\": \"<tool name>\", \"args\": {...}}}

Rules:
- Call run_evaluations on a candidate plan and read every verdict before submitting.
- Fix failing checks by replacing, removing or adding catalog activities; recompute total_cost with the calculator.
- Only recommend activities returned by activities_by_date for that exact date.
- Call submit_final_answer only when every verdict passed. It ends the session.";

/// 推理方单步输出
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub thought: String,
    pub proposal: Proposal,
}

/// 提出的动作：合法格式的调用，或无法解析的原始输出
#[derive(Debug, Clone, PartialEq)]
pub enum Proposal {
    Call(ToolCall),
    Malformed { raw: String, reason: String },
}

impl Step {
    pub fn call(thought: impl Into<String>, tool: impl Into<String>, args: Value) -> Self {
        Self {
            thought: thought.into(),
            proposal: Proposal::Call(ToolCall::new(tool, args)),
        }
    }

    pub fn malformed(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        let raw = raw.into();
        Self {
            thought: raw.clone(),
            proposal: Proposal::Malformed { raw, reason: reason.into() },
        }
    }
}

/// 推理方 trait：Err 视为致命错误（如 LLM 调用失败），终止循环
#[async_trait]
pub trait Policy: Send + Sync {
    async fn next_step(&self, transcript: &Transcript) -> Result<Step, AgentError>;
}

/// 解析 LLM 输出；格式错误不返回 Err，而是 Proposal::Malformed，交给循环转为错误 Observation
///
/// 兼容两种格式：`{"thought", "action": {"tool", "args"}}` 与直接的 `{"tool", "args"}`。
pub fn parse_llm_output(output: &str) -> Step {
    let Some(json_str) = extract_json(output) else {
        return Step::malformed(output.trim(), "no JSON object found");
    };
    let value: Value = match serde_json::from_str(json_str) {
        Ok(v) => v,
        Err(e) => return Step::malformed(output.trim(), format!("invalid JSON: {e}")),
    };
    let thought = value
        .get("thought")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let action = match value.get("action") {
        Some(action) => action.clone(),
        None if value.get("tool").is_some() => value.clone(),
        None => return Step::malformed(output.trim(), "missing \"action\" field"),
    };
    match serde_json::from_value::<ToolCall>(action) {
        Ok(call) if !call.tool.trim().is_empty() => Step { thought, proposal: Proposal::Call(call) },
        Ok(_) => Step::malformed(output.trim(), "action has an empty tool name"),
        Err(e) => Step::malformed(output.trim(), format!("action is not a tool call: {e}")),
    }
}

/// 拼装系统提示词：基础提示 + 工具列表（含参数 schema）+ 调用格式 schema
pub fn build_system_prompt(base: &str, registry: &ToolRegistry) -> String {
    format!(
        "{base}\n\nAvailable tools:\n{}\n\nTool call format (JSON Schema):\n{}",
        registry.to_schema_json(),
        tool_call_schema_json()
    )
}

/// LLM 驱动的推理方
pub struct LlmPolicy {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
}

impl LlmPolicy {
    pub fn new(llm: Arc<dyn LlmClient>, system_prompt: impl Into<String>) -> Self {
        Self {
            llm,
            system_prompt: system_prompt.into(),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// 获取 LLM 累计 token 使用统计
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.llm.token_usage()
    }
}

#[async_trait]
impl Policy for LlmPolicy {
    async fn next_step(&self, transcript: &Transcript) -> Result<Step, AgentError> {
        let mut messages = vec![Message::system(self.system_prompt.clone())];
        messages.extend(transcript.to_messages());
        let output = self
            .llm
            .complete(&messages)
            .await
            .map_err(AgentError::LlmError)?;
        Ok(parse_llm_output(&output))
    }
}

/// 按顺序回放预置步骤；耗尽后重复 fallback，没有 fallback 则报错
pub struct ScriptedPolicy {
    steps: Mutex<VecDeque<Step>>,
    fallback: Option<Step>,
}

impl ScriptedPolicy {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            fallback: None,
        }
    }

    /// 队列耗尽后一直返回该步骤
    pub fn with_fallback(mut self, step: Step) -> Self {
        self.fallback = Some(step);
        self
    }

    pub fn remaining(&self) -> usize {
        self.steps.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl Policy for ScriptedPolicy {
    async fn next_step(&self, _transcript: &Transcript) -> Result<Step, AgentError> {
        let next = self.steps.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
        next.or_else(|| self.fallback.clone())
            .ok_or_else(|| AgentError::LlmError("scripted policy ran out of steps".to_string()))
    }
}

/// 由闭包决定下一步，闭包可读取 transcript（例如根据上一条 Observation 调整）
pub struct FnPolicy<F> {
    f: F,
}

impl<F> FnPolicy<F>
where
    F: Fn(&Transcript) -> Result<Step, AgentError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Policy for FnPolicy<F>
where
    F: Fn(&Transcript) -> Result<Step, AgentError> + Send + Sync,
{
    async fn next_step(&self, transcript: &Transcript) -> Result<Step, AgentError> {
        (self.f)(transcript)
    }
}
