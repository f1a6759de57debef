//! 错误恢复引擎
//!
//! 根据 AgentError 类型返回 RecoveryAction，供精炼循环决定是回灌错误 Observation 还是终止。

use crate::core::{AgentError, RecoveryAction};
use crate::tools::ToolName;

/// 语义化错误恢复：将错误映射为可执行动作（回灌提示 / 终止）
#[derive(Debug, Default)]
pub struct RecoveryEngine;

impl RecoveryEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, err: &AgentError) -> RecoveryAction {
        match err {
            AgentError::MalformedAction(raw) => RecoveryAction::Observe(format!(
                "Your last reply could not be parsed as an action ({raw}). \
                Reply with exactly one JSON object of the form \
                {{\"thought\": \"...\", \"action\": {{\"tool\": \"<name>\", \"args\": {{...}}}}}}."
            )),
            AgentError::UnknownTool(name) => RecoveryAction::Observe(format!(
                "Tool '{name}' does not exist. Available tools: {}.",
                ToolName::ALL.map(|t| t.as_str()).join(", ")
            )),
            AgentError::InvalidArguments { tool, reason } => RecoveryAction::Observe(format!(
                "Arguments for '{tool}' do not match its schema: {reason}"
            )),
            AgentError::ToolExecutionFailed(msg) => {
                RecoveryAction::Observe(format!("Tool failed: {msg}"))
            }
            AgentError::LlmError(_)
            | AgentError::ConfigError(_)
            | AgentError::InvalidInput(_)
            | AgentError::Io(_) => RecoveryAction::Abort,
        }
    }
}
