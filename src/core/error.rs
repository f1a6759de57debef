//! Agent 错误类型与恢复动作
//!
//! 与 RecoveryEngine 配合：校验类错误转为 Observation 回灌给推理方，致命错误终止循环。

use thiserror::Error;

/// 精炼循环及其协作者可能出现的错误
#[derive(Error, Debug)]
pub enum AgentError {
    /// 推理输出无法解析为 {"tool": ..., "args": ...}
    #[error("Malformed action: {0}")]
    MalformedAction(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    /// 领域数据不满足不变量（如旅客为空、日期倒置、价格为负）
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    /// 是否属于可在循环内消化的校验/执行错误
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AgentError::MalformedAction(_)
                | AgentError::UnknownTool(_)
                | AgentError::InvalidArguments { .. }
                | AgentError::ToolExecutionFailed(_)
        )
    }
}

/// 恢复引擎根据错误类型给出的建议动作
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryAction {
    /// 作为错误 Observation 写回 transcript，循环继续
    Observe(String),
    /// 终止循环，错误向上传播
    Abort,
}
