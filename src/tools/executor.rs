//! 工具执行器
//!
//! dispatch(call) = 校验（查工具名 + 解析参数）+ 执行；无论成败都输出一条结构化审计日志（JSON）。

use std::time::Instant;

use crate::core::AgentError;
use crate::tools::{ToolCall, ToolInvocation, ToolOutput, ToolRegistry};

/// 工具执行器：持有注册表，统一校验、执行与审计
pub struct ToolExecutor {
    registry: ToolRegistry,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// 校验失败返回 UnknownTool / InvalidArguments，执行失败返回工具自身的错误
    pub async fn dispatch(&self, call: &ToolCall) -> Result<ToolOutput, AgentError> {
        let start = Instant::now();
        let result = match ToolInvocation::validate(call) {
            Ok(invocation) => self.registry.execute(invocation).await,
            Err(e) => Err(e),
        };

        let (ok, outcome): (bool, &str) = match &result {
            Ok(_) => (true, "ok"),
            Err(AgentError::UnknownTool(_)) | Err(AgentError::InvalidArguments { .. }) => {
                (false, "rejected")
            }
            Err(_) => (false, "error"),
        };
        let duration_ms = start.elapsed().as_millis() as u64;
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": call.tool,
            "ok": ok,
            "outcome": outcome,
            "duration_ms": duration_ms,
            "args_preview": args_preview(&call.args),
        });
        tracing::info!(audit = %audit.to_string(), "tool");

        result
    }
}

fn args_preview(args: &serde_json::Value) -> String {
    let s = args.to_string();
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}
