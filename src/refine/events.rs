//! 精炼过程事件：用于 CLI 或其他前端展示进度

use serde::Serialize;

use crate::refine::RefineStatus;

/// 单步过程事件（可序列化为 JSON 供前端展示）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RefineEvent {
    /// 步数更新（从 0 开始的当前步）
    StepUpdate { step: usize, max_steps: usize },
    /// 推理方的思考内容（预览）
    Thought { text: String },
    /// 调用工具
    ToolCall {
        tool: String,
        args: serde_json::Value,
    },
    /// 工具返回（预览，避免过长）
    Observation { tool: String, ok: bool, preview: String },
    /// 错误恢复动作（Observe / Abort）
    Recovery { action: String, detail: String },
    /// 循环结束
    Finished {
        status: RefineStatus,
        steps: usize,
        total_cost: f64,
    },
}
