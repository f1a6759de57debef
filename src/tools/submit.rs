//! submit_final_answer 工具：唯一能让循环成功结束的工具

use crate::core::AgentError;
use crate::tools::evaluations::PlanArgs;
use crate::tools::ToolOutput;

#[derive(Debug, Default)]
pub struct SubmitTool;

impl SubmitTool {
    /// 不做检查；是否已通过评估由推理方决定
    pub fn run(&self, args: PlanArgs) -> Result<ToolOutput, AgentError> {
        tracing::info!(
            activities = args.plan.activity_count(),
            total_cost = args.plan.total_cost,
            "final answer submitted"
        );
        Ok(ToolOutput::Final(args.plan))
    }
}
