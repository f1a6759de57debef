//! run_evaluations 工具：对候选行程运行全部检查，原样返回 Verdict 列表

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;

use crate::core::AgentError;
use crate::domain::{TravelPlan, VacationInfo};
use crate::evaluation::EvaluationEngine;
use crate::tools::ToolOutput;

/// run_evaluations 与 submit_final_answer 共用的参数
#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PlanArgs {
    /// 完整行程
    pub plan: TravelPlan,
}

/// 使用循环开始时给定的 VacationInfo 与反馈
pub struct EvaluationsTool {
    engine: Arc<EvaluationEngine>,
    vacation: VacationInfo,
    feedback: Option<String>,
}

impl EvaluationsTool {
    pub fn new(engine: Arc<EvaluationEngine>, vacation: VacationInfo, feedback: Option<String>) -> Self {
        Self { engine, vacation, feedback }
    }

    pub fn vacation(&self) -> &VacationInfo {
        &self.vacation
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    pub async fn run(&self, args: PlanArgs) -> Result<ToolOutput, AgentError> {
        let report = self
            .engine
            .evaluate(&args.plan, &self.vacation, self.feedback.as_deref())
            .await;
        Ok(ToolOutput::Evaluated { plan: args.plan, report })
    }
}
