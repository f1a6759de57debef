//! 工具注册表
//!
//! 工具集合是封闭的：ToolName 枚举列出全部工具，每个工具有强类型参数。
//! 原始 ToolCall 经 ToolInvocation::validate 解析为带类型参数的调用，再由 ToolRegistry 分派到对应处理器。

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::AgentError;
use crate::domain::{TravelPlan, VacationInfo};
use crate::evaluation::{EvaluationEngine, EvaluationReport};
use crate::providers::ActivityProvider;
use crate::tools::activities::{ActivitiesArgs, ActivitiesTool};
use crate::tools::calculator::{CalculatorArgs, CalculatorTool};
use crate::tools::evaluations::{EvaluationsTool, PlanArgs};
use crate::tools::schema::{schema_value, ToolCall};
use crate::tools::submit::SubmitTool;

/// 全部可用工具
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    Calculator,
    ActivitiesByDate,
    RunEvaluations,
    SubmitFinalAnswer,
}

impl ToolName {
    pub const ALL: [ToolName; 4] = [
        ToolName::Calculator,
        ToolName::ActivitiesByDate,
        ToolName::RunEvaluations,
        ToolName::SubmitFinalAnswer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::Calculator => "calculator",
            ToolName::ActivitiesByDate => "activities_by_date",
            ToolName::RunEvaluations => "run_evaluations",
            ToolName::SubmitFinalAnswer => "submit_final_answer",
        }
    }

    /// 精确匹配工具名（区分大小写）
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// 工具描述（供 LLM 理解功能）
    pub fn description(&self) -> &'static str {
        match self {
            ToolName::Calculator => {
                "Evaluate an arithmetic expression (+ - * / and parentheses). Returns {\"result\": number}."
            }
            ToolName::ActivitiesByDate => {
                "List the activities available on a date (YYYY-MM-DD). Returns an empty list when there are none."
            }
            ToolName::RunEvaluations => {
                "Run every itinerary check on a plan. Returns one verdict per check with a message."
            }
            ToolName::SubmitFinalAnswer => {
                "Submit the final itinerary. Ends the session; only call it once the evaluations pass."
            }
        }
    }

    /// 参数 JSON Schema（供 LLM 生成正确的参数格式）
    pub fn parameters_schema(&self) -> Value {
        match self {
            ToolName::Calculator => schema_value::<CalculatorArgs>(),
            ToolName::ActivitiesByDate => schema_value::<ActivitiesArgs>(),
            ToolName::RunEvaluations | ToolName::SubmitFinalAnswer => schema_value::<PlanArgs>(),
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 通过校验的调用：工具已确定，参数已反序列化为对应类型
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocation {
    Calculator(CalculatorArgs),
    ActivitiesByDate(ActivitiesArgs),
    RunEvaluations(PlanArgs),
    SubmitFinalAnswer(PlanArgs),
}

fn typed_args<T: serde::de::DeserializeOwned>(tool: ToolName, args: &Value) -> Result<T, AgentError> {
    serde_json::from_value(args.clone()).map_err(|e| AgentError::InvalidArguments {
        tool: tool.as_str().to_string(),
        reason: e.to_string(),
    })
}

impl ToolInvocation {
    /// 查找工具名并按其参数类型解析 args；未知工具 → UnknownTool，参数不符 → InvalidArguments
    pub fn validate(call: &ToolCall) -> Result<Self, AgentError> {
        let tool =
            ToolName::parse(call.tool.trim()).ok_or_else(|| AgentError::UnknownTool(call.tool.clone()))?;
        let invocation = match tool {
            ToolName::Calculator => ToolInvocation::Calculator(typed_args(tool, &call.args)?),
            ToolName::ActivitiesByDate => ToolInvocation::ActivitiesByDate(typed_args(tool, &call.args)?),
            ToolName::RunEvaluations => ToolInvocation::RunEvaluations(typed_args(tool, &call.args)?),
            ToolName::SubmitFinalAnswer => {
                ToolInvocation::SubmitFinalAnswer(typed_args(tool, &call.args)?)
            }
        };
        Ok(invocation)
    }

    pub fn name(&self) -> ToolName {
        match self {
            ToolInvocation::Calculator(_) => ToolName::Calculator,
            ToolInvocation::ActivitiesByDate(_) => ToolName::ActivitiesByDate,
            ToolInvocation::RunEvaluations(_) => ToolName::RunEvaluations,
            ToolInvocation::SubmitFinalAnswer(_) => ToolName::SubmitFinalAnswer,
        }
    }
}

/// 工具执行结果
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// 普通 JSON 结果（calculator / activities_by_date）
    Value(Value),
    /// run_evaluations：被评估的行程与全部 Verdict
    Evaluated { plan: TravelPlan, report: EvaluationReport },
    /// submit_final_answer：终止信号
    Final(TravelPlan),
}

impl ToolOutput {
    /// 写回 transcript 的 Observation 文本
    pub fn to_observation(&self) -> String {
        match self {
            ToolOutput::Value(v) => v.to_string(),
            ToolOutput::Evaluated { report, .. } => {
                serde_json::to_string(report).unwrap_or_else(|_| "[]".to_string())
            }
            ToolOutput::Final(plan) => format!(
                "Final answer accepted: {} activities, total cost {:.2}",
                plan.activity_count(),
                plan.total_cost
            ),
        }
    }

    /// 本次调用携带的行程（成为新的候选行程）
    pub fn plan(&self) -> Option<&TravelPlan> {
        match self {
            ToolOutput::Value(_) => None,
            ToolOutput::Evaluated { plan, .. } | ToolOutput::Final(plan) => Some(plan),
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, ToolOutput::Final(_))
    }
}

/// 工具注册表：持有每个工具的处理器及其依赖（活动源、评估引擎、VacationInfo、反馈）
pub struct ToolRegistry {
    calculator: CalculatorTool,
    activities: ActivitiesTool,
    evaluations: EvaluationsTool,
    submit: SubmitTool,
}

impl ToolRegistry {
    pub fn new(
        activities: Arc<dyn ActivityProvider>,
        engine: Arc<EvaluationEngine>,
        vacation: VacationInfo,
        feedback: Option<String>,
    ) -> Self {
        Self {
            calculator: CalculatorTool,
            activities: ActivitiesTool::new(activities),
            evaluations: EvaluationsTool::new(engine, vacation, feedback),
            submit: SubmitTool,
        }
    }

    pub fn vacation(&self) -> &VacationInfo {
        self.evaluations.vacation()
    }

    pub fn feedback(&self) -> Option<&str> {
        self.evaluations.feedback()
    }

    /// 全部工具的名称、描述与参数 schema
    pub fn to_schema_json(&self) -> String {
        let tools: Vec<Value> = ToolName::ALL
            .iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.as_str(),
                    "description": t.description(),
                    "parameters": t.parameters_schema()
                })
            })
            .collect();
        serde_json::to_string_pretty(&tools).unwrap_or_else(|_| "[]".to_string())
    }

    pub async fn execute(&self, invocation: ToolInvocation) -> Result<ToolOutput, AgentError> {
        match invocation {
            ToolInvocation::Calculator(args) => self.calculator.run(args),
            ToolInvocation::ActivitiesByDate(args) => self.activities.run(args).await,
            ToolInvocation::RunEvaluations(args) => self.evaluations.run(args).await,
            ToolInvocation::SubmitFinalAnswer(args) => self.submit.run(args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::fixtures::*;
    use serde_json::json;

    fn registry() -> ToolRegistry {
        let catalog = Arc::new(catalog());
        let engine = Arc::new(EvaluationEngine::new(catalog.clone(), catalog.clone()));
        ToolRegistry::new(catalog, engine, vacation(), None)
    }

    #[test]
    fn test_validate_unknown_tool() {
        let err = ToolInvocation::validate(&ToolCall::new("book_flight", json!({}))).unwrap_err();
        assert!(matches!(err, AgentError::UnknownTool(name) if name == "book_flight"));
        // 大小写敏感
        assert!(ToolInvocation::validate(&ToolCall::new("Calculator", json!({"expression": "1"}))).is_err());
    }

    #[test]
    fn test_validate_invalid_arguments() {
        let err = ToolInvocation::validate(&ToolCall::new("calculator", json!({"expr": "1+1"})))
            .unwrap_err();
        match err {
            AgentError::InvalidArguments { tool, reason } => {
                assert_eq!(tool, "calculator");
                assert!(reason.contains("expr"));
            }
            other => panic!("unexpected error {other}"),
        }
        assert!(matches!(
            ToolInvocation::validate(&ToolCall::new("activities_by_date", json!({"date": "June 10"}))),
            Err(AgentError::InvalidArguments { .. })
        ));
        assert!(matches!(
            ToolInvocation::validate(&ToolCall::new("run_evaluations", Value::Null)),
            Err(AgentError::InvalidArguments { .. })
        ));
    }

    #[test]
    fn test_validate_typed_plan() {
        let plan = initial_plan();
        let call = ToolCall::new("submit_final_answer", json!({ "plan": &plan }));
        let invocation = ToolInvocation::validate(&call).unwrap();
        assert_eq!(invocation.name(), ToolName::SubmitFinalAnswer);
        assert_eq!(invocation, ToolInvocation::SubmitFinalAnswer(PlanArgs { plan }));
    }

    #[tokio::test]
    async fn test_run_evaluations_returns_verdicts_verbatim() {
        let registry = registry();
        let output = registry
            .execute(ToolInvocation::RunEvaluations(PlanArgs { plan: initial_plan() }))
            .await
            .unwrap();
        assert_eq!(output.plan(), Some(&initial_plan()));
        let verdicts: Value = serde_json::from_str(&output.to_observation()).unwrap();
        assert_eq!(verdicts.as_array().unwrap().len(), 7);
        assert_eq!(verdicts[2]["check"], "budget");
        assert_eq!(verdicts[2]["passed"], false);
    }

    #[tokio::test]
    async fn test_submit_is_final() {
        let output = registry()
            .execute(ToolInvocation::SubmitFinalAnswer(PlanArgs { plan: initial_plan() }))
            .await
            .unwrap();
        assert!(output.is_final());
        assert!(output.to_observation().contains("4 activities"));
    }

    #[test]
    fn test_schema_lists_every_tool() {
        let schema: Value = serde_json::from_str(&registry().to_schema_json()).unwrap();
        let names: Vec<&str> = schema
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ToolName::ALL.map(|t| t.as_str()).to_vec());
        assert!(schema[0]["parameters"].to_string().contains("expression"));
    }
}
