//! calculator 工具：只做四则运算，后端为 calculator 子 crate

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use crate::core::AgentError;
use crate::tools::ToolOutput;

#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CalculatorArgs {
    /// 算术表达式，如 "40 + 50 + 30"
    pub expression: String,
}

/// 错误信息中回显表达式的最大字符数
const EXPRESSION_PREVIEW_CHARS: usize = 80;

#[derive(Debug, Default)]
pub struct CalculatorTool;

impl CalculatorTool {
    /// 语法错误与除零作为工具错误返回
    pub fn run(&self, args: CalculatorArgs) -> Result<ToolOutput, AgentError> {
        let result = ::calculator::evaluate(&args.expression).map_err(|e| {
            let mut shown: String = args.expression.chars().take(EXPRESSION_PREVIEW_CHARS).collect();
            if shown.len() < args.expression.len() {
                shown.push_str("...");
            }
            AgentError::ToolExecutionFailed(format!("calculator: {e} in '{shown}'"))
        })?;
        Ok(ToolOutput::Value(json!({ "result": result })))
    }
}
