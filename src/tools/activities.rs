//! activities_by_date 工具：查询某天可参加的活动

use std::sync::Arc;

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::core::AgentError;
use crate::providers::ActivityProvider;
use crate::tools::ToolOutput;

#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ActivitiesArgs {
    /// 日期，YYYY-MM-DD
    pub date: NaiveDate,
}

pub struct ActivitiesTool {
    provider: Arc<dyn ActivityProvider>,
}

impl ActivitiesTool {
    pub fn new(provider: Arc<dyn ActivityProvider>) -> Self {
        Self { provider }
    }

    /// 当天无活动时返回空数组
    pub async fn run(&self, args: ActivitiesArgs) -> Result<ToolOutput, AgentError> {
        let activities = self.provider.activities_on(args.date).await;
        tracing::debug!(date = %args.date, found = activities.len(), "activities lookup");
        let value = serde_json::to_value(&activities)
            .map_err(|e| AgentError::ToolExecutionFailed(e.to_string()))?;
        Ok(ToolOutput::Value(value))
    }
}
