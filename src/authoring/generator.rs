//! 初始行程生成：根据度假请求、天气与活动产出一份 TravelPlan
//!
//! 循环只消费它的输出，不会回调。

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::AgentError;
use crate::domain::{Activity, TravelPlan, VacationInfo, Weather};
use crate::llm::{extract_json, LlmClient, Message};
use crate::tools::schema::schema_value;

#[async_trait]
pub trait PlanGenerator: Send + Sync {
    async fn generate(
        &self,
        vacation: &VacationInfo,
        weather: &[Weather],
        activities: &[Activity],
    ) -> Result<TravelPlan, AgentError>;
}

const GENERATOR_PROMPT: &str = "\
Create a day-by-day itinerary for the vacation below.
Pick activities only from the catalog, on their own dates, matching at least one traveler's interests.
Include the weather of each day and set total_cost to the sum of the activity prices.
Reply with one JSON object that follows this schema:
{schema}

Vacation request:
{vacation}

Weather forecast:
{weather}

Activity catalog:
{activities}";

/// 单次 prompt，输出 JSON 解析为 TravelPlan
pub struct LlmPlanGenerator {
    llm: Arc<dyn LlmClient>,
}

impl LlmPlanGenerator {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

#[async_trait]
impl PlanGenerator for LlmPlanGenerator {
    async fn generate(
        &self,
        vacation: &VacationInfo,
        weather: &[Weather],
        activities: &[Activity],
    ) -> Result<TravelPlan, AgentError> {
        let prompt = GENERATOR_PROMPT
            .replace("{schema}", &schema_value::<TravelPlan>().to_string())
            .replace("{vacation}", &to_json(vacation))
            .replace("{weather}", &to_json(weather))
            .replace("{activities}", &to_json(activities));
        let output = self
            .llm
            .complete(&[Message::user(prompt)])
            .await
            .map_err(AgentError::LlmError)?;
        let json = extract_json(&output)
            .ok_or_else(|| AgentError::LlmError("plan generator returned no JSON".to_string()))?;
        let plan: TravelPlan = serde_json::from_str(json)
            .map_err(|e| AgentError::LlmError(format!("plan generator returned an invalid plan: {e}")))?;
        tracing::info!(
            days = plan.days.len(),
            activities = plan.activity_count(),
            total_cost = plan.total_cost,
            "initial plan generated"
        );
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::fixtures::*;
    use crate::llm::MockLlmClient;

    #[tokio::test]
    async fn test_parses_fenced_plan() {
        let reply = format!("Here you go:\n```json\n{}\n```", serde_json::to_string(&initial_plan()).unwrap());
        let generator = LlmPlanGenerator::new(Arc::new(MockLlmClient::with_replies([reply])));
        let plan = generator
            .generate(&vacation(), &forecast(), &activities())
            .await
            .unwrap();
        assert_eq!(plan, initial_plan());
    }

    #[tokio::test]
    async fn test_rejects_non_plan_output() {
        let generator =
            LlmPlanGenerator::new(Arc::new(MockLlmClient::with_replies(["{\"days\": 3}"])));
        assert!(matches!(
            generator.generate(&vacation(), &forecast(), &activities()).await,
            Err(AgentError::LlmError(_))
        ));
    }
}
