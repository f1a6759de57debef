//! 最终行程的文字叙述：只在循环成功后调用

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::AgentError;
use crate::domain::{format_cents, TravelPlan, VacationInfo};
use crate::llm::{LlmClient, Message};
use crate::refine::RefineOutcome;

#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, plan: &TravelPlan, vacation: &VacationInfo) -> Result<String, AgentError>;
}

/// 让 LLM 写一段面向旅客的行程介绍
pub struct LlmNarrator {
    llm: Arc<dyn LlmClient>,
}

impl LlmNarrator {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Narrator for LlmNarrator {
    async fn narrate(&self, plan: &TravelPlan, vacation: &VacationInfo) -> Result<String, AgentError> {
        let travelers = vacation
            .travelers()
            .iter()
            .map(|t| {
                let interests: Vec<&str> = t.interests().iter().map(|i| i.as_str()).collect();
                format!("{} ({})", t.name(), interests.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");
        let mut days = String::new();
        for day in &plan.days {
            days.push_str(&format!("{} ({}, {}):\n", day.date, day.weather.condition, day.weather.format_temperature()));
            for r in &day.recommendations {
                days.push_str(&format!(
                    "- {} at {} {}-{}: {}\n",
                    r.activity.name, r.activity.location, r.activity.start_time, r.activity.end_time, r.reason
                ));
            }
        }
        let prompt = format!(
            "Write a short, friendly summary of this {}-day trip to {} for {}.\n\
            Mention why each activity suits the travelers. Total cost: {}.\n\n{}",
            plan.days.len(),
            plan.destination,
            travelers,
            format_cents(plan.total_cost_cents()),
            days
        );
        let text = self
            .llm
            .complete(&[Message::user(prompt)])
            .await
            .map_err(AgentError::LlmError)?;
        Ok(text.trim().to_string())
    }
}

/// 成功时返回叙述；Exhausted 的结果不叙述
pub async fn narrate_outcome(
    narrator: &dyn Narrator,
    outcome: &RefineOutcome,
    vacation: &VacationInfo,
) -> Result<Option<String>, AgentError> {
    if !outcome.converged() {
        return Ok(None);
    }
    narrator.narrate(&outcome.plan, vacation).await.map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::fixtures::*;
    use crate::llm::MockLlmClient;
    use crate::refine::{RefineStatus, Transcript};

    fn outcome(status: RefineStatus) -> RefineOutcome {
        RefineOutcome {
            run_id: uuid::Uuid::new_v4(),
            status,
            plan: initial_plan(),
            steps: 1,
            transcript: Transcript::new("task"),
        }
    }

    #[tokio::test]
    async fn test_narrates_only_successful_outcomes() {
        let llm = Arc::new(MockLlmClient::with_replies(["  Three sunny days in Lisbon.  "]));
        let narrator = LlmNarrator::new(llm.clone());

        let none = narrate_outcome(&narrator, &outcome(RefineStatus::Exhausted), &vacation())
            .await
            .unwrap();
        assert!(none.is_none());
        assert_eq!(llm.calls(), 0);

        let text = narrate_outcome(&narrator, &outcome(RefineStatus::Succeeded), &vacation())
            .await
            .unwrap();
        assert_eq!(text.as_deref(), Some("Three sunny days in Lisbon."));
    }
}
