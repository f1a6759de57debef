//! LlmReviewer：由 LLM 复核天气兼容与自由文本反馈
//!
//! 先跑确定性规则：规则已判定违反的直接返回，LLM 不能推翻。
//! 规则未覆盖的情况再问 LLM，回复以 OK 开头视为通过，否则整段回复作为修正意见。

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::AgentError;
use crate::domain::{ItineraryDay, TravelPlan};
use crate::evaluation::feedback::{assess_constraints, FeedbackConstraint, FeedbackJudge};
use crate::evaluation::weather::{RuleTableJudge, WeatherJudge};
use crate::evaluation::Assessment;
use crate::llm::{LlmClient, Message};

pub const DEFAULT_WEATHER_PROMPT: &str = "\
You review one day of a travel itinerary.
Date: {date}
Weather: {condition}, {temperature}
Activities:
{activities}

Reply with exactly OK if every activity is reasonable in this weather.
Otherwise reply with one sentence naming the activity ids that should be replaced and why.";

pub const DEFAULT_FEEDBACK_PROMPT: &str = "\
A traveler gave this feedback about their itinerary:
\"{feedback}\"

Itinerary (JSON):
{plan}

Reply with exactly OK if the itinerary satisfies the feedback.
Otherwise reply with one sentence describing what still violates it.";

/// 持有 LLM 与两套 prompt 模板，同时实现 WeatherJudge 与 FeedbackJudge
pub struct LlmReviewer {
    llm: Arc<dyn LlmClient>,
    weather_prompt: String,
    feedback_prompt: String,
}

impl LlmReviewer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            weather_prompt: DEFAULT_WEATHER_PROMPT.to_string(),
            feedback_prompt: DEFAULT_FEEDBACK_PROMPT.to_string(),
        }
    }

    pub fn with_weather_prompt(mut self, template: impl Into<String>) -> Self {
        self.weather_prompt = template.into();
        self
    }

    pub fn with_feedback_prompt(mut self, template: impl Into<String>) -> Self {
        self.feedback_prompt = template.into();
        self
    }

    async fn ask(&self, prompt: String) -> Result<Assessment, AgentError> {
        let response = self
            .llm
            .complete(&[Message::user(prompt)])
            .await
            .map_err(AgentError::LlmError)?;
        let response = response.trim();
        if response.is_empty() || response.to_uppercase().starts_with("OK") {
            Ok(Assessment::ok("approved by reviewer"))
        } else {
            Ok(Assessment::violation(response.to_string()))
        }
    }
}

#[async_trait]
impl WeatherJudge for LlmReviewer {
    async fn review(&self, day: &ItineraryDay) -> Result<Assessment, AgentError> {
        if !RuleTableJudge::conflicts(day).is_empty() {
            return RuleTableJudge.review(day).await;
        }
        if day.recommendations.is_empty() {
            return Ok(Assessment::ok("no activities planned"));
        }
        let activities = day
            .activities()
            .map(|a| format!("- {} ({}): {}", a.id, a.name, a.description))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = self
            .weather_prompt
            .replace("{date}", &day.date.to_string())
            .replace("{condition}", &day.weather.condition.to_string())
            .replace("{temperature}", &day.weather.format_temperature())
            .replace("{activities}", &activities);
        self.ask(prompt).await
    }
}

#[async_trait]
impl FeedbackJudge for LlmReviewer {
    async fn review(&self, plan: &TravelPlan, feedback: &str) -> Result<Assessment, AgentError> {
        let constraints = FeedbackConstraint::parse(feedback);
        if !constraints.is_empty() {
            return Ok(assess_constraints(plan, &constraints));
        }
        let plan_json = serde_json::to_string_pretty(plan)
            .map_err(|e| AgentError::ToolExecutionFailed(e.to_string()))?;
        let prompt = self
            .feedback_prompt
            .replace("{feedback}", feedback)
            .replace("{plan}", &plan_json);
        self.ask(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WeatherCondition;
    use crate::evaluation::fixtures::*;
    use crate::llm::MockLlmClient;

    #[tokio::test]
    async fn test_rules_win_over_llm_approval() {
        let llm = Arc::new(MockLlmClient::with_replies(["OK"]));
        let reviewer = LlmReviewer::new(llm.clone());
        let mut stormy = day(12, &["hike"]);
        stormy.weather.condition = WeatherCondition::Thunderstorm;
        let a = WeatherJudge::review(&reviewer, &stormy).await.unwrap();
        assert!(!a.ok);
        // 规则已判定，未调用 LLM
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_llm_decides_when_rules_are_silent() {
        let llm = Arc::new(MockLlmClient::with_replies([
            "ok, looks fine",
            "The gallery is closed on that date.",
        ]));
        let reviewer = LlmReviewer::new(llm.clone());
        let today = day(11, &["cooking", "gallery"]);
        assert!(WeatherJudge::review(&reviewer, &today).await.unwrap().ok);
        let a = WeatherJudge::review(&reviewer, &today).await.unwrap();
        assert!(!a.ok);
        assert_eq!(a.message, "The gallery is closed on that date.");
        assert_eq!(llm.calls(), 2);
    }

    #[tokio::test]
    async fn test_feedback_uses_parser_first() {
        let llm = Arc::new(MockLlmClient::with_replies(["Too many museums."]));
        let reviewer = LlmReviewer::new(llm.clone());
        let plan = initial_plan();

        let a = FeedbackJudge::review(&reviewer, &plan, "at most 1 activity per day")
            .await
            .unwrap();
        assert!(!a.ok);
        assert_eq!(llm.calls(), 0);

        let a = FeedbackJudge::review(&reviewer, &plan, "fewer museums please")
            .await
            .unwrap();
        assert!(!a.ok);
        assert_eq!(a.message, "Too many museums.");
        assert_eq!(llm.calls(), 1);
    }
}
