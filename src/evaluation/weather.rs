//! 天气兼容：判断某天的活动在当天天气下是否合理

use async_trait::async_trait;

use crate::core::AgentError;
use crate::domain::{ItineraryDay, WeatherCondition};
use crate::evaluation::Assessment;

/// 天气评审者：逐日给出结论
#[async_trait]
pub trait WeatherJudge: Send + Sync {
    async fn review(&self, day: &ItineraryDay) -> Result<Assessment, AgentError>;
}

/// 确定性规则表：
/// - 雨、雪、雷暴天不安排户外活动
/// - 大风天不安排水上/帆船类活动
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleTableJudge;

impl RuleTableJudge {
    /// 与当天天气冲突的活动 id
    pub fn conflicts(day: &ItineraryDay) -> Vec<String> {
        let condition = day.weather.condition;
        day.activities()
            .filter(|a| {
                (condition.rules_out_outdoor() && a.is_outdoor())
                    || (condition == WeatherCondition::Windy && a.is_wind_sensitive())
            })
            .map(|a| a.id.clone())
            .collect()
    }
}

#[async_trait]
impl WeatherJudge for RuleTableJudge {
    async fn review(&self, day: &ItineraryDay) -> Result<Assessment, AgentError> {
        let conflicts = Self::conflicts(day);
        if conflicts.is_empty() {
            return Ok(Assessment::ok(format!("{} suits every activity", day.weather.condition)));
        }
        Ok(Assessment::violation(format!(
            "{} weather ({}) conflicts with {}",
            day.weather.condition,
            day.weather.format_temperature(),
            conflicts.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::fixtures::*;

    #[tokio::test]
    async fn test_outdoor_activity_on_rainy_day() {
        let judge = RuleTableJudge;
        // 室内活动在雨天没问题
        assert!(judge.review(&day(11, &["cooking", "gallery"])).await.unwrap().ok);

        let mut rainy_hike = day(12, &["hike"]);
        rainy_hike.weather.condition = WeatherCondition::Rainy;
        let a = judge.review(&rainy_hike).await.unwrap();
        assert!(!a.ok);
        assert!(a.message.contains("hike"));
        assert!(a.message.contains("rainy"));
    }

    #[tokio::test]
    async fn test_wind_sensitive_activity_on_windy_day() {
        let judge = RuleTableJudge;
        let mut windy = day(11, &["sailing", "cooking"]);
        windy.weather.condition = WeatherCondition::Windy;
        assert_eq!(RuleTableJudge::conflicts(&windy), vec!["sailing".to_string()]);
        assert!(!judge.review(&windy).await.unwrap().ok);

        // 大风天徒步不受影响
        let mut windy_hike = day(12, &["hike"]);
        windy_hike.weather.condition = WeatherCondition::Windy;
        assert!(judge.review(&windy_hike).await.unwrap().ok);
    }
}
