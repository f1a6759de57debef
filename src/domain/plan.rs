//! 行程：ItineraryDay 与 TravelPlan
//!
//! TravelPlan 由上游生成器产出一次，之后每轮循环只会被整体替换。
//! 这里提供的派生方法（without_activity / with_recomputed_total）都返回新值。

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::money::to_cents;
use crate::domain::{Activity, Weather};

/// 一条推荐：活动 + 推荐理由（理由应关联到具体旅客的兴趣）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Recommendation {
    pub activity: Activity,
    pub reason: String,
}

/// 行程中的一天
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ItineraryDay {
    pub date: NaiveDate,
    pub weather: Weather,
    pub recommendations: Vec<Recommendation>,
}

impl ItineraryDay {
    pub fn activities(&self) -> impl Iterator<Item = &Activity> {
        self.recommendations.iter().map(|r| &r.activity)
    }
}

/// 完整行程
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TravelPlan {
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// 声明的总花费，应等于所有推荐活动价格之和
    pub total_cost: f64,
    pub days: Vec<ItineraryDay>,
}

impl TravelPlan {
    pub fn activities(&self) -> impl Iterator<Item = &Activity> {
        self.days.iter().flat_map(|d| d.activities())
    }

    pub fn activity_count(&self) -> usize {
        self.days.iter().map(|d| d.recommendations.len()).sum()
    }

    pub fn total_cost_cents(&self) -> i64 {
        to_cents(self.total_cost)
    }

    /// 按活动价格重新求和（分），溢出时饱和
    pub fn computed_cost_cents(&self) -> i64 {
        self.activities()
            .map(Activity::price_cents)
            .fold(0i64, i64::saturating_add)
    }

    /// 总花费按活动价格重新计算后的新行程
    #[must_use]
    pub fn with_recomputed_total(&self) -> Self {
        let mut plan = self.clone();
        plan.total_cost = self.computed_cost_cents() as f64 / 100.0;
        plan
    }

    /// 去掉指定 id 的活动并重算总花费；若不存在该活动则原样返回副本
    #[must_use]
    pub fn without_activity(&self, activity_id: &str) -> Self {
        let mut plan = self.clone();
        for day in &mut plan.days {
            day.recommendations.retain(|r| r.activity.id != activity_id);
        }
        plan.with_recomputed_total()
    }

    pub fn day(&self, date: NaiveDate) -> Option<&ItineraryDay> {
        self.days.iter().find(|d| d.date == date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Interest, WeatherCondition};
    use chrono::NaiveTime;

    fn activity(id: &str, day: u32, price: f64) -> Activity {
        Activity {
            id: id.to_string(),
            name: format!("Activity {id}"),
            date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            location: "Center".to_string(),
            price,
            description: String::new(),
            related_interests: [Interest::Art].into_iter().collect(),
        }
    }

    fn plan() -> TravelPlan {
        let day = |d: u32, acts: Vec<Activity>| ItineraryDay {
            date: NaiveDate::from_ymd_opt(2025, 6, d).unwrap(),
            weather: Weather {
                date: NaiveDate::from_ymd_opt(2025, 6, d).unwrap(),
                temperature: 21.0,
                condition: WeatherCondition::Sunny,
            },
            recommendations: acts
                .into_iter()
                .map(|activity| Recommendation { activity, reason: "art".to_string() })
                .collect(),
        };
        TravelPlan {
            destination: "Lisbon".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 11).unwrap(),
            total_cost: 60.3,
            days: vec![
                day(10, vec![activity("a", 10, 20.1), activity("b", 10, 20.1)]),
                day(11, vec![activity("c", 11, 20.1)]),
            ],
        }
    }

    #[test]
    fn test_computed_cost_is_exact_in_cents() {
        let plan = plan();
        assert_eq!(plan.computed_cost_cents(), 6030);
        assert_eq!(plan.total_cost_cents(), 6030);
        assert_eq!(plan.activity_count(), 3);
    }

    #[test]
    fn test_without_activity_returns_new_plan() {
        let original = plan();
        let trimmed = original.without_activity("b");
        assert_eq!(trimmed.activity_count(), 2);
        assert_eq!(trimmed.total_cost_cents(), 4020);
        // 原值不受影响
        assert_eq!(original.activity_count(), 3);
        assert_eq!(original.without_activity("zzz"), original);
    }

    #[test]
    fn test_extreme_prices_saturate() {
        let mut plan = plan();
        plan.days[0].recommendations[0].activity.price = 1e300;
        plan.days[0].recommendations[1].activity.price = 1e300;
        assert_eq!(plan.computed_cost_cents(), i64::MAX);

        plan.days[0].recommendations[0].activity.price = -1e300;
        plan.days[0].recommendations[1].activity.price = -1e300;
        plan.days[1].recommendations[0].activity.price = -1e300;
        assert_eq!(plan.computed_cost_cents(), i64::MIN);
    }
}
