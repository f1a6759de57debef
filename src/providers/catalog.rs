//! 内存数据源：从 JSON 夹具文件加载活动与天气（模拟的外部服务）
//!
//! 目录下需有 activities.json（Activity 数组）与 weather.json（Weather 数组）。

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::core::AgentError;
use crate::domain::{Activity, Weather};
use crate::providers::{ActivityProvider, WeatherProvider};

pub const ACTIVITIES_FILE: &str = "activities.json";
pub const WEATHER_FILE: &str = "weather.json";

/// 同时实现 ActivityProvider 与 WeatherProvider 的内存目录
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    activities: Vec<Activity>,
    weather: BTreeMap<NaiveDate, Weather>,
}

impl Catalog {
    /// 校验活动 id 唯一、价格非负、时间段有效，天气按日期去重（后者覆盖前者）
    pub fn new(activities: Vec<Activity>, weather: Vec<Weather>) -> Result<Self, AgentError> {
        let mut seen = HashSet::new();
        for a in &activities {
            if !seen.insert(a.id.as_str()) {
                return Err(AgentError::InvalidInput(format!("duplicate activity id '{}'", a.id)));
            }
            if !a.price.is_finite() || a.price < 0.0 {
                return Err(AgentError::InvalidInput(format!(
                    "activity '{}' has a negative price",
                    a.id
                )));
            }
            if a.end_time < a.start_time {
                return Err(AgentError::InvalidInput(format!(
                    "activity '{}' ends before it starts",
                    a.id
                )));
            }
        }
        let weather = weather.into_iter().map(|w| (w.date, w)).collect();
        Ok(Self { activities, weather })
    }

    /// 从数据目录加载
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, AgentError> {
        let dir = dir.as_ref();
        let activities: Vec<Activity> = read_json(&dir.join(ACTIVITIES_FILE))?;
        let weather: Vec<Weather> = read_json(&dir.join(WEATHER_FILE))?;
        tracing::info!(
            activities = activities.len(),
            weather_days = weather.len(),
            dir = %dir.display(),
            "Catalog loaded"
        );
        Self::new(activities, weather)
    }

    pub fn activities_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<Activity> {
        self.activities
            .iter()
            .filter(|a| a.date >= start && a.date <= end)
            .cloned()
            .collect()
    }

    pub fn weather_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<Weather> {
        self.weather.range(start..=end).map(|(_, w)| w.clone()).collect()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, AgentError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw)
        .map_err(|e| AgentError::InvalidInput(format!("{}: {e}", path.display())))
}

#[async_trait]
impl ActivityProvider for Catalog {
    async fn activities_on(&self, date: NaiveDate) -> Vec<Activity> {
        self.activities.iter().filter(|a| a.date == date).cloned().collect()
    }

    async fn activity(&self, id: &str) -> Option<Activity> {
        self.activities.iter().find(|a| a.id == id).cloned()
    }
}

#[async_trait]
impl WeatherProvider for Catalog {
    async fn weather_on(&self, date: NaiveDate) -> Option<Weather> {
        self.weather.get(&date).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Interest, WeatherCondition};
    use chrono::NaiveTime;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn activity(id: &str, day: u32, price: f64) -> Activity {
        Activity {
            id: id.to_string(),
            name: id.to_string(),
            date: date(day),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            location: "Center".to_string(),
            price,
            description: String::new(),
            related_interests: [Interest::Music].into_iter().collect(),
        }
    }

    #[tokio::test]
    async fn test_lookup_by_date_and_id() {
        let catalog = Catalog::new(
            vec![activity("a", 10, 10.0), activity("b", 11, 20.0)],
            vec![Weather { date: date(10), temperature: 20.0, condition: WeatherCondition::Sunny }],
        )
        .unwrap();

        assert_eq!(catalog.activities_on(date(10)).await.len(), 1);
        assert!(catalog.activities_on(date(20)).await.is_empty());
        assert_eq!(catalog.activity("b").await.unwrap().date, date(11));
        assert!(catalog.activity("zzz").await.is_none());
        assert!(catalog.weather_on(date(10)).await.is_some());
        assert!(catalog.weather_on(date(11)).await.is_none());
        assert_eq!(catalog.activities_between(date(10), date(11)).len(), 2);
    }

    #[test]
    fn test_rejects_duplicate_ids_and_negative_prices() {
        assert!(Catalog::new(vec![activity("a", 10, 1.0), activity("a", 11, 1.0)], vec![]).is_err());
        assert!(Catalog::new(vec![activity("a", 10, -1.0)], vec![]).is_err());
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let acts = serde_json::to_string(&vec![activity("a", 10, 10.0)]).unwrap();
        std::fs::write(dir.path().join(ACTIVITIES_FILE), acts).unwrap();
        std::fs::write(dir.path().join(WEATHER_FILE), "[]").unwrap();
        let catalog = Catalog::load(dir.path()).unwrap();
        assert_eq!(catalog.activities_between(date(1), date(30)).len(), 1);

        let missing = tempfile::tempdir().unwrap();
        assert!(matches!(Catalog::load(missing.path()), Err(AgentError::Io(_))));
    }
}
