//! 天气记录

use std::fmt;

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 天气状况
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Sunny,
    Cloudy,
    Rainy,
    Snowy,
    Windy,
    Thunderstorm,
}

impl WeatherCondition {
    /// 户外活动不宜进行的天气
    pub fn rules_out_outdoor(&self) -> bool {
        matches!(
            self,
            WeatherCondition::Rainy | WeatherCondition::Snowy | WeatherCondition::Thunderstorm
        )
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WeatherCondition::Sunny => "sunny",
            WeatherCondition::Cloudy => "cloudy",
            WeatherCondition::Rainy => "rainy",
            WeatherCondition::Snowy => "snowy",
            WeatherCondition::Windy => "windy",
            WeatherCondition::Thunderstorm => "thunderstorm",
        };
        f.write_str(s)
    }
}

/// 单日天气（外部天气源提供）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Weather {
    pub date: NaiveDate,
    /// 摄氏度
    pub temperature: f32,
    pub condition: WeatherCondition,
}

impl Weather {
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C", self.temperature)
    }
}
