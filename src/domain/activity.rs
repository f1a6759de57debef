//! 活动与兴趣词表

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::money::to_cents;

/// 固定的兴趣词表（旅客兴趣与活动标签共用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Interest {
    Art,
    Cooking,
    Comedy,
    Dancing,
    Fitness,
    Gardening,
    Hiking,
    History,
    Movies,
    Music,
    Photography,
    Reading,
    Sailing,
    Shopping,
    Sports,
    Swimming,
    Technology,
    Tennis,
    Theatre,
    Writing,
}

impl Interest {
    pub const ALL: [Interest; 20] = [
        Interest::Art,
        Interest::Cooking,
        Interest::Comedy,
        Interest::Dancing,
        Interest::Fitness,
        Interest::Gardening,
        Interest::Hiking,
        Interest::History,
        Interest::Movies,
        Interest::Music,
        Interest::Photography,
        Interest::Reading,
        Interest::Sailing,
        Interest::Shopping,
        Interest::Sports,
        Interest::Swimming,
        Interest::Technology,
        Interest::Tennis,
        Interest::Theatre,
        Interest::Writing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interest::Art => "art",
            Interest::Cooking => "cooking",
            Interest::Comedy => "comedy",
            Interest::Dancing => "dancing",
            Interest::Fitness => "fitness",
            Interest::Gardening => "gardening",
            Interest::Hiking => "hiking",
            Interest::History => "history",
            Interest::Movies => "movies",
            Interest::Music => "music",
            Interest::Photography => "photography",
            Interest::Reading => "reading",
            Interest::Sailing => "sailing",
            Interest::Shopping => "shopping",
            Interest::Sports => "sports",
            Interest::Swimming => "swimming",
            Interest::Technology => "technology",
            Interest::Tennis => "tennis",
            Interest::Theatre => "theatre",
            Interest::Writing => "writing",
        }
    }

    /// 通常在户外进行的兴趣（天气规则表使用）
    pub fn is_outdoor(&self) -> bool {
        matches!(
            self,
            Interest::Gardening
                | Interest::Hiking
                | Interest::Sailing
                | Interest::Sports
                | Interest::Swimming
                | Interest::Tennis
        )
    }

    /// 对大风敏感的水上活动
    pub fn is_wind_sensitive(&self) -> bool {
        matches!(self, Interest::Sailing | Interest::Swimming)
    }
}

impl fmt::Display for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interest {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        // 兼容 "theater" 拼写
        let lower = if lower == "theater" { "theatre".to_string() } else { lower };
        Interest::ALL
            .iter()
            .find(|i| i.as_str() == lower)
            .copied()
            .ok_or_else(|| format!("unknown interest '{s}'"))
    }
}

/// 由外部活动源提供的单个活动；核心逻辑从不修改它
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Activity {
    pub id: String,
    pub name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub location: String,
    pub price: f64,
    pub description: String,
    pub related_interests: BTreeSet<Interest>,
}

impl Activity {
    pub fn price_cents(&self) -> i64 {
        to_cents(self.price)
    }

    /// 描述中明确写了 indoor 则视为室内；否则按兴趣标签或描述中的 outdoor 判断
    pub fn is_outdoor(&self) -> bool {
        let text = format!("{} {}", self.name, self.description).to_lowercase();
        if text.contains("indoor") {
            return false;
        }
        text.contains("outdoor") || self.related_interests.iter().any(Interest::is_outdoor)
    }

    pub fn is_wind_sensitive(&self) -> bool {
        self.related_interests.iter().any(Interest::is_wind_sensitive)
    }

    pub fn shares_interest_with(&self, interests: &BTreeSet<Interest>) -> bool {
        !self.related_interests.is_disjoint(interests)
    }

    /// 与活动源记录不一致的字段名；价格按分比较
    pub fn differing_fields(&self, source: &Activity) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.id != source.id {
            fields.push("id");
        }
        if self.name != source.name {
            fields.push("name");
        }
        if self.date != source.date {
            fields.push("date");
        }
        if self.start_time != source.start_time {
            fields.push("start_time");
        }
        if self.end_time != source.end_time {
            fields.push("end_time");
        }
        if self.location != source.location {
            fields.push("location");
        }
        if self.price_cents() != source.price_cents() {
            fields.push("price");
        }
        if self.description != source.description {
            fields.push("description");
        }
        if self.related_interests != source.related_interests {
            fields.push("related_interests");
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(name: &str, description: &str, interests: &[Interest]) -> Activity {
        Activity {
            id: "act-1".to_string(),
            name: name.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            location: "Old Town".to_string(),
            price: 25.0,
            description: description.to_string(),
            related_interests: interests.iter().copied().collect(),
        }
    }

    #[test]
    fn test_interest_round_trips_through_str() {
        for interest in Interest::ALL {
            assert_eq!(interest.as_str().parse::<Interest>().unwrap(), interest);
        }
        assert_eq!("Theater".parse::<Interest>().unwrap(), Interest::Theatre);
        assert!("skydiving".parse::<Interest>().is_err());
    }

    #[test]
    fn test_outdoor_detection() {
        assert!(activity("Ridge hike", "Guided walk", &[Interest::Hiking]).is_outdoor());
        assert!(activity("Street fair", "An outdoor market", &[Interest::Art]).is_outdoor());
        assert!(!activity("Indoor tennis", "Covered courts", &[Interest::Tennis]).is_outdoor());
        assert!(!activity("Gallery", "Modern art", &[Interest::Art]).is_outdoor());
    }

    #[test]
    fn test_differing_fields_names_each_edit() {
        let source = activity("Jazz", "Live set", &[Interest::Music]);
        assert!(source.differing_fields(&source.clone()).is_empty());

        let mut noise = source.clone();
        noise.price = 25.001;
        assert!(noise.differing_fields(&source).is_empty());

        let edits: [(&str, fn(&mut Activity)); 9] = [
            ("id", |a| a.id = "act-2".to_string()),
            ("name", |a| a.name = "Jazz Brunch".to_string()),
            ("date", |a| a.date = NaiveDate::from_ymd_opt(2025, 6, 11).unwrap()),
            ("start_time", |a| a.start_time = NaiveTime::from_hms_opt(8, 0, 0).unwrap()),
            ("end_time", |a| a.end_time = NaiveTime::from_hms_opt(12, 0, 0).unwrap()),
            ("location", |a| a.location = "Harbor".to_string()),
            ("price", |a| a.price = 5.0),
            ("description", |a| a.description = "Indoor set".to_string()),
            ("related_interests", |a| {
                a.related_interests = [Interest::Cooking].into_iter().collect()
            }),
        ];
        for (field, edit) in edits {
            let mut edited = source.clone();
            edit(&mut edited);
            assert_eq!(edited.differing_fields(&source), vec![field]);
        }
    }

    #[test]
    fn test_serializes_interests_in_snake_case() {
        let a = activity("Jazz", "Live set", &[Interest::Music]);
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["related_interests"], serde_json::json!(["music"]));
        assert_eq!(json["date"], "2025-06-10");
    }
}
