//! 旅客与度假请求
//!
//! 构造与反序列化都会校验不变量（年龄为正、旅客非空、离开日期不早于到达日期、预算非负），
//! 因此拿到的 VacationInfo 一定是合法的，可作为约束检查的唯一依据。

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::AgentError;
use crate::domain::Interest;

/// 旅客：姓名、年龄、兴趣集合
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TravelerFields")]
pub struct Traveler {
    name: String,
    age: u32,
    interests: BTreeSet<Interest>,
}

#[derive(Deserialize)]
struct TravelerFields {
    name: String,
    age: u32,
    #[serde(default)]
    interests: BTreeSet<Interest>,
}

impl TryFrom<TravelerFields> for Traveler {
    type Error = AgentError;

    fn try_from(f: TravelerFields) -> Result<Self, Self::Error> {
        Traveler::new(f.name, f.age, f.interests)
    }
}

impl Traveler {
    pub fn new(
        name: impl Into<String>,
        age: u32,
        interests: impl IntoIterator<Item = Interest>,
    ) -> Result<Self, AgentError> {
        let name = name.into();
        if age == 0 {
            return Err(AgentError::InvalidInput(format!(
                "traveler '{name}' must have a positive age"
            )));
        }
        Ok(Self {
            name,
            age,
            interests: interests.into_iter().collect(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn interests(&self) -> &BTreeSet<Interest> {
        &self.interests
    }
}

/// 度假请求：旅客、目的地、起止日期、预算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VacationFields")]
pub struct VacationInfo {
    travelers: Vec<Traveler>,
    destination: String,
    arrival_date: NaiveDate,
    departure_date: NaiveDate,
    budget: f64,
}

#[derive(Deserialize)]
struct VacationFields {
    travelers: Vec<Traveler>,
    destination: String,
    arrival_date: NaiveDate,
    departure_date: NaiveDate,
    budget: f64,
}

impl TryFrom<VacationFields> for VacationInfo {
    type Error = AgentError;

    fn try_from(f: VacationFields) -> Result<Self, Self::Error> {
        VacationInfo::new(f.travelers, f.destination, f.arrival_date, f.departure_date, f.budget)
    }
}

impl VacationInfo {
    pub fn new(
        travelers: Vec<Traveler>,
        destination: impl Into<String>,
        arrival_date: NaiveDate,
        departure_date: NaiveDate,
        budget: f64,
    ) -> Result<Self, AgentError> {
        if travelers.is_empty() {
            return Err(AgentError::InvalidInput(
                "vacation must have at least one traveler".to_string(),
            ));
        }
        if departure_date < arrival_date {
            return Err(AgentError::InvalidInput(format!(
                "departure date {departure_date} is before arrival date {arrival_date}"
            )));
        }
        if !budget.is_finite() || budget < 0.0 {
            return Err(AgentError::InvalidInput(format!(
                "budget must be a non-negative amount, got {budget}"
            )));
        }
        Ok(Self {
            travelers,
            destination: destination.into(),
            arrival_date,
            departure_date,
            budget,
        })
    }

    pub fn travelers(&self) -> &[Traveler] {
        &self.travelers
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn arrival_date(&self) -> NaiveDate {
        self.arrival_date
    }

    pub fn departure_date(&self) -> NaiveDate {
        self.departure_date
    }

    pub fn budget(&self) -> f64 {
        self.budget
    }

    /// 所有旅客兴趣的并集
    pub fn combined_interests(&self) -> BTreeSet<Interest> {
        self.travelers
            .iter()
            .flat_map(|t| t.interests.iter().copied())
            .collect()
    }

    /// 行程覆盖的每一天（含首尾）
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.arrival_date
            .iter_days()
            .take_while(|d| *d <= self.departure_date)
            .collect()
    }
}
