//! 评估引擎：一组相互独立的行程检查
//!
//! evaluate(plan, vacation, feedback?) 每次都按固定顺序运行全部检查（不短路），
//! 一次调用即可暴露所有缺陷；全部 Verdict 通过即为成功。
//! 天气兼容与反馈两项检查可插拔（WeatherJudge / FeedbackJudge），默认使用确定性规则。
//!
//! 价格、兴趣、描述与天气一律以活动源和天气源为准：除 no_hallucination 与 date_range 外，
//! 其余检查都作用在按数据源还原后的行程上，行程里自带的副本只用于发现篡改。

pub mod checks;
pub mod feedback;
pub mod reviewer;
pub mod weather;

use std::fmt;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{TravelPlan, VacationInfo, Weather};
use crate::providers::{ActivityProvider, WeatherProvider};

pub use feedback::{FeedbackConstraint, FeedbackJudge, RuleFeedbackJudge};
pub use reviewer::LlmReviewer;
pub use weather::{RuleTableJudge, WeatherJudge};

/// 检查项（顺序即 evaluate 的输出顺序）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    DateRange,
    CostAccuracy,
    Budget,
    NoHallucination,
    InterestMatch,
    WeatherCompatibility,
    Feedback,
}

impl CheckKind {
    pub const ALL: [CheckKind; 7] = [
        CheckKind::DateRange,
        CheckKind::CostAccuracy,
        CheckKind::Budget,
        CheckKind::NoHallucination,
        CheckKind::InterestMatch,
        CheckKind::WeatherCompatibility,
        CheckKind::Feedback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::DateRange => "date_range",
            CheckKind::CostAccuracy => "cost_accuracy",
            CheckKind::Budget => "budget",
            CheckKind::NoHallucination => "no_hallucination",
            CheckKind::InterestMatch => "interest_match",
            CheckKind::WeatherCompatibility => "weather_compatibility",
            CheckKind::Feedback => "feedback",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单项检查结果；失败时 message 说明原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Verdict {
    pub check: CheckKind,
    pub passed: bool,
    pub message: String,
}

impl Verdict {
    pub fn pass(check: CheckKind, message: impl Into<String>) -> Self {
        Self { check, passed: true, message: message.into() }
    }

    pub fn fail(check: CheckKind, message: impl Into<String>) -> Self {
        Self { check, passed: false, message: message.into() }
    }

    fn from_assessment(check: CheckKind, assessment: Assessment) -> Self {
        Self { check, passed: assessment.ok, message: assessment.message }
    }
}

/// 可插拔评审者（规则表或 LLM）的结论
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub ok: bool,
    pub message: String,
}

impl Assessment {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { ok: true, message: message.into() }
    }

    pub fn violation(message: impl Into<String>) -> Self {
        Self { ok: false, message: message.into() }
    }
}

/// 一次 evaluate 的全部结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationReport {
    pub verdicts: Vec<Verdict>,
}

impl EvaluationReport {
    pub fn all_passed(&self) -> bool {
        self.verdicts.iter().all(|v| v.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Verdict> {
        self.verdicts.iter().filter(|v| !v.passed)
    }

    pub fn verdict(&self, check: CheckKind) -> Option<&Verdict> {
        self.verdicts.iter().find(|v| v.check == check)
    }
}

/// 声明气温与预报相差超过该值（摄氏度）视为不一致
const TEMPERATURE_TOLERANCE: f32 = 0.05;

/// 评估引擎：持有活动源、天气源与两个可插拔评审者
pub struct EvaluationEngine {
    activities: Arc<dyn ActivityProvider>,
    weather: Arc<dyn WeatherProvider>,
    weather_judge: Arc<dyn WeatherJudge>,
    feedback_judge: Arc<dyn FeedbackJudge>,
}

impl EvaluationEngine {
    /// 默认使用确定性规则评审（天气规则表 + 反馈解析）
    pub fn new(activities: Arc<dyn ActivityProvider>, weather: Arc<dyn WeatherProvider>) -> Self {
        Self {
            activities,
            weather,
            weather_judge: Arc::new(RuleTableJudge),
            feedback_judge: Arc::new(RuleFeedbackJudge),
        }
    }

    pub fn with_weather_judge(mut self, judge: Arc<dyn WeatherJudge>) -> Self {
        self.weather_judge = judge;
        self
    }

    pub fn with_feedback_judge(mut self, judge: Arc<dyn FeedbackJudge>) -> Self {
        self.feedback_judge = judge;
        self
    }

    /// 按 CheckKind::ALL 的顺序运行全部检查
    pub async fn evaluate(
        &self,
        plan: &TravelPlan,
        vacation: &VacationInfo,
        feedback: Option<&str>,
    ) -> EvaluationReport {
        let resolved = self.resolve(plan).await;
        let mut verdicts = Vec::with_capacity(CheckKind::ALL.len());
        for check in CheckKind::ALL {
            let verdict = match check {
                CheckKind::DateRange => checks::date_range(plan, vacation),
                CheckKind::CostAccuracy => checks::cost_accuracy(&resolved),
                CheckKind::Budget => checks::budget(&resolved, vacation),
                CheckKind::NoHallucination => {
                    checks::no_hallucination(plan, self.activities.as_ref()).await
                }
                CheckKind::InterestMatch => checks::interest_match(&resolved, vacation),
                CheckKind::WeatherCompatibility => self.weather_compatibility(plan, &resolved).await,
                CheckKind::Feedback => self.feedback(&resolved, feedback).await,
            };
            if !verdict.passed {
                tracing::debug!(check = %check, message = %verdict.message, "check failed");
            }
            verdicts.push(verdict);
        }
        let report = EvaluationReport { verdicts };
        tracing::info!(
            passed = report.verdicts.iter().filter(|v| v.passed).count(),
            total = report.verdicts.len(),
            "evaluation finished"
        );
        report
    }

    /// 以数据源记录替换行程中的活动副本与每日天气；查不到的保持原样（由 no_hallucination 报告）
    async fn resolve(&self, plan: &TravelPlan) -> TravelPlan {
        let mut resolved = plan.clone();
        for day in &mut resolved.days {
            let available = self.activities.activities_on(day.date).await;
            for rec in &mut day.recommendations {
                if let Some(source) = available.iter().find(|a| a.id == rec.activity.id) {
                    rec.activity = source.clone();
                }
            }
            if let Some(forecast) = self.weather.weather_on(day.date).await {
                day.weather = forecast;
            }
        }
        resolved
    }

    async fn weather_compatibility(&self, plan: &TravelPlan, resolved: &TravelPlan) -> Verdict {
        let mut problems = Vec::new();
        for (declared, day) in plan.days.iter().zip(&resolved.days) {
            if let Some(mismatch) = weather_mismatch(&declared.weather, &day.weather) {
                problems.push(format!("{}: {mismatch}", day.date));
            }
            match self.weather_judge.review(day).await {
                Ok(a) if a.ok => {}
                Ok(a) => problems.push(format!("{}: {}", day.date, a.message)),
                Err(e) => problems.push(format!("{}: weather review unavailable ({e})", day.date)),
            }
        }
        if problems.is_empty() {
            Verdict::pass(CheckKind::WeatherCompatibility, "all activities suit the forecast")
        } else {
            Verdict::fail(CheckKind::WeatherCompatibility, problems.join("; "))
        }
    }

    async fn feedback(&self, plan: &TravelPlan, feedback: Option<&str>) -> Verdict {
        let feedback = match feedback.map(str::trim) {
            Some(f) if !f.is_empty() => f,
            _ => return Verdict::pass(CheckKind::Feedback, "no feedback supplied"),
        };
        match self.feedback_judge.review(plan, feedback).await {
            Ok(a) => Verdict::from_assessment(CheckKind::Feedback, a),
            Err(e) => Verdict::fail(CheckKind::Feedback, format!("feedback review unavailable ({e})")),
        }
    }
}

/// 行程声明的天气与预报不一致时给出说明
fn weather_mismatch(declared: &Weather, forecast: &Weather) -> Option<String> {
    let same = declared.date == forecast.date
        && declared.condition == forecast.condition
        && (declared.temperature - forecast.temperature).abs() <= TEMPERATURE_TOLERANCE;
    (!same).then(|| {
        format!(
            "plan declares {} {} but the forecast is {} {}",
            declared.condition,
            declared.format_temperature(),
            forecast.condition,
            forecast.format_temperature()
        )
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! 单元测试共用夹具：2025-06-10 至 2025-06-12，两名旅客，预算 130，初始行程 150

    use chrono::{NaiveDate, NaiveTime};

    use crate::domain::{
        Activity, Interest, ItineraryDay, Recommendation, Traveler, TravelPlan, VacationInfo,
        Weather, WeatherCondition,
    };
    use crate::providers::Catalog;

    pub fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    pub fn activity(id: &str, day: u32, price: f64, interests: &[Interest], desc: &str) -> Activity {
        Activity {
            id: id.to_string(),
            name: format!("Activity {id}"),
            date: date(day),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            location: "Lisbon".to_string(),
            price,
            description: desc.to_string(),
            related_interests: interests.iter().copied().collect(),
        }
    }

    pub fn weather(day: u32, condition: WeatherCondition) -> Weather {
        Weather { date: date(day), temperature: 20.0, condition }
    }

    pub fn activities() -> Vec<Activity> {
        vec![
            activity("jazz", 10, 40.0, &[Interest::Music], "Live jazz in an indoor club"),
            activity("cooking", 11, 50.0, &[Interest::Cooking], "Indoor cooking class"),
            activity("gallery", 11, 30.0, &[Interest::Art], "Modern art gallery tour"),
            activity("hike", 12, 30.0, &[Interest::Hiking], "Coastal trail hike"),
            activity("sailing", 11, 60.0, &[Interest::Sailing], "Harbor sailing trip"),
        ]
    }

    pub fn forecast() -> Vec<Weather> {
        vec![
            weather(10, WeatherCondition::Sunny),
            weather(11, WeatherCondition::Rainy),
            weather(12, WeatherCondition::Sunny),
        ]
    }

    pub fn catalog() -> Catalog {
        Catalog::new(activities(), forecast()).unwrap()
    }

    pub fn vacation() -> VacationInfo {
        VacationInfo::new(
            vec![
                Traveler::new("Alice", 34, [Interest::Music, Interest::Hiking]).unwrap(),
                Traveler::new("Bob", 36, [Interest::Art, Interest::Cooking]).unwrap(),
            ],
            "Lisbon",
            date(10),
            date(12),
            130.0,
        )
        .unwrap()
    }

    fn find(id: &str) -> Activity {
        activities().into_iter().find(|a| a.id == id).unwrap()
    }

    pub fn day(d: u32, ids: &[&str]) -> ItineraryDay {
        let condition = forecast().into_iter().find(|w| w.date == date(d)).unwrap();
        ItineraryDay {
            date: date(d),
            weather: condition,
            recommendations: ids
                .iter()
                .map(|id| Recommendation {
                    activity: find(id),
                    reason: "matches a traveler interest".to_string(),
                })
                .collect(),
        }
    }

    /// 初始行程：jazz 40 + cooking 50 + gallery 30 + hike 30 = 150（超出预算 130）
    pub fn initial_plan() -> TravelPlan {
        TravelPlan {
            destination: "Lisbon".to_string(),
            start_date: date(10),
            end_date: date(12),
            total_cost: 150.0,
            days: vec![day(10, &["jazz"]), day(11, &["cooking", "gallery"]), day(12, &["hike"])],
        }
    }
}
