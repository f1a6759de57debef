//! 用户反馈约束：把自由文本解析为可机检的约束，再对行程逐条核对
//!
//! 识别的句式（大小写不敏感，数字可写作 1..10 或 one..ten）：
//! - at least N activities per/each day
//! - at most / no more than N activities per/each day
//! - include (at least one) <interest> activity
//! - no <interest> activities
//! - total cost under/below N

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::core::AgentError;
use crate::domain::{format_cents, to_cents, Interest, TravelPlan};
use crate::evaluation::Assessment;

const NUMBER: &str = r"(\d+|one|two|three|four|five|six|seven|eight|nine|ten)";
const PER_DAY: &str = r"activit(?:y|ies)\s+(?:per|each|every|a)\s+day";

static MIN_PER_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"at\s+least\s+{NUMBER}\s+{PER_DAY}")).unwrap());
static MAX_PER_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?:at\s+most|no\s+more\s+than)\s+{NUMBER}\s+{PER_DAY}")).unwrap()
});
static REQUIRE_INTEREST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"include\s+(?:at\s+least\s+one\s+|an?\s+|some\s+)?([a-z]+)\s+activit(?:y|ies)")
        .unwrap()
});
static EXCLUDE_INTEREST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bno\s+([a-z]+)\s+activit(?:y|ies)").unwrap());
static MAX_TOTAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"total\s+cost\s+(?:under|below|less\s+than)\s+\$?(\d+(?:\.\d+)?|one|two|three|four|five|six|seven|eight|nine|ten)\b")
        .unwrap()
});

/// 解析出的单条约束
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackConstraint {
    MinPerDay(usize),
    MaxPerDay(usize),
    RequireInterest(Interest),
    ExcludeInterest(Interest),
    /// 总花费严格小于该值（分）
    MaxTotal(i64),
}

fn parse_number(text: &str) -> Option<f64> {
    let word = match text {
        "one" => 1.0,
        "two" => 2.0,
        "three" => 3.0,
        "four" => 4.0,
        "five" => 5.0,
        "six" => 6.0,
        "seven" => 7.0,
        "eight" => 8.0,
        "nine" => 9.0,
        "ten" => 10.0,
        other => return other.parse().ok(),
    };
    Some(word)
}

fn parse_count(text: &str) -> Option<usize> {
    parse_number(text).map(|n| n as usize)
}

impl FeedbackConstraint {
    /// 从反馈文本中提取全部可识别的约束（可能为空）
    pub fn parse(feedback: &str) -> Vec<FeedbackConstraint> {
        let text = feedback.to_lowercase();
        let mut constraints = Vec::new();

        for caps in MIN_PER_DAY.captures_iter(&text) {
            if let Some(n) = parse_count(&caps[1]) {
                constraints.push(FeedbackConstraint::MinPerDay(n));
            }
        }
        for caps in MAX_PER_DAY.captures_iter(&text) {
            if let Some(n) = parse_count(&caps[1]) {
                constraints.push(FeedbackConstraint::MaxPerDay(n));
            }
        }
        for caps in REQUIRE_INTEREST.captures_iter(&text) {
            if let Ok(interest) = Interest::from_str(&caps[1]) {
                constraints.push(FeedbackConstraint::RequireInterest(interest));
            }
        }
        for caps in EXCLUDE_INTEREST.captures_iter(&text) {
            if let Ok(interest) = Interest::from_str(&caps[1]) {
                constraints.push(FeedbackConstraint::ExcludeInterest(interest));
            }
        }
        for caps in MAX_TOTAL.captures_iter(&text) {
            if let Some(amount) = parse_number(&caps[1]) {
                constraints.push(FeedbackConstraint::MaxTotal(to_cents(amount)));
            }
        }
        constraints
    }

    /// 对行程核对本约束；违反时返回说明
    pub fn check(&self, plan: &TravelPlan) -> Result<(), String> {
        match self {
            FeedbackConstraint::MinPerDay(n) => {
                let short: Vec<String> = plan
                    .days
                    .iter()
                    .filter(|d| d.recommendations.len() < *n)
                    .map(|d| format!("{} has {}", d.date, d.recommendations.len()))
                    .collect();
                if short.is_empty() {
                    Ok(())
                } else {
                    Err(format!("{self}: {}", short.join(", ")))
                }
            }
            FeedbackConstraint::MaxPerDay(n) => {
                let busy: Vec<String> = plan
                    .days
                    .iter()
                    .filter(|d| d.recommendations.len() > *n)
                    .map(|d| format!("{} has {}", d.date, d.recommendations.len()))
                    .collect();
                if busy.is_empty() {
                    Ok(())
                } else {
                    Err(format!("{self}: {}", busy.join(", ")))
                }
            }
            FeedbackConstraint::RequireInterest(interest) => {
                if plan.activities().any(|a| a.related_interests.contains(interest)) {
                    Ok(())
                } else {
                    Err(format!("{self}: the plan has none"))
                }
            }
            FeedbackConstraint::ExcludeInterest(interest) => {
                let found: Vec<String> = plan
                    .activities()
                    .filter(|a| a.related_interests.contains(interest))
                    .map(|a| format!("'{}' on {}", a.id, a.date))
                    .collect();
                if found.is_empty() {
                    Ok(())
                } else {
                    Err(format!("{self}: found {}", found.join(", ")))
                }
            }
            FeedbackConstraint::MaxTotal(limit) => {
                let total = plan.total_cost_cents();
                if total < *limit {
                    Ok(())
                } else {
                    Err(format!("{self}: total is {}", format_cents(total)))
                }
            }
        }
    }
}

impl fmt::Display for FeedbackConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackConstraint::MinPerDay(n) => write!(f, "at least {n} activities per day"),
            FeedbackConstraint::MaxPerDay(n) => write!(f, "at most {n} activities per day"),
            FeedbackConstraint::RequireInterest(i) => write!(f, "include a {i} activity"),
            FeedbackConstraint::ExcludeInterest(i) => write!(f, "no {i} activities"),
            FeedbackConstraint::MaxTotal(cents) => {
                write!(f, "total cost under {}", format_cents(*cents))
            }
        }
    }
}

/// 核对一组约束：全部满足返回 ok，否则合并所有违反项
pub fn assess_constraints(plan: &TravelPlan, constraints: &[FeedbackConstraint]) -> Assessment {
    let violations: Vec<String> = constraints.iter().filter_map(|c| c.check(plan).err()).collect();
    if violations.is_empty() {
        let satisfied: Vec<String> = constraints.iter().map(ToString::to_string).collect();
        Assessment::ok(format!("satisfies {}", satisfied.join(", ")))
    } else {
        Assessment::violation(violations.join("; "))
    }
}

/// 反馈评审者
#[async_trait]
pub trait FeedbackJudge: Send + Sync {
    async fn review(&self, plan: &TravelPlan, feedback: &str) -> Result<Assessment, AgentError>;
}

/// 仅基于规则解析的反馈评审；无法识别的反馈视为通过并记 warn
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleFeedbackJudge;

#[async_trait]
impl FeedbackJudge for RuleFeedbackJudge {
    async fn review(&self, plan: &TravelPlan, feedback: &str) -> Result<Assessment, AgentError> {
        let constraints = FeedbackConstraint::parse(feedback);
        if constraints.is_empty() {
            tracing::warn!(feedback = %feedback, "feedback not recognised, skipping check");
            return Ok(Assessment::ok(format!(
                "feedback \"{feedback}\" could not be machine-checked"
            )));
        }
        Ok(assess_constraints(plan, &constraints))
    }
}
