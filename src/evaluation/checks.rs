//! 确定性检查：日期范围、花费准确、预算、无幻觉、兴趣匹配
//!
//! 每个函数只看自己关心的那部分数据，互不依赖，可单独测试。

use std::collections::HashSet;

use crate::domain::{format_cents, to_cents, TravelPlan, VacationInfo};
use crate::evaluation::{CheckKind, Verdict};
use crate::providers::ActivityProvider;

/// 行程起止日期等于到达/离开日期，且每天恰好出现一次、按日期排序
pub fn date_range(plan: &TravelPlan, vacation: &VacationInfo) -> Verdict {
    let expected_start = vacation.arrival_date();
    let expected_end = vacation.departure_date();
    let mut problems = Vec::new();

    let first = plan.days.first().map(|d| d.date);
    let last = plan.days.last().map(|d| d.date);
    if plan.start_date != expected_start || plan.end_date != expected_end {
        problems.push(format!(
            "plan declares {} to {}",
            plan.start_date, plan.end_date
        ));
    }
    match (first, last) {
        (Some(first), Some(last)) => {
            if first != expected_start || last != expected_end {
                problems.push(format!("itinerary days run from {first} to {last}"));
            }
        }
        _ => problems.push("itinerary has no days".to_string()),
    }

    let mut seen = HashSet::new();
    for pair in plan.days.windows(2) {
        if pair[1].date <= pair[0].date {
            problems.push(format!("{} listed after {}", pair[1].date, pair[0].date));
        }
    }
    for day in &plan.days {
        if !seen.insert(day.date) {
            problems.push(format!("{} appears more than once", day.date));
        }
    }
    let missing: Vec<String> = vacation
        .dates()
        .into_iter()
        .filter(|d| !seen.contains(d))
        .map(|d| d.to_string())
        .collect();
    if !missing.is_empty() {
        problems.push(format!("missing days: {}", missing.join(", ")));
    }
    let extra: Vec<String> = plan
        .days
        .iter()
        .filter(|d| d.date < expected_start || d.date > expected_end)
        .map(|d| d.date.to_string())
        .collect();
    if !extra.is_empty() {
        problems.push(format!("days outside the trip: {}", extra.join(", ")));
    }

    if problems.is_empty() {
        Verdict::pass(
            CheckKind::DateRange,
            format!("covers {expected_start} to {expected_end}"),
        )
    } else {
        Verdict::fail(
            CheckKind::DateRange,
            format!(
                "expected {expected_start} to {expected_end}, but {}",
                problems.join("; ")
            ),
        )
    }
}

/// 声明总价与活动价格之和在分精度上完全一致
pub fn cost_accuracy(plan: &TravelPlan) -> Verdict {
    let declared = plan.total_cost_cents();
    let computed = plan.computed_cost_cents();
    if declared == computed {
        Verdict::pass(
            CheckKind::CostAccuracy,
            format!("total {} matches the activity prices", format_cents(declared)),
        )
    } else {
        Verdict::fail(
            CheckKind::CostAccuracy,
            format!(
                "declared total {} but activity prices sum to {} (difference {})",
                format_cents(declared),
                format_cents(computed),
                format_cents(declared.saturating_sub(computed))
            ),
        )
    }
}

/// 声明总价不超过预算
pub fn budget(plan: &TravelPlan, vacation: &VacationInfo) -> Verdict {
    let total = plan.total_cost_cents();
    let budget = to_cents(vacation.budget());
    if total <= budget {
        Verdict::pass(
            CheckKind::Budget,
            format!("total {} within budget {}", format_cents(total), format_cents(budget)),
        )
    } else {
        Verdict::fail(
            CheckKind::Budget,
            format!(
                "total {} exceeds budget {} by {}",
                format_cents(total),
                format_cents(budget),
                format_cents(total.saturating_sub(budget))
            ),
        )
    }
}

/// 行程里的每个活动都必须是活动源同一天的原样记录：id 查不到算虚构，任何字段被改动同样不通过
pub async fn no_hallucination(plan: &TravelPlan, activities: &dyn ActivityProvider) -> Verdict {
    let mut missing = Vec::new();
    let mut altered = Vec::new();
    for day in &plan.days {
        let available = activities.activities_on(day.date).await;
        for activity in day.activities() {
            match available.iter().find(|a| a.id == activity.id) {
                None => missing.push(format!("'{}' on {}", activity.id, day.date)),
                Some(source) => {
                    let fields = activity.differing_fields(source);
                    if !fields.is_empty() {
                        altered.push(format!(
                            "'{}' on {} ({})",
                            activity.id,
                            day.date,
                            fields.join(", ")
                        ));
                    }
                }
            }
        }
    }
    if missing.is_empty() && altered.is_empty() {
        return Verdict::pass(CheckKind::NoHallucination, "every activity matches the catalog");
    }
    let mut problems = Vec::new();
    if !missing.is_empty() {
        problems.push(format!("activities not found in the catalog: {}", missing.join(", ")));
    }
    if !altered.is_empty() {
        problems.push(format!("activities differ from the catalog in: {}", altered.join(", ")));
    }
    Verdict::fail(CheckKind::NoHallucination, problems.join("; "))
}

/// 每个推荐活动至少与一名旅客的兴趣相交
pub fn interest_match(plan: &TravelPlan, vacation: &VacationInfo) -> Verdict {
    let unmatched: Vec<String> = plan
        .activities()
        .filter(|a| {
            !vacation
                .travelers()
                .iter()
                .any(|t| a.shares_interest_with(t.interests()))
        })
        .map(|a| format!("'{}' ({})", a.id, a.name))
        .collect();
    if unmatched.is_empty() {
        Verdict::pass(CheckKind::InterestMatch, "every activity matches a traveler interest")
    } else {
        Verdict::fail(
            CheckKind::InterestMatch,
            format!("no traveler is interested in: {}", unmatched.join(", ")),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Activity, Interest};
    use crate::evaluation::fixtures::*;

    #[test]
    fn test_date_range() {
        let vacation = vacation();
        assert!(date_range(&initial_plan(), &vacation).passed);

        let mut short = initial_plan();
        short.days.pop();
        let v = date_range(&short, &vacation);
        assert!(!v.passed);
        assert!(v.message.contains("expected 2025-06-10 to 2025-06-12"));
        assert!(v.message.contains("missing days: 2025-06-12"));

        let mut swapped = initial_plan();
        swapped.days.swap(0, 1);
        let v = date_range(&swapped, &vacation);
        assert!(!v.passed);
        assert!(v.message.contains("listed after"));

        let mut duplicated = initial_plan();
        duplicated.days[1] = day(10, &["jazz"]);
        assert!(date_range(&duplicated, &vacation).message.contains("more than once"));

        let mut empty = initial_plan();
        empty.days.clear();
        assert!(date_range(&empty, &vacation).message.contains("no days"));
    }

    #[test]
    fn test_cost_accuracy() {
        let plan = initial_plan();
        assert!(cost_accuracy(&plan).passed);

        let mut tampered = plan.clone();
        tampered.days[0].recommendations[0].activity.price = 45.0;
        let v = cost_accuracy(&tampered);
        assert!(!v.passed);
        assert!(v.message.contains("declared total 150.00"));
        assert!(v.message.contains("sum to 155.00"));
    }

    #[test]
    fn test_cost_accuracy_tolerates_float_noise_only() {
        let mut plan = initial_plan();
        plan.total_cost = 150.004;
        assert!(cost_accuracy(&plan).passed);
        plan.total_cost = 150.01;
        assert!(!cost_accuracy(&plan).passed);
    }

    #[test]
    fn test_extreme_totals_fail_without_overflow() {
        let vacation = vacation();
        let mut plan = initial_plan();
        for total in [-1e300, 1e300, f64::MAX, f64::MIN] {
            plan.total_cost = total;
            assert!(!cost_accuracy(&plan).passed, "{total}");
        }
        plan.total_cost = 1e300;
        let v = budget(&plan, &vacation);
        assert!(!v.passed);
        assert!(v.message.contains("exceeds budget 130.00"));

        let mut priced = initial_plan();
        priced.days[0].recommendations[0].activity.price = -1e300;
        assert!(!cost_accuracy(&priced).passed);
    }

    #[test]
    fn test_budget_boundary() {
        let vacation = vacation();
        let mut plan = initial_plan();
        plan.total_cost = 130.0;
        assert!(budget(&plan, &vacation).passed);

        plan.total_cost = 130.01;
        let v = budget(&plan, &vacation);
        assert!(!v.passed);
        assert!(v.message.contains("by 0.01"));
    }

    #[tokio::test]
    async fn test_no_hallucination() {
        let catalog = catalog();
        assert!(no_hallucination(&initial_plan(), &catalog).await.passed);

        let mut invented = initial_plan();
        invented.days[0].recommendations[0].activity.id = "moon-landing".to_string();
        let v = no_hallucination(&invented, &catalog).await;
        assert!(!v.passed);
        assert!(v.message.contains("'moon-landing' on 2025-06-10"));

        // 活动存在但日期不对同样算幻觉
        let mut wrong_day = initial_plan();
        wrong_day.days[0].recommendations[0].activity = activity("hike", 12, 30.0, &[Interest::Hiking], "");
        let v = no_hallucination(&wrong_day, &catalog).await;
        assert!(v.message.contains("'hike' on 2025-06-10"));
    }

    #[tokio::test]
    async fn test_no_hallucination_rejects_edited_catalog_records() {
        let catalog = catalog();
        let edits: [(&str, fn(&mut Activity)); 5] = [
            ("price", |a| a.price = 20.0),
            ("related_interests", |a| a.related_interests = [Interest::Cooking].into_iter().collect()),
            ("description", |a| a.description = "Quiet indoor listening room".to_string()),
            ("name", |a| a.name = "Cheap Jazz".to_string()),
            ("location", |a| a.location = "Belem".to_string()),
        ];
        for (field, edit) in edits {
            let mut plan = initial_plan();
            edit(&mut plan.days[0].recommendations[0].activity);
            let v = no_hallucination(&plan, &catalog).await;
            assert!(!v.passed, "{field}");
            assert_eq!(
                v.message,
                format!("activities differ from the catalog in: 'jazz' on 2025-06-10 ({field})")
            );
        }
    }

    #[test]
    fn test_interest_match() {
        let vacation = vacation();
        assert!(interest_match(&initial_plan(), &vacation).passed);

        let mut plan = initial_plan();
        plan.days[2] = day(12, &[]);
        plan.days[1] = day(11, &["sailing"]);
        let v = interest_match(&plan, &vacation);
        assert!(!v.passed);
        assert!(v.message.contains("'sailing'"));
    }
}
