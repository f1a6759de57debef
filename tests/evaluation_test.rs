//! 评估引擎集成测试：行程中的活动与天气副本被改动时，检查以 data/ 下的数据源为准

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use itinera::domain::{Interest, TravelPlan, VacationInfo, WeatherCondition};
    use itinera::evaluation::{CheckKind, EvaluationEngine};
    use itinera::providers::{ActivityProvider, Catalog};

    fn read<T: serde::de::DeserializeOwned>(name: &str) -> T {
        let raw = std::fs::read_to_string(Path::new("data").join(name)).unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    fn catalog() -> Arc<Catalog> {
        Arc::new(Catalog::load("data").unwrap())
    }

    fn engine() -> EvaluationEngine {
        let catalog = catalog();
        EvaluationEngine::new(catalog.clone(), catalog)
    }

    fn vacation() -> VacationInfo {
        read("vacation.json")
    }

    fn initial_plan() -> TravelPlan {
        read("initial_plan.json")
    }

    async fn failed(plan: &TravelPlan) -> Vec<CheckKind> {
        engine()
            .evaluate(plan, &vacation(), None)
            .await
            .failures()
            .map(|v| v.check)
            .collect()
    }

    #[tokio::test]
    async fn test_lowered_price_does_not_pass_budget_repair() {
        let mut plan = initial_plan();
        plan.days[0].recommendations[0].activity.price = 20.0;
        plan.total_cost = 130.0;

        let report = engine().evaluate(&plan, &vacation(), None).await;
        assert!(!report.all_passed());
        let hallucination = report.verdict(CheckKind::NoHallucination).unwrap();
        assert!(hallucination.message.contains("'jazz-club' on 2025-06-10 (price)"));
        let cost = report.verdict(CheckKind::CostAccuracy).unwrap();
        assert!(cost.message.contains("declared total 130.00"));
        assert!(cost.message.contains("sum to 150.00"));
    }

    #[tokio::test]
    async fn test_disguised_outdoor_activity_on_rainy_day_fails() {
        let catalog = catalog();
        let date = chrono::NaiveDate::from_ymd_opt(2025, 6, 11).unwrap();
        let mut walk = catalog.activity("street-art-walk").await.unwrap();
        walk.related_interests = [Interest::Cooking].into_iter().collect();
        walk.description = "Indoor mural workshop.".to_string();

        let mut plan = initial_plan().without_activity("gallery-tour");
        let day = plan.days.iter_mut().find(|d| d.date == date).unwrap();
        day.weather.condition = WeatherCondition::Sunny;
        day.recommendations[0].activity = walk;
        let plan = plan.with_recomputed_total();
        assert_eq!(plan.total_cost_cents(), 9000);

        let report = engine().evaluate(&plan, &vacation(), None).await;
        let weather = report.verdict(CheckKind::WeatherCompatibility).unwrap();
        assert!(!weather.passed);
        assert!(weather.message.contains("plan declares sunny"));
        assert!(weather.message.contains("street-art-walk"));
        assert!(report
            .verdict(CheckKind::NoHallucination)
            .unwrap()
            .message
            .contains("(description, related_interests)"));
    }

    #[tokio::test]
    async fn test_untouched_repair_still_passes() {
        assert_eq!(failed(&initial_plan()).await, vec![CheckKind::Budget]);
        assert!(failed(&initial_plan().without_activity("gallery-tour")).await.is_empty());
    }
}
