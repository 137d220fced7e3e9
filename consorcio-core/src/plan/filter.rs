use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::models::{Category, Plan};

/// Snapshot of the catalog filters. Every field is an independent constraint;
/// `None` (or an empty set/string) leaves that axis unconstrained.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FilterCriteria {
    pub category: Option<Category>,
    pub credit_min: Option<f64>,
    pub credit_max: Option<f64>,
    pub term_min: Option<u32>,
    pub term_max: Option<u32>,
    pub bid_min: Option<f64>,
    pub bid_max: Option<f64>,
    pub admin_fee_max: Option<f64>,
    #[serde(default)]
    pub administrators: BTreeSet<String>,
    #[serde(default)]
    pub search: String,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn credit_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.credit_min = min;
        self.credit_max = max;
        self
    }

    pub fn term_range(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.term_min = min;
        self.term_max = max;
        self
    }

    pub fn bid_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.bid_min = min;
        self.bid_max = max;
        self
    }

    pub fn admin_fee_max(mut self, max: f64) -> Self {
        self.admin_fee_max = Some(max);
        self
    }

    pub fn administrator(mut self, name: impl Into<String>) -> Self {
        self.administrators.insert(name.into());
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = text.into();
        self
    }

    /// Number of constraints that restrict the result.
    pub fn active_constraints(&self) -> usize {
        [
            self.category.is_some(),
            self.credit_min.is_some(),
            self.credit_max.is_some(),
            self.term_min.is_some(),
            self.term_max.is_some(),
            self.bid_min.is_some(),
            self.bid_max.is_some(),
            self.admin_fee_max.is_some(),
            !self.administrators.is_empty(),
            !self.search.is_empty(),
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    pub fn is_unconstrained(&self) -> bool {
        self.active_constraints() == 0
    }

    /// True when the plan passes every active constraint.
    pub fn matches(&self, plan: &Plan) -> bool {
        if let Some(category) = self.category {
            if plan.category != category {
                return false;
            }
        }
        if !within(plan.credit_value, self.credit_min, self.credit_max) {
            return false;
        }
        if !within(plan.term_months, self.term_min, self.term_max) {
            return false;
        }
        if !within(plan.average_bid_percent, self.bid_min, self.bid_max) {
            return false;
        }
        if !within(plan.admin_fee_percent, None, self.admin_fee_max) {
            return false;
        }
        if !self.administrators.is_empty() && !self.administrators.contains(&plan.administrator) {
            return false;
        }
        if !self.search.is_empty() {
            let needle = self.search.to_lowercase();
            if !plan.search_haystack().contains(&needle) {
                return false;
            }
        }
        true
    }
}

fn within<T: PartialOrd>(value: T, min: Option<T>, max: Option<T>) -> bool {
    if let Some(min) = min {
        if value < min {
            return false;
        }
    }
    if let Some(max) = max {
        if value > max {
            return false;
        }
    }
    true
}

/// Stable filter: the plans matching `criteria`, in catalog order.
pub fn apply<'a>(plans: &'a [Plan], criteria: &FilterCriteria) -> Vec<&'a Plan> {
    let matched: Vec<&Plan> = plans.iter().filter(|plan| criteria.matches(plan)).collect();
    debug!(
        total = plans.len(),
        matched = matched.len(),
        constraints = criteria.active_constraints(),
        "catalog filter evaluated"
    );
    matched
}

/// Sorted, de-duplicated administrator names, used to offer the multi-select.
pub fn available_administrators(plans: &[Plan]) -> Vec<String> {
    plans
        .iter()
        .map(|plan| plan.administrator.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::models::PlanDraft;
    use chrono::Utc;

    fn plan(id: &str, admin: &str, category: Category, credit: f64, term: u32) -> Plan {
        Plan::from_draft(
            id,
            PlanDraft {
                credit_value: credit,
                term_months: term,
                ..PlanDraft::new(admin, category)
            },
            Utc::now(),
        )
    }

    fn catalog() -> Vec<Plan> {
        let mut plans = vec![
            plan("a", "Rodobens", Category::Automobile, 60_000.0, 72),
            plan("b", "Porto Seguro", Category::Automobile, 100_000.0, 84),
            plan("c", "Porto Seguro", Category::RealEstate, 300_000.0, 200),
            plan("d", "Rodobens", Category::Motorcycle, 22_000.0, 60),
        ];
        plans[0].average_bid_percent = 25.0;
        plans[0].admin_fee_percent = 16.0;
        plans[0].group = Some("A123".into());
        plans[1].average_bid_percent = 30.0;
        plans[1].admin_fee_percent = 17.0;
        plans[2].average_bid_percent = 35.0;
        plans[2].admin_fee_percent = 18.0;
        plans[2].notes = Some("Residencial".into());
        plans[3].average_bid_percent = 18.0;
        plans[3].admin_fee_percent = 15.0;
        plans
    }

    fn ids(plans: &[&Plan]) -> Vec<String> {
        plans.iter().map(|plan| plan.id.clone()).collect()
    }

    #[test]
    fn unconstrained_returns_everything_in_order() {
        let plans = catalog();
        let criteria = FilterCriteria::new();
        assert!(criteria.is_unconstrained());
        assert_eq!(ids(&apply(&plans, &criteria)), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn numeric_bounds_are_inclusive() {
        let plans = catalog();
        let criteria = FilterCriteria::new().credit_range(Some(60_000.0), Some(100_000.0));
        assert_eq!(ids(&apply(&plans, &criteria)), vec!["a", "b"]);

        let criteria = FilterCriteria::new().term_range(Some(60), Some(72));
        assert_eq!(ids(&apply(&plans, &criteria)), vec!["a", "d"]);

        let criteria = FilterCriteria::new().bid_range(Some(25.0), Some(30.0));
        assert_eq!(ids(&apply(&plans, &criteria)), vec!["a", "b"]);

        let criteria = FilterCriteria::new().admin_fee_max(16.0);
        assert_eq!(ids(&apply(&plans, &criteria)), vec!["a", "d"]);
    }

    #[test]
    fn administrator_multi_select() {
        let plans = catalog();
        let criteria = FilterCriteria::new().administrator("Porto Seguro");
        assert_eq!(ids(&apply(&plans, &criteria)), vec!["b", "c"]);

        let criteria = criteria.administrator("Rodobens");
        assert_eq!(ids(&apply(&plans, &criteria)), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn search_is_case_insensitive_over_all_text_fields() {
        let plans = catalog();
        assert_eq!(
            ids(&apply(&plans, &FilterCriteria::new().search("a123"))),
            vec!["a"]
        );
        assert_eq!(
            ids(&apply(&plans, &FilterCriteria::new().search("RESIDENCIAL"))),
            vec!["c"]
        );
        assert_eq!(
            ids(&apply(&plans, &FilterCriteria::new().search("motorcycle"))),
            vec!["d"]
        );
        assert!(apply(&plans, &FilterCriteria::new().search("consórcio")).is_empty());
    }

    #[test]
    fn search_matches_displayed_category_labels() {
        let plans = catalog();
        assert_eq!(
            ids(&apply(&plans, &FilterCriteria::new().search("imóvel"))),
            vec!["c"]
        );
        assert_eq!(
            ids(&apply(&plans, &FilterCriteria::new().search("Automóvel"))),
            vec!["a", "b"]
        );
        for category in Category::ALL {
            let label = category.label_pt().to_lowercase();
            let matched = apply(&plans, &FilterCriteria::new().search(label.as_str()));
            assert!(matched.iter().all(|plan| plan.category == category));
        }
    }

    #[test]
    fn constraints_are_anded() {
        let plans = catalog();
        let criteria = FilterCriteria::new()
            .category(Category::Automobile)
            .administrator("Porto Seguro")
            .credit_range(Some(50_000.0), None);
        assert_eq!(criteria.active_constraints(), 3);
        assert_eq!(ids(&apply(&plans, &criteria)), vec!["b"]);
    }

    #[test]
    fn result_is_an_ordered_subsequence_satisfying_every_constraint() {
        let plans = catalog();
        let criteria_set = [
            FilterCriteria::new().term_range(None, Some(84)),
            FilterCriteria::new().bid_range(Some(18.0), None).search("o"),
            FilterCriteria::new().category(Category::Truck),
        ];
        for criteria in &criteria_set {
            let matched = apply(&plans, criteria);
            let positions: Vec<usize> = matched
                .iter()
                .map(|m| plans.iter().position(|p| p.id == m.id).unwrap())
                .collect();
            assert!(positions.windows(2).all(|w| w[0] < w[1]));
            assert!(matched.iter().all(|plan| criteria.matches(plan)));
        }
    }

    #[test]
    fn administrators_are_sorted_and_unique() {
        assert_eq!(
            available_administrators(&catalog()),
            vec!["Porto Seguro".to_string(), "Rodobens".to_string()]
        );
    }
}
