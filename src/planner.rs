use std::collections::BTreeMap;

use crate::catalog::SUPPORTED_BREAKDOWNS;
use crate::types::{BreakdownSelection, BreakdownSpec, BreakdownVar, MetricConfig, MetricQuery};

pub type QueryPlan = BTreeMap<BreakdownVar, MetricQuery>;

/// One state-level query per catalog dimension included by `requested`.
///
/// The standardization flag only reaches the race/ethnicity query.
pub fn plan_queries(
    requested: BreakdownSelection,
    metric: &MetricConfig,
    nonstandardized_race: bool,
) -> QueryPlan {
    SUPPORTED_BREAKDOWNS
        .iter()
        .copied()
        .filter(|&breakdown| requested.includes(breakdown))
        .map(|breakdown| {
            let spec = BreakdownSpec::by_state().add_breakdown(breakdown, nonstandardized_race);
            (breakdown, MetricQuery::new(metric.metric_id.clone(), spec))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeographyLevel;

    fn metric() -> MetricConfig {
        MetricConfig::new("covid_cases_per_100k", "COVID-19 cases per 100k")
    }

    #[test]
    fn all_plans_every_catalog_dimension() {
        let plan = plan_queries(BreakdownSelection::All, &metric(), false);
        let keys: Vec<_> = plan.keys().copied().collect();
        assert_eq!(keys, SUPPORTED_BREAKDOWNS.to_vec());
        for (breakdown, query) in &plan {
            assert_eq!(query.breakdowns.dimension, Some(*breakdown));
            assert_eq!(query.breakdowns.geography, GeographyLevel::State);
            assert_eq!(query.metric_id, "covid_cases_per_100k");
        }
    }

    #[test]
    fn single_dimension_plans_one_query() {
        for breakdown in SUPPORTED_BREAKDOWNS {
            let plan = plan_queries(BreakdownSelection::One(breakdown), &metric(), false);
            assert_eq!(plan.len(), 1);
            assert!(plan.contains_key(&breakdown));
        }
    }

    #[test]
    fn standardization_flag_reaches_race_only() {
        let plan = plan_queries(BreakdownSelection::All, &metric(), true);
        assert!(plan[&BreakdownVar::RaceAndEthnicity].breakdowns.nonstandardized);
        assert!(!plan[&BreakdownVar::Age].breakdowns.nonstandardized);
        assert!(!plan[&BreakdownVar::Sex].breakdowns.nonstandardized);
    }
}
