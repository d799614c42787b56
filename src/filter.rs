//! Narrowing of store rows down to what the map should draw.

use serde_json::Value;

use crate::catalog::{NOT_HISPANIC, STATE_FIPS_FIELD};
use crate::types::{field_text, BreakdownVar, Geography, MetricConfig, Row};

pub type RowPredicate<'a> = Box<dyn Fn(&Row) -> bool + 'a>;

/// Arguments of one filtering pass.
#[derive(Debug, Clone)]
pub struct RowFilter<'a> {
    pub metric: &'a MetricConfig,
    pub dimension: BreakdownVar,
    pub geography: &'a Geography,
    pub filter_enabled: bool,
    /// `None` while no selection has been made; with filtering enabled nothing matches.
    pub filter_value: Option<&'a str>,
}

impl<'a> RowFilter<'a> {
    /// Predicates in evaluation order. A row survives only if it passes all of them.
    pub fn predicates(&self) -> Vec<RowPredicate<'a>> {
        let metric: &'a MetricConfig = self.metric;
        let geography: &'a Geography = self.geography;
        let metric_id = metric.metric_id.as_str();

        let mut predicates: Vec<RowPredicate<'a>> = Vec::new();
        predicates.push(Box::new(|row: &Row| {
            !field_equals(row, BreakdownVar::RaceAndEthnicity.field(), NOT_HISPANIC)
        }));
        predicates.push(Box::new(move |row: &Row| {
            !matches!(row.get(metric_id), None | Some(Value::Null))
        }));

        // Scoped to the state only; county geographies still see every county row of their state.
        if let Some(state_code) = geography.state_code() {
            predicates.push(Box::new(move |row: &Row| {
                field_equals(row, STATE_FIPS_FIELD, state_code)
            }));
        }

        if self.filter_enabled {
            let field = self.dimension.field();
            let value = self.filter_value;
            predicates.push(Box::new(move |row: &Row| match value {
                Some(value) => field_equals(row, field, value),
                None => false,
            }));
        }

        predicates
    }

    /// Returns a new sequence; `rows` is never modified.
    pub fn apply(&self, rows: &[Row]) -> Vec<Row> {
        let predicates = self.predicates();
        rows.iter()
            .filter(|row| predicates.iter().all(|predicate| predicate(row)))
            .cloned()
            .collect()
    }
}

fn field_equals(row: &Row, field: &str, expected: &str) -> bool {
    field_text(row, field).is_some_and(|text| text == expected)
}
