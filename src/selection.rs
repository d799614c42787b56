use serde::Serialize;

use crate::types::{BreakdownSelection, Geography};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum FilterSelection {
    #[default]
    Unset,
    Set(String),
}

/// Which breakdown value is highlighted on one card.
///
/// A machine is never reset; the owning card builds a fresh one per [`CardKey`].
#[derive(Debug, Clone, Default)]
pub struct FilterStateMachine {
    state: FilterSelection,
}

impl FilterStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FilterSelection {
        &self.state
    }

    pub fn value(&self) -> Option<&str> {
        match &self.state {
            FilterSelection::Unset => None,
            FilterSelection::Set(v) => Some(v),
        }
    }

    /// Lexicographically smallest observed value.
    pub fn default_for(values: &[String]) -> Option<&String> {
        values.iter().min()
    }

    /// Commits the default once data is available. Returns whether the state changed.
    pub fn on_data_ready(&mut self, values: &[String]) -> bool {
        if self.state != FilterSelection::Unset {
            return false;
        }
        match Self::default_for(values) {
            Some(v) => {
                self.state = FilterSelection::Set(v.clone());
                true
            }
            None => false,
        }
    }

    pub fn select(&mut self, value: impl Into<String>) {
        self.state = FilterSelection::Set(value.into());
    }
}

/// Identity of one card configuration. Selection state never crosses keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CardKey {
    pub geography: Geography,
    pub breakdown: BreakdownSelection,
    pub metric_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn first_batch_sets_smallest_value() {
        let mut machine = FilterStateMachine::new();
        assert_eq!(machine.state(), &FilterSelection::Unset);
        assert!(machine.on_data_ready(&values(&["White", "Black", "Asian"])));
        assert_eq!(machine.state(), &FilterSelection::Set("Asian".to_string()));
    }

    #[test]
    fn later_batches_do_not_override() {
        let mut machine = FilterStateMachine::new();
        machine.on_data_ready(&values(&["Black", "White"]));
        assert!(!machine.on_data_ready(&values(&["Asian"])));
        assert_eq!(machine.value(), Some("Black"));
    }

    #[test]
    fn empty_batch_stays_unset() {
        let mut machine = FilterStateMachine::new();
        assert!(!machine.on_data_ready(&[]));
        assert_eq!(machine.value(), None);
    }

    #[test]
    fn user_selection_is_unconditional() {
        let mut machine = FilterStateMachine::new();
        machine.on_data_ready(&values(&["Asian", "White"]));
        machine.select("White");
        assert_eq!(machine.value(), Some("White"));
        machine.select("Martian");
        assert_eq!(machine.value(), Some("Martian"));
    }
}
