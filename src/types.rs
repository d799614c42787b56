use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::catalog;

/// Code of the nation-level geography.
pub const USA_FIPS: &str = "00";

/// A dataset row. Absent keys and explicit `null` values are distinct.
pub type Row = serde_json::Map<String, Value>;

/// Text form of a scalar row field. Null, missing, arrays and objects have none.
pub fn field_text<'r>(row: &'r Row, field: &str) -> Option<Cow<'r, str>> {
    match row.get(field)? {
        Value::String(s) => Some(Cow::Borrowed(s)),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GeographyError {
    #[error("geography code is empty")]
    Empty,
    #[error("geography code must be numeric: {0}")]
    NotNumeric(String),
    #[error("geography code must have 2 (state) or 5 (county) digits: {0}")]
    BadLength(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeographyLevel {
    Nation,
    State,
    County,
}

/// A node of the nation → state → county hierarchy, identified by its FIPS code.
///
/// Construction goes through [`Geography::from_str`], so a county always carries
/// its two-digit parent state prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Geography {
    code: String,
}

impl Geography {
    pub fn nation() -> Self {
        Geography { code: USA_FIPS.to_string() }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn level(&self) -> GeographyLevel {
        if self.code == USA_FIPS {
            GeographyLevel::Nation
        } else if self.code.len() == 2 {
            GeographyLevel::State
        } else {
            GeographyLevel::County
        }
    }

    pub fn is_nation(&self) -> bool {
        self.level() == GeographyLevel::Nation
    }

    pub fn is_state(&self) -> bool {
        self.level() == GeographyLevel::State
    }

    pub fn is_county(&self) -> bool {
        self.level() == GeographyLevel::County
    }

    /// Two-digit state code: the code itself for a state, the prefix for a county.
    pub fn state_code(&self) -> Option<&str> {
        match self.level() {
            GeographyLevel::Nation => None,
            GeographyLevel::State | GeographyLevel::County => Some(&self.code[..2]),
        }
    }

    pub fn parent(&self) -> Option<Geography> {
        match self.level() {
            GeographyLevel::Nation => None,
            GeographyLevel::State => Some(Geography::nation()),
            GeographyLevel::County => Some(Geography { code: self.code[..2].to_string() }),
        }
    }

    /// Path from the nation down to this geography, inclusive.
    pub fn breadcrumbs(&self) -> Vec<Geography> {
        let mut chain = vec![self.clone()];
        let mut current = self.parent();
        while let Some(parent) = current {
            current = parent.parent();
            chain.push(parent);
        }
        chain.reverse();
        chain
    }

    pub fn display_name(&self) -> String {
        match self.level() {
            GeographyLevel::Nation => "United States".to_string(),
            GeographyLevel::State => state_display_name(&self.code),
            GeographyLevel::County => format!("County {}", self.code),
        }
    }

    pub fn full_display_name(&self) -> String {
        match self.level() {
            GeographyLevel::Nation => "the United States".to_string(),
            GeographyLevel::State => self.display_name(),
            GeographyLevel::County => format!(
                "{}, {}",
                self.display_name(),
                state_display_name(&self.code[..2])
            ),
        }
    }
}

fn state_display_name(code: &str) -> String {
    catalog::state_name(code)
        .map(str::to_string)
        .unwrap_or_else(|| format!("State {}", code))
}

impl FromStr for Geography {
    type Err = GeographyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.is_empty() {
            return Err(GeographyError::Empty);
        }
        if !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(GeographyError::NotNumeric(code.to_string()));
        }
        match code.len() {
            2 | 5 => Ok(Geography { code: code.to_string() }),
            _ => Err(GeographyError::BadLength(code.to_string())),
        }
    }
}

impl TryFrom<String> for Geography {
    type Error = GeographyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Geography> for String {
    fn from(value: Geography) -> Self {
        value.code
    }
}

impl fmt::Display for Geography {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// A concrete demographic dimension. Declaration order is catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakdownVar {
    RaceAndEthnicity,
    Age,
    Sex,
}

impl BreakdownVar {
    /// Row field holding this dimension's value.
    pub fn field(self) -> &'static str {
        match self {
            BreakdownVar::RaceAndEthnicity => "race_and_ethnicity",
            BreakdownVar::Age => "age",
            BreakdownVar::Sex => "sex",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BreakdownVar::RaceAndEthnicity => "Race and Ethnicity",
            BreakdownVar::Age => "Age",
            BreakdownVar::Sex => "Sex",
        }
    }
}

impl fmt::Display for BreakdownVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

impl FromStr for BreakdownVar {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        catalog::SUPPORTED_BREAKDOWNS
            .iter()
            .copied()
            .find(|b| b.field() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown breakdown: {}", s))
    }
}

/// The requested breakdown: one dimension, or every supported dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BreakdownSelection {
    One(BreakdownVar),
    All,
}

impl BreakdownSelection {
    pub fn includes(self, breakdown: BreakdownVar) -> bool {
        match self {
            BreakdownSelection::All => true,
            BreakdownSelection::One(b) => b == breakdown,
        }
    }

    /// The concrete dimension shown on the map. `All` shows race/ethnicity.
    pub fn displayed(self) -> BreakdownVar {
        match self {
            BreakdownSelection::All => BreakdownVar::RaceAndEthnicity,
            BreakdownSelection::One(b) => b,
        }
    }
}

impl fmt::Display for BreakdownSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakdownSelection::All => f.write_str("all"),
            BreakdownSelection::One(b) => b.fmt(f),
        }
    }
}

impl FromStr for BreakdownSelection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(BreakdownSelection::All);
        }
        Ok(BreakdownSelection::One(s.parse()?))
    }
}

impl TryFrom<String> for BreakdownSelection {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BreakdownSelection> for String {
    fn from(value: BreakdownSelection) -> Self {
        value.to_string()
    }
}

/// Which numeric row field to map, and how to title it.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct MetricConfig {
    #[serde(rename = "id")]
    pub metric_id: String,
    #[serde(rename = "title")]
    pub full_card_title_name: String,
    /// Whether the underlying dataset has county-level rows.
    #[serde(default)]
    pub supports_county: bool,
}

impl MetricConfig {
    pub fn new(metric_id: impl Into<String>, full_card_title_name: impl Into<String>) -> Self {
        MetricConfig {
            metric_id: metric_id.into(),
            full_card_title_name: full_card_title_name.into(),
            supports_county: false,
        }
    }
}

/// Geography aggregation and demographic split requested from the dataset store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BreakdownSpec {
    pub geography: GeographyLevel,
    pub dimension: Option<BreakdownVar>,
    pub nonstandardized: bool,
}

impl BreakdownSpec {
    pub fn by_state() -> Self {
        BreakdownSpec {
            geography: GeographyLevel::State,
            dimension: None,
            nonstandardized: false,
        }
    }

    /// The nonstandardized flag only applies to race/ethnicity.
    pub fn add_breakdown(mut self, dimension: BreakdownVar, nonstandardized: bool) -> Self {
        self.dimension = Some(dimension);
        self.nonstandardized = nonstandardized && dimension == BreakdownVar::RaceAndEthnicity;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MetricQuery {
    pub metric_id: String,
    pub breakdowns: BreakdownSpec,
}

impl MetricQuery {
    pub fn new(metric_id: impl Into<String>, breakdowns: BreakdownSpec) -> Self {
        MetricQuery {
            metric_id: metric_id.into(),
            breakdowns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_geography_levels() {
        let nation: Geography = "00".parse().unwrap();
        assert!(nation.is_nation());
        assert_eq!(nation.state_code(), None);

        let state: Geography = "06".parse().unwrap();
        assert!(state.is_state());
        assert_eq!(state.state_code(), Some("06"));

        let county: Geography = "06037".parse().unwrap();
        assert!(county.is_county());
        assert_eq!(county.state_code(), Some("06"));
        assert_eq!(county.parent(), Some(state));
    }

    #[test]
    fn breadcrumbs_run_from_nation_down() {
        let county: Geography = "06037".parse().unwrap();
        let codes: Vec<String> = county.breadcrumbs().into_iter().map(String::from).collect();
        assert_eq!(codes, vec!["00", "06", "06037"]);
        assert_eq!(Geography::nation().breadcrumbs(), vec![Geography::nation()]);
    }

    #[test]
    fn rejects_malformed_codes() {
        assert_eq!("".parse::<Geography>(), Err(GeographyError::Empty));
        assert!(matches!("CA".parse::<Geography>(), Err(GeographyError::NotNumeric(_))));
        assert!(matches!("123".parse::<Geography>(), Err(GeographyError::BadLength(_))));
    }

    #[test]
    fn display_names() {
        assert_eq!(Geography::nation().full_display_name(), "the United States");
        let state: Geography = "06".parse().unwrap();
        assert_eq!(state.full_display_name(), "California");
        let county: Geography = "06037".parse().unwrap();
        assert_eq!(county.full_display_name(), "County 06037, California");
    }

    #[test]
    fn breakdown_selection_round_trips_through_strings() {
        let all: BreakdownSelection = "all".parse().unwrap();
        assert_eq!(all, BreakdownSelection::All);
        assert_eq!(all.displayed(), BreakdownVar::RaceAndEthnicity);

        let age: BreakdownSelection = "age".parse().unwrap();
        assert_eq!(age, BreakdownSelection::One(BreakdownVar::Age));
        assert!(age.includes(BreakdownVar::Age));
        assert!(!age.includes(BreakdownVar::Sex));

        assert!("income".parse::<BreakdownSelection>().is_err());
    }

    #[test]
    fn nonstandardized_flag_only_sticks_to_race() {
        let race = BreakdownSpec::by_state().add_breakdown(BreakdownVar::RaceAndEthnicity, true);
        assert!(race.nonstandardized);
        let sex = BreakdownSpec::by_state().add_breakdown(BreakdownVar::Sex, true);
        assert!(!sex.nonstandardized);
    }
}
