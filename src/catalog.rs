//! Supported breakdown dimensions, well-known row fields and geography metadata.

use crate::types::{BreakdownVar, Geography, MetricConfig};

pub const SUPPORTED_BREAKDOWNS: [BreakdownVar; 3] = [
    BreakdownVar::RaceAndEthnicity,
    BreakdownVar::Age,
    BreakdownVar::Sex,
];

pub const STATE_FIPS_FIELD: &str = "state_fips";

/// Aggregate race category produced by standardization. Never a selectable group.
pub const NOT_HISPANIC: &str = "Not Hispanic or Latino";

pub const COUNTY_DATA_WARNING: &str = "This dataset does not provide county level data";

const STATE_NAMES: &[(&str, &str)] = &[
    ("01", "Alabama"),
    ("02", "Alaska"),
    ("04", "Arizona"),
    ("05", "Arkansas"),
    ("06", "California"),
    ("08", "Colorado"),
    ("09", "Connecticut"),
    ("10", "Delaware"),
    ("11", "District of Columbia"),
    ("12", "Florida"),
    ("13", "Georgia"),
    ("15", "Hawaii"),
    ("16", "Idaho"),
    ("17", "Illinois"),
    ("18", "Indiana"),
    ("19", "Iowa"),
    ("20", "Kansas"),
    ("21", "Kentucky"),
    ("22", "Louisiana"),
    ("23", "Maine"),
    ("24", "Maryland"),
    ("25", "Massachusetts"),
    ("26", "Michigan"),
    ("27", "Minnesota"),
    ("28", "Mississippi"),
    ("29", "Missouri"),
    ("30", "Montana"),
    ("31", "Nebraska"),
    ("32", "Nevada"),
    ("33", "New Hampshire"),
    ("34", "New Jersey"),
    ("35", "New Mexico"),
    ("36", "New York"),
    ("37", "North Carolina"),
    ("38", "North Dakota"),
    ("39", "Ohio"),
    ("40", "Oklahoma"),
    ("41", "Oregon"),
    ("42", "Pennsylvania"),
    ("44", "Rhode Island"),
    ("45", "South Carolina"),
    ("46", "South Dakota"),
    ("47", "Tennessee"),
    ("48", "Texas"),
    ("49", "Utah"),
    ("50", "Vermont"),
    ("51", "Virginia"),
    ("53", "Washington"),
    ("54", "West Virginia"),
    ("55", "Wisconsin"),
    ("56", "Wyoming"),
    ("72", "Puerto Rico"),
];

pub fn state_name(code: &str) -> Option<&'static str> {
    STATE_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// True when the geography sits below the nation but the metric's dataset has
/// no county-level rows to show there.
pub fn lacks_county_data(metric: &MetricConfig, geography: &Geography) -> bool {
    !geography.is_nation() && !metric.supports_county
}
