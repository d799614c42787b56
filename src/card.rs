//! One map card: plans its queries, owns its filter selection and builds the view.
//!
//! A render pass is split in two. [`MapCard::on_data_ready`] commits the default
//! selection once rows arrive; [`MapCard::view`] is a pure read of the card and the
//! store response.

use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

use crate::catalog::{self, COUNTY_DATA_WARNING};
use crate::data::{DatasetStore, QueryResponse};
use crate::filter::RowFilter;
use crate::planner::{plan_queries, QueryPlan};
use crate::render::{build_render_params, ClickHandler, GeographyCallback, RenderParams};
use crate::selection::{CardKey, FilterSelection, FilterStateMachine};
use crate::types::{BreakdownSelection, BreakdownVar, Geography, MetricConfig};

#[derive(Clone)]
pub struct MapCardProps {
    pub geography: Geography,
    pub metric: Option<MetricConfig>,
    pub nonstandardized_race: bool,
    pub enable_filter: bool,
    pub breakdown: BreakdownSelection,
    pub on_geography_change: Option<GeographyCallback>,
}

impl MapCardProps {
    pub fn new(geography: Geography, metric: Option<MetricConfig>, breakdown: BreakdownSelection) -> Self {
        MapCardProps {
            geography,
            metric,
            nonstandardized_race: false,
            enable_filter: false,
            breakdown,
            on_geography_change: None,
        }
    }

    pub fn key(&self) -> CardKey {
        CardKey {
            geography: self.geography.clone(),
            breakdown: self.breakdown,
            metric_id: self.metric.as_ref().map(|m| m.metric_id.clone()),
        }
    }
}

impl fmt::Debug for MapCardProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapCardProps")
            .field("geography", &self.geography)
            .field("metric", &self.metric)
            .field("nonstandardized_race", &self.nonstandardized_race)
            .field("enable_filter", &self.enable_filter)
            .field("breakdown", &self.breakdown)
            .finish()
    }
}

/// Conditions surfaced to the user instead of being raised as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardNotice {
    DataMissing,
    UnsupportedGranularity,
    ConfigurationAbsent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl CardNotice {
    pub fn message(self) -> &'static str {
        match self {
            CardNotice::DataMissing => "No data available",
            CardNotice::UnsupportedGranularity => COUNTY_DATA_WARNING,
            CardNotice::ConfigurationAbsent => "No metric configured",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            CardNotice::DataMissing => Severity::Error,
            CardNotice::UnsupportedGranularity => Severity::Warning,
            CardNotice::ConfigurationAbsent => Severity::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub notice: CardNotice,
    pub severity: Severity,
    pub message: &'static str,
}

impl From<CardNotice> for Alert {
    fn from(notice: CardNotice) -> Self {
        Alert {
            notice,
            severity: notice.severity(),
            message: notice.message(),
        }
    }
}

/// The "Filtered by" dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterMenu {
    pub selected: FilterSelection,
    /// Disabled entries for dimensions that cannot be filtered yet.
    pub unavailable: Vec<String>,
    /// Selectable race values, when race is part of the breakdown.
    pub races: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardBody {
    Map(RenderParams),
    /// Data is still loading.
    Loading,
    Empty,
}

#[derive(Debug, Clone, Serialize)]
pub struct CardView {
    pub title: String,
    pub race_info: bool,
    pub filter_menu: Option<FilterMenu>,
    pub alerts: Vec<Alert>,
    pub body: CardBody,
}

impl CardView {
    pub fn has_notice(&self, notice: CardNotice) -> bool {
        self.alerts.iter().any(|a| a.notice == notice)
    }

    pub fn render_params(&self) -> Option<&RenderParams> {
        match &self.body {
            CardBody::Map(params) => Some(params),
            CardBody::Loading | CardBody::Empty => None,
        }
    }
}

#[derive(Debug)]
pub struct MapCard {
    props: MapCardProps,
    key: CardKey,
    selection: FilterStateMachine,
}

impl MapCard {
    pub fn new(props: MapCardProps) -> Self {
        let key = props.key();
        MapCard {
            props,
            key,
            selection: FilterStateMachine::new(),
        }
    }

    pub fn props(&self) -> &MapCardProps {
        &self.props
    }

    pub fn key(&self) -> &CardKey {
        &self.key
    }

    pub fn selection(&self) -> &FilterSelection {
        self.selection.state()
    }

    /// Replaces the props. A different [`CardKey`] starts a fresh selection.
    pub fn set_props(&mut self, props: MapCardProps) {
        let key = props.key();
        if key != self.key {
            debug!("Card key changed from {:?} to {:?}, resetting selection", self.key, key);
            self.selection = FilterStateMachine::new();
            self.key = key;
        }
        self.props = props;
    }

    pub fn displayed_breakdown(&self) -> BreakdownVar {
        self.props.breakdown.displayed()
    }

    /// Empty when no metric is configured.
    pub fn queries(&self) -> QueryPlan {
        match &self.props.metric {
            Some(metric) => plan_queries(self.props.breakdown, metric, self.props.nonstandardized_race),
            None => QueryPlan::new(),
        }
    }

    /// Response for the displayed dimension, or `None` without a metric.
    pub fn fetch(&self, store: &dyn DatasetStore) -> Option<QueryResponse> {
        let queries = self.queries();
        queries
            .get(&self.displayed_breakdown())
            .map(|query| store.get_metrics(query))
    }

    pub fn on_data_ready(&mut self, response: &QueryResponse) -> bool {
        let values = response.unique_field_values(self.displayed_breakdown().field());
        let changed = self.selection.on_data_ready(&values);
        if changed {
            info!("Default filter for {:?} set to {:?}", self.key, self.selection.value());
        }
        changed
    }

    pub fn select(&mut self, value: impl Into<String>) {
        self.selection.select(value);
    }

    pub fn view(&self, response: Option<&QueryResponse>) -> CardView {
        let props = &self.props;
        let title = match &props.metric {
            Some(metric) => format!(
                "{} in {}",
                metric.full_card_title_name,
                props.geography.full_display_name()
            ),
            None => props.geography.full_display_name(),
        };
        let race_info = props.breakdown.includes(BreakdownVar::RaceAndEthnicity);

        let mut alerts: Vec<Alert> = Vec::new();
        let Some(metric) = &props.metric else {
            alerts.push(CardNotice::ConfigurationAbsent.into());
            return CardView {
                title,
                race_info,
                filter_menu: None,
                alerts,
                body: CardBody::Empty,
            };
        };

        if catalog::lacks_county_data(metric, &props.geography) {
            alerts.push(CardNotice::UnsupportedGranularity.into());
        }

        // No response yet is the same as a pending one.
        let response = match response {
            Some(response) if !response.is_pending() => response,
            _ => {
                return CardView {
                    title,
                    race_info,
                    filter_menu: None,
                    alerts,
                    body: CardBody::Loading,
                }
            }
        };

        let dimension = self.displayed_breakdown();
        let filter_menu = (props.enable_filter && !response.data_is_missing())
            .then(|| self.filter_menu(response));

        if response.data_is_missing() {
            alerts.push(CardNotice::DataMissing.into());
            return CardView {
                title,
                race_info,
                filter_menu,
                alerts,
                body: CardBody::Empty,
            };
        }

        let rows = RowFilter {
            metric,
            dimension,
            geography: &props.geography,
            filter_enabled: props.enable_filter,
            filter_value: self.selection.value(),
        }
        .apply(response.rows());

        let on_click = props
            .on_geography_change
            .clone()
            .map(ClickHandler::new)
            .unwrap_or_default();

        CardView {
            title,
            race_info,
            filter_menu,
            alerts,
            body: CardBody::Map(build_render_params(metric, &props.geography, rows, on_click)),
        }
    }

    fn filter_menu(&self, response: &QueryResponse) -> FilterMenu {
        let breakdown = self.props.breakdown;
        let mut unavailable = Vec::new();
        for dimension in [BreakdownVar::Age, BreakdownVar::Sex] {
            if breakdown.includes(dimension) {
                unavailable.push(format!("{} [unavailable]", dimension.label()));
            }
        }
        let races = breakdown
            .includes(BreakdownVar::RaceAndEthnicity)
            .then(|| response.unique_field_values(self.displayed_breakdown().field()));

        FilterMenu {
            selected: self.selection.state().clone(),
            unavailable,
            races,
        }
    }

    /// Fetch, commit the default selection, then view.
    pub fn render(&mut self, store: &dyn DatasetStore) -> CardView {
        let response = self.fetch(store);
        if let Some(response) = &response {
            self.on_data_ready(response);
        }
        self.view(response.as_ref())
    }
}

/// One-shot card pass with an optional user selection applied after the default.
pub fn render_card(store: &dyn DatasetStore, props: MapCardProps, select: Option<&str>) -> CardView {
    let mut card = MapCard::new(props);
    let response = card.fetch(store);
    if let Some(response) = &response {
        card.on_data_ready(response);
    }
    if let Some(value) = select {
        card.select(value);
    }
    card.view(response.as_ref())
}
