use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::types::{Geography, GeographyError, MetricConfig, Row};

/// Invoked with the geography the user clicked on.
pub type GeographyCallback = Arc<dyn Fn(Geography) + Send + Sync>;

/// Turns a clicked shape id into a geography and hands it to the caller.
#[derive(Clone, Default)]
pub struct ClickHandler {
    callback: Option<GeographyCallback>,
}

impl ClickHandler {
    pub fn new(callback: GeographyCallback) -> Self {
        ClickHandler { callback: Some(callback) }
    }

    /// Invalid ids are returned as errors and the callback is not invoked.
    pub fn fire(&self, shape_id: &str) -> Result<Geography, GeographyError> {
        let geography: Geography = shape_id.parse()?;
        debug!("Map click on {}", geography);
        if let Some(callback) = &self.callback {
            callback(geography.clone());
        }
        Ok(geography)
    }
}

impl fmt::Debug for ClickHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClickHandler")
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

/// Everything the external choropleth renderer needs for one map.
#[derive(Debug, Clone, Serialize)]
pub struct RenderParams {
    pub data: Vec<Row>,
    pub metric: MetricConfig,
    pub legend_title: String,
    pub legend_visible: bool,
    pub show_counties: bool,
    pub geography: Geography,
    #[serde(skip)]
    pub on_click: ClickHandler,
}

impl RenderParams {
    pub fn click(&self, shape_id: &str) -> Result<Geography, GeographyError> {
        self.on_click.fire(shape_id)
    }
}

pub fn build_render_params(
    metric: &MetricConfig,
    geography: &Geography,
    rows: Vec<Row>,
    on_click: ClickHandler,
) -> RenderParams {
    RenderParams {
        data: rows,
        metric: metric.clone(),
        legend_title: metric.full_card_title_name.clone(),
        legend_visible: geography.is_nation(),
        show_counties: !geography.is_nation(),
        geography: geography.clone(),
        on_click,
    }
}
