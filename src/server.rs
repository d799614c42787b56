use crate::card::{render_card, CardView, MapCardProps};
use crate::config::AppConfig;
use crate::data::TableStore;
use crate::render::ClickHandler;
use crate::types::{BreakdownSelection, Geography, GeographyLevel};
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{info, warn};

pub struct AppState {
    pub store: TableStore,
    pub config: AppConfig,
}

#[derive(Debug, Deserialize)]
pub struct CardParams {
    #[serde(default = "nation_code")]
    pub fips: String,
    pub metric: Option<String>,
    #[serde(default = "all_breakdowns")]
    pub breakdown: String,
    #[serde(default)]
    pub enable_filter: bool,
    pub select: Option<String>,
    #[serde(default)]
    pub nonstandardized: bool,
}

fn nation_code() -> String {
    crate::types::USA_FIPS.to_string()
}

fn all_breakdowns() -> String {
    "all".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ClickParams {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct Crumb {
    pub code: String,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct ClickResponse {
    pub code: String,
    pub level: GeographyLevel,
    pub display_name: String,
    /// Nation first, clicked geography last.
    pub breadcrumbs: Vec<Crumb>,
}

type ApiError = (StatusCode, String);

fn bad_request(err: impl std::fmt::Display) -> ApiError {
    (StatusCode::BAD_REQUEST, err.to_string())
}

pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/api/card", get(card_handler))
        .route("/api/click", get(click_handler));

    if let Some(static_dir) = &state.config.server.static_dir {
        app = app.fallback_service(ServeDir::new(state.config.resolve(static_dir)));
    }

    app.layer(CorsLayer::permissive()).with_state(state)
}

pub async fn start_server(config: AppConfig, store: TableStore) -> Result<()> {
    let port = config.server.port;
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let state = Arc::new(AppState { store, config });

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Unknown metric ids fall through to the "no metric configured" card state.
pub fn card_props(config: &AppConfig, params: &CardParams) -> Result<MapCardProps, ApiError> {
    let geography: Geography = params.fips.parse().map_err(bad_request)?;
    let breakdown: BreakdownSelection = params.breakdown.parse().map_err(bad_request)?;
    let metric = params
        .metric
        .as_deref()
        .and_then(|id| config.metric(id))
        .cloned();
    if metric.is_none() {
        warn!("No metric configured for {:?}", params.metric);
    }

    let mut props = MapCardProps::new(geography, metric, breakdown);
    props.enable_filter = params.enable_filter;
    props.nonstandardized_race = params.nonstandardized;
    Ok(props)
}

async fn card_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CardParams>,
) -> Result<Json<CardView>, ApiError> {
    let props = card_props(&state.config, &params)?;
    Ok(Json(render_card(&state.store, props, params.select.as_deref())))
}

async fn click_handler(Query(params): Query<ClickParams>) -> Result<Json<ClickResponse>, ApiError> {
    let handler = ClickHandler::new(Arc::new(|geography: Geography| {
        info!("Drilling into {}", geography.full_display_name());
    }));
    let geography = handler.fire(&params.id).map_err(bad_request)?;
    Ok(Json(ClickResponse {
        code: geography.code().to_string(),
        level: geography.level(),
        display_name: geography.display_name(),
        breadcrumbs: geography
            .breadcrumbs()
            .into_iter()
            .map(|g| Crumb {
                display_name: g.display_name(),
                code: g.code().to_string(),
            })
            .collect(),
    }))
}
