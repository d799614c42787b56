use crate::config::AppConfig;
use crate::types::{field_text, BreakdownVar, MetricQuery, Row};
use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// What the store has for one query.
#[derive(Debug, Clone)]
pub enum QueryResponse {
    /// Still loading. The card renders nothing and waits for the next pass.
    Pending,
    Missing,
    /// Read-only snapshot shared with the store.
    Ready(Arc<Vec<Row>>),
}

impl QueryResponse {
    pub fn data_is_missing(&self) -> bool {
        matches!(self, QueryResponse::Missing)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, QueryResponse::Pending)
    }

    pub fn rows(&self) -> &[Row] {
        match self {
            QueryResponse::Pending | QueryResponse::Missing => &[],
            QueryResponse::Ready(rows) => rows.as_slice(),
        }
    }

    /// Sorted distinct values of `field`, scalars in their text form.
    pub fn unique_field_values(&self, field: &str) -> Vec<String> {
        self.rows()
            .iter()
            .filter_map(|row| field_text(row, field).map(|text| text.into_owned()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

pub trait DatasetStore {
    fn get_metrics(&self, query: &MetricQuery) -> QueryResponse;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TableKey {
    metric_id: String,
    dimension: BreakdownVar,
    nonstandardized: bool,
}

/// In-memory tables, one per (metric, dimension, standardization).
#[derive(Debug, Default, Clone)]
pub struct TableStore {
    tables: HashMap<TableKey, Arc<Vec<Row>>>,
}

impl TableStore {
    pub fn load(config: &AppConfig) -> Result<Self> {
        info!("Loading {} dataset tables...", config.datasets.len());
        let mut store = TableStore::default();

        for dataset in &config.datasets {
            let path = config.resolve(&dataset.path);
            let rows = load_table(&path, &dataset.metric)?;
            info!(
                "Loaded {} rows for {} by {} from {:?}",
                rows.len(),
                dataset.metric,
                dataset.dimension,
                path
            );
            store.insert(&dataset.metric, dataset.dimension, dataset.nonstandardized, rows);
        }

        Ok(store)
    }

    pub fn insert(
        &mut self,
        metric_id: &str,
        dimension: BreakdownVar,
        nonstandardized: bool,
        rows: Vec<Row>,
    ) {
        let key = TableKey {
            metric_id: metric_id.to_string(),
            dimension,
            nonstandardized,
        };
        self.tables.insert(key, Arc::new(rows));
    }
}

impl DatasetStore for TableStore {
    fn get_metrics(&self, query: &MetricQuery) -> QueryResponse {
        let Some(dimension) = query.breakdowns.dimension else {
            return QueryResponse::Missing;
        };
        let key = TableKey {
            metric_id: query.metric_id.clone(),
            dimension,
            nonstandardized: query.breakdowns.nonstandardized,
        };

        match self.tables.get(&key) {
            Some(rows) if rows.iter().any(|row| row.contains_key(&query.metric_id)) => {
                QueryResponse::Ready(rows.clone())
            }
            _ => {
                debug!("No data for {} by {}", query.metric_id, dimension);
                QueryResponse::Missing
            }
        }
    }
}

pub fn load_table(path: &Path, metric_id: &str) -> Result<Vec<Row>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s: &str| s.to_lowercase())
        .ok_or_else(|| anyhow!("Dataset file has no extension: {:?}", path))?;

    match extension.as_str() {
        "csv" => load_csv_table(path, metric_id),
        "json" => load_json_table(path),
        _ => Err(anyhow!("Unsupported dataset format: {}", extension)),
    }
}

/// Only the metric column is numeric; FIPS codes and categories stay strings.
/// Empty cells become `null`.
fn load_csv_table(path: &Path, metric_id: &str) -> Result<Vec<Row>> {
    let file = File::open(path).with_context(|| format!("Failed to open CSV file: {:?}", path))?;
    let mut rdr = ReaderBuilder::new().from_reader(file);
    let headers = rdr.headers()?.clone();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.with_context(|| format!("Malformed record in {:?}", path))?;
        let mut row = Row::new();
        for (header, cell) in headers.iter().zip(record.iter()) {
            let cell = cell.trim();
            let value = if cell.is_empty() {
                Value::Null
            } else if header == metric_id {
                cell.parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            } else {
                Value::String(cell.to_string())
            };
            row.insert(header.to_string(), value);
        }
        rows.push(row);
    }

    Ok(rows)
}

fn load_json_table(path: &Path) -> Result<Vec<Row>> {
    let file = File::open(path).with_context(|| format!("Failed to open JSON file: {:?}", path))?;
    let rows: Vec<Row> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Dataset must be a JSON array of objects: {:?}", path))?;
    Ok(rows)
}
