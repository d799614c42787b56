use anyhow::Context;
use choropleth_card::card::{render_card, MapCardProps};
use choropleth_card::config::AppConfig;
use choropleth_card::data::TableStore;
use choropleth_card::planner::plan_queries;
use choropleth_card::server;
use choropleth_card::types::{BreakdownSelection, Geography, MetricConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the queries a card would issue
    Plan {
        #[arg(short, long)]
        metric: String,
        #[arg(short, long, default_value = "all")]
        breakdown: BreakdownSelection,
        #[arg(long)]
        nonstandardized: bool,
    },
    /// Run one card pass and print the resulting view as JSON
    Render {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        #[arg(short, long, default_value = "00")]
        fips: Geography,
        #[arg(short, long)]
        metric: Option<String>,
        #[arg(short, long, default_value = "all")]
        breakdown: BreakdownSelection,
        #[arg(long)]
        enable_filter: bool,
        /// Breakdown value to select after the default is applied
        #[arg(long)]
        select: Option<String>,
        #[arg(long)]
        nonstandardized: bool,
    },
    /// Serve card views over HTTP
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan {
            metric,
            breakdown,
            nonstandardized,
        } => {
            let metric = MetricConfig::new(metric.clone(), metric);
            let plan = plan_queries(breakdown, &metric, nonstandardized);
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Commands::Render {
            config,
            fips,
            metric,
            breakdown,
            enable_filter,
            select,
            nonstandardized,
        } => {
            let app_config = AppConfig::load_from_file(&config)?;
            let store = TableStore::load(&app_config)?;

            let metric = metric.as_deref().and_then(|id| app_config.metric(id)).cloned();
            let mut props = MapCardProps::new(fips, metric, breakdown);
            props.enable_filter = enable_filter;
            props.nonstandardized_race = nonstandardized;

            let view = render_card(&store, props, select.as_deref());
            println!(
                "{}",
                serde_json::to_string_pretty(&view).context("Failed to serialize card view")?
            );
        }
        Commands::Serve { config } => {
            info!("Serving card views with config: {:?}", config);
            let app_config = AppConfig::load_from_file(&config)?;
            let store = TableStore::load(&app_config)?;

            server::start_server(app_config, store).await?;
        }
    }

    Ok(())
}
