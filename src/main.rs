pub mod types;
pub mod config;
pub mod data;
pub mod topojson;
pub mod projection;
pub mod registry;
pub mod view;
pub mod selection;
pub mod chart;
pub mod choropleth;
pub mod headcount;
pub mod session;
pub mod server;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::data::DataStore;
use crate::headcount::HeadcountLookup;
use crate::projection::Albers;
use crate::registry::RegionRegistry;
use crate::selection::SelectionController;
use crate::session::{MapSession, RecordingRenderer};
use crate::types::Region;
use crate::view::Viewport;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the map page on port 3000 (the default)
    Serve,
    /// Click districts headlessly and print what the page would draw, as JSON lines
    Replay {
        /// District codes, clicked in order
        codes: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app_config = AppConfig::load_or_default(Path::new(config::DEFAULT_CONFIG_FILE))?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            // Refuse to serve a page whose map could not be drawn.
            let map = load_map_data(&app_config)?;
            tracing::info!("Datasets ready: {} districts", map.regions.len());
            server::start_server(&app_config.server).await?;
        }
        Commands::Replay { codes } => {
            let (mut session, headcount_loaded) = load_session(&app_config).await?;
            if !headcount_loaded {
                tracing::warn!("Headcount table unavailable, every district will show N/A");
            }
            print_json(&session.renderer_mut().drain())?;

            for code in codes {
                if let Err(e) = session.click_and_settle(&code).await {
                    tracing::error!("Click ignored: {}", e);
                    continue;
                }
                print_json(&session.renderer_mut().drain())?;
            }

            let controller = session.controller();
            tracing::info!(
                active = ?controller.active_code(),
                scale = controller.view().transform.scale,
                "Replay finished"
            );
        }
    }

    Ok(())
}

/// Datasets the map cannot be drawn without.
struct MapData {
    regions: Vec<Region>,
    store: DataStore,
    viewport: Viewport,
}

/// Boundary and rate failures are fatal; a missing financial breakdown only
/// flattens the chart.
fn load_map_data(config: &AppConfig) -> anyhow::Result<MapData> {
    let viewport = Viewport {
        width: config.view.width,
        height: config.view.height,
    };
    let projection = Albers::united_kingdom(viewport.width, viewport.height);

    let regions = data::load_regions(&config.input, &projection)
        .context("Initial map render failed")?;
    let store = DataStore::load(config).context("Initial map render failed")?;

    Ok(MapData {
        regions,
        store,
        viewport,
    })
}

/// Load every dataset and paint the initial map. A missing headcount table
/// only degrades the page.
async fn load_session(config: &AppConfig) -> anyhow::Result<(MapSession<RecordingRenderer>, bool)> {
    let MapData {
        regions,
        store,
        viewport,
    } = load_map_data(config)?;

    let headcounts = HeadcountLookup::new();
    let headcount_loaded = match headcounts.load(&config.input.headcount_csv).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!("{:#}", e);
            false
        }
    };

    let registry = RegionRegistry::new(regions);
    if registry.is_empty() {
        anyhow::bail!("Initial map render failed: no districts");
    }
    tracing::debug!("Session ready with {} districts", registry.len());
    let controller = SelectionController::new(registry, viewport);
    let session = MapSession::new(controller, &store, headcounts, RecordingRenderer::default());
    Ok((session, headcount_loaded))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
