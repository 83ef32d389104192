use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use state_choropleth::{config, data, render, server, view};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the choropleth for one year to an SVG file
    Render {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Defaults to the most recent year in the data
        #[arg(short, long)]
        year: Option<i32>,
        #[arg(short, long, value_name = "FILE", default_value = "map.svg")]
        output: PathBuf,
    },
    /// Serve the interactive map and documentation controller
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
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Render {
            config,
            year,
            output,
        } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let layout = view::Layout::from_container(
                app_config.chart.width,
                app_config.chart.height,
                app_config.chart.margin,
            );

            let dataset = match data::load_dataset(&app_config.input).await {
                Ok(dataset) => dataset,
                Err(err) => {
                    error!("{}", data::load_error_message(&err));
                    return Err(err);
                }
            };

            let mut state = view::ViewState::initial(&dataset, layout);
            if let Some(year) = *year {
                let (next, redraw) =
                    view::update(state, &view::MapEvent::SelectYear { year }, &dataset);
                if redraw == view::Redraw::None {
                    bail!(
                        "Year {} not present in data (available: {:?})",
                        year,
                        dataset.years()
                    );
                }
                state = next;
            }

            let chart = render::Chart::fit(&dataset, &state);
            let svg = chart.render(&dataset, &state);
            std::fs::write(output, svg)
                .with_context(|| format!("Failed to write SVG: {:?}", output))?;
            info!(year = ?state.year, output = ?output, "rendered choropleth");
        }
        Commands::Serve { config } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let layout = view::Layout::from_container(
                app_config.chart.width,
                app_config.chart.height,
                app_config.chart.margin,
            );

            let loaded = data::load_dataset(&app_config.input).await;
            let map = server::MapStatus::from_load(loaded, layout);

            server::start_server(&app_config, map).await?;
        }
    }

    Ok(())
}
