/*!
leaflet-latlon Command Line Interface

Renders a result set file into the Leaflet settings block for a map display.
*/

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leaflet_latlon::icon::BaseUrlResolver;
use leaflet_latlon::reader::reader_for_path;
use leaflet_latlon::writer::{LeafletWriter, Writer};
use leaflet_latlon::{FeatureBuilder, MapRegistry, RenderContext, StyleConfig, VERSION};

#[cfg(feature = "image-sizes")]
use leaflet_latlon::icon::LocalImageSizer;

#[derive(Parser)]
#[command(name = "leaflet-latlon")]
#[command(about = "Render tabular results with latitude/longitude columns as Leaflet maps")]
#[command(version = VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a result set (.csv or .json) as Leaflet settings JSON
    Render {
        /// Result set file
        rows: PathBuf,

        /// Style configuration (JSON)
        #[arg(long)]
        style: Option<PathBuf>,

        /// Additional map definitions (JSON object keyed by map id)
        #[arg(long)]
        maps: Option<PathBuf>,

        /// Base URL relative icon paths are resolved against
        #[arg(long)]
        base_url: Option<String>,

        /// Document root to read icon image sizes from
        #[arg(long)]
        image_root: Option<PathBuf>,

        /// View identifier used in the map container id
        #[arg(long, default_value = "leaflet")]
        view: String,

        /// Display identifier used in the map container id
        #[arg(long, default_value = "default")]
        display: String,

        /// Prefix of the map container id
        #[arg(long)]
        id_prefix: Option<String>,

        /// Output file path
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List available map definitions
    Maps {
        /// Additional map definitions (JSON object keyed by map id)
        #[arg(long)]
        maps: Option<PathBuf>,
    },

    /// Validate a style configuration without rendering
    Validate {
        /// Style configuration (JSON)
        style: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leaflet_latlon=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            rows,
            style,
            maps,
            base_url,
            image_root,
            view,
            display,
            id_prefix,
            output,
        } => {
            let config = load_style(style.as_deref())?;
            config.validate()?;

            let mut builder = FeatureBuilder::new().with_registry(load_registry(maps.as_deref())?);
            if let Some(base) = &base_url {
                builder = builder.with_url_resolver(BaseUrlResolver::new(base)?);
            }
            if let Some(root) = image_root {
                #[cfg(feature = "image-sizes")]
                {
                    builder = builder.with_icon_sizer(LocalImageSizer::new(root));
                }
                #[cfg(not(feature = "image-sizes"))]
                anyhow::bail!(
                    "--image-root {} needs image support. Rebuild with --features image-sizes",
                    root.display()
                );
            }

            let result = reader_for_path(&rows)?
                .read_rows(&rows)
                .with_context(|| format!("Failed to read rows from {}", rows.display()))?;
            info!("Read {} row(s) from {}", result.len(), rows.display());

            let mut context = RenderContext::new(view, display);
            if let Some(prefix) = id_prefix {
                context = context.with_id_prefix(prefix);
            }
            let rendered = builder.build(&result, &config, &mut context)?;
            if rendered.is_empty() {
                info!("No features to show; map hidden");
            } else {
                info!(
                    "Rendered {} feature(s) on map '{}'",
                    rendered.features().len(),
                    config.leaflet_map
                );
            }

            let json_output = LeafletWriter::new().write(&rendered)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &json_output)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Leaflet settings written to {}", path.display());
                }
                None => println!("{}", json_output),
            }
        }

        Commands::Maps { maps } => {
            let registry = load_registry(maps.as_deref())?;
            for (id, map) in registry.iter() {
                if map.description.is_empty() {
                    println!("{}", id);
                } else {
                    println!("{}\t{}", id, map.description);
                }
            }
        }

        Commands::Validate { style } => {
            let config = StyleConfig::from_file(&style)?;
            config.validate()?;
            println!("✓ {} is valid", style.display());
            if !MapRegistry::builtin().contains(&config.leaflet_map) {
                println!(
                    "  note: map '{}' is not built in; pass its definition with --maps when rendering",
                    config.leaflet_map
                );
            }
        }
    }

    Ok(())
}

fn load_style(path: Option<&Path>) -> anyhow::Result<StyleConfig> {
    match path {
        Some(path) => StyleConfig::from_file(path)
            .with_context(|| format!("Failed to load style from {}", path.display())),
        None => {
            info!("No --style given; using the default style");
            Ok(StyleConfig::default())
        }
    }
}

fn load_registry(path: Option<&Path>) -> anyhow::Result<MapRegistry> {
    let mut registry = MapRegistry::builtin();
    if let Some(path) = path {
        let count = registry
            .load_file(path)
            .with_context(|| format!("Failed to load map definitions from {}", path.display()))?;
        info!("Loaded {} map definition(s) from {}", count, path.display());
    }
    Ok(registry)
}
