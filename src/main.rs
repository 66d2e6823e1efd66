use std::path::PathBuf;

use anyhow::{Context, Result};
use asset_url_helper::{AssetHost, AssetPipeline, AssetType, ConfigFile, PathOptions, TagOptions};
use clap::{Parser, Subcommand};
use tracing::debug;

mod logging;

#[derive(Parser)]
#[command(name = "asset-url")]
#[command(author, version, about = "Resolve logical asset names into URLs and include tags", long_about = None)]
struct Cli {
    /// Project root
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Configuration file (defaults to <root>/assets.config.json when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Embed content digests in URLs
    #[arg(long)]
    digest: bool,

    /// Expand bundles into their individual sources
    #[arg(long)]
    debug: bool,

    /// Resolve from the precompiled manifest instead of compiling
    #[arg(long)]
    precompiled: bool,

    /// Asset host to prefix URLs with
    #[arg(long)]
    host: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the URL of each reference
    Path {
        /// References to resolve
        #[arg(required = true)]
        names: Vec<String>,

        /// Asset type used for extension inference (js, css, image, other)
        #[arg(long = "type", default_value = "other")]
        asset_type: AssetType,
    },
    /// Print include tags for the references
    Tags {
        /// References to include
        #[arg(required = true)]
        names: Vec<String>,

        /// Tag kind (js or css)
        #[arg(long = "type", default_value = "js")]
        asset_type: AssetType,

        /// Never expand bundles, even in debug mode
        #[arg(long)]
        no_expand: bool,
    },
    /// Print the digest-qualified file name of each logical path
    Digest {
        /// Logical paths, extension included
        #[arg(required = true)]
        names: Vec<String>,
    },
}

fn main() -> Result<()> {
    logging::init_logging();
    let cli = Cli::parse();

    let file = match &cli.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::discover(&cli.root),
    };
    let mut config = file.into_config(&cli.root)?;
    config.digest |= cli.digest;
    config.debug |= cli.debug;
    if cli.precompiled {
        config.compile = false;
    }
    if let Some(host) = cli.host.as_deref() {
        config.host = AssetHost::from_config(Some(host));
    }
    debug!(root = %cli.root.display(), compile = config.compile, "resolving assets");

    let pipeline = AssetPipeline::new(config);
    let helper = pipeline.helper()?;

    match cli.command {
        Commands::Path { names, asset_type } => {
            for name in &names {
                let url = helper
                    .asset_path(name, PathOptions::of_type(asset_type))
                    .with_context(|| format!("failed to resolve '{name}'"))?;
                println!("{url}");
            }
        }
        Commands::Tags {
            names,
            asset_type,
            no_expand,
        } => {
            let sources: Vec<&str> = names.iter().map(String::as_str).collect();
            let mut options = TagOptions::new();
            if no_expand {
                options = options.debug(false);
            }
            for tag in helper.asset_include_tags(&sources, asset_type, &options)? {
                println!("{tag}");
            }
        }
        Commands::Digest { names } => {
            for name in &names {
                let path = helper
                    .asset_digest_path(name)
                    .with_context(|| format!("failed to digest '{name}'"))?;
                println!("{path}");
            }
        }
    }

    Ok(())
}
