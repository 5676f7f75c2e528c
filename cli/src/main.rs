mod orchestrator;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use springform_core::BuildConfig;

#[derive(Parser)]
#[command(name = "springform")]
#[command(about = "Static-site build pipeline for the Springform recipe site", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: fetch, validate, fix, freeze, prerender,
    /// sitemap, gate
    Build {
        /// Directory for the frozen data files
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Built site directory (template input, prerender output)
        #[arg(long)]
        dist_dir: Option<PathBuf>,
        /// Public origin override, e.g. www.example.com
        #[arg(long)]
        custom_domain: Option<String>,
        /// Publish even if validation errors remain
        #[arg(long)]
        force_publish: bool,
    },
    /// Fetch and validate only; writes the report and exits nonzero on errors
    Validate {
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Check an existing output directory's SEO surface
    Gate {
        #[arg(long)]
        dist_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Build {
            data_dir,
            dist_dir,
            custom_domain,
            force_publish,
        } => {
            let mut config = BuildConfig::from_env();
            if let Some(dir) = data_dir {
                config = config.data_dir(dir);
            }
            if let Some(dir) = dist_dir {
                config = config.dist_dir(dir);
            }
            if custom_domain.is_some() {
                config = config.custom_domain(custom_domain);
            }
            if force_publish {
                config = config.force_publish(true);
            }
            orchestrator::run_build(config).await?
        }
        Commands::Validate { data_dir } => {
            let mut config = BuildConfig::from_env();
            if let Some(dir) = data_dir {
                config = config.data_dir(dir);
            }
            orchestrator::run_validate(config).await?
        }
        Commands::Gate { dist_dir } => {
            let mut config = BuildConfig::from_env();
            if let Some(dir) = dist_dir {
                config = config.dist_dir(dir);
            }
            orchestrator::run_gate_stage(&config)?
        }
    };

    std::process::exit(code);
}
