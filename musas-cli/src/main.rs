//! # musas-models — command line front end
//!
//! Thin binary over [`musas_core`]: build the model packages described by a
//! language resource file, render an overview of what was built, and publish
//! the packages as tagged releases.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use musas_core::builder::create_models;
use musas_core::overview::overview_of_models;
use musas_core::release::Publisher;

#[derive(Parser)]
#[command(name = "musas-models", version, about = "Build and release USAS semantic tagger model packages")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build, package and enrich every model in the language resource file.
    CreateModels {
        /// Directory the packaged models are written to.
        #[arg(long, default_value = "models")]
        models_directory: PathBuf,
        /// JSON document describing the models to build, keyed by language.
        #[arg(long, default_value = "language_resources.json")]
        language_resource_file: PathBuf,
        /// Model element of the package version, appended to the tagger's
        /// `<major>.<minor>` prefix.
        #[arg(long, default_value = "0")]
        model_version: String,
    },
    /// Print a Markdown table summarising the packaged models.
    OverviewOfModels {
        /// Directory holding the packaged models.
        #[arg(long, default_value = "models")]
        models_directory: PathBuf,
    },
    /// Publish each packaged model as a tagged release with its dist files
    /// attached, then verify the remote state.
    ReleaseModels {
        /// Directory holding the packaged models.
        #[arg(long, default_value = "models")]
        models_directory: PathBuf,
        /// JSON file holding the personal access token, `{"PAT": "..."}`.
        #[arg(long, default_value = "GITHUB_TOKEN.json")]
        token_file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::CreateModels {
            models_directory,
            language_resource_file,
            model_version,
        } => {
            create_models(&models_directory, &language_resource_file, &model_version)
                .context("failed to create the models")?;
        }
        Command::OverviewOfModels { models_directory } => {
            let rendered = overview_of_models(&models_directory)
                .context("failed to render the model overview")?;
            println!("{rendered}");
        }
        Command::ReleaseModels {
            models_directory,
            token_file,
        } => {
            let publisher =
                Publisher::from_token_file(&token_file).context("failed to load the token")?;
            publisher
                .publish(&models_directory)
                .context("failed to release the models")?;
        }
    }
    Ok(())
}
