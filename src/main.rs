use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

mod config;
mod error;
mod hovercard;
mod render;
mod sentry;

use config::Config;
use hovercard::{CardProps, EnvironmentDeployIndex, FetchCoordinator, VersionHoverCard};
use render::{CardRenderer, OutputFormat};
use sentry::{ApiClient, Deploy, SentryClient};

#[derive(Parser)]
#[command(name = "release-card")]
#[command(about = "Show a release summary card: authors, new issues and recent deploys")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, env = "RELEASE_CARD_CONFIG")]
    config: Option<PathBuf>,

    /// API base URL, e.g. https://sentry.io/api/0
    #[arg(long, env = "SENTRY_URL")]
    base_url: Option<String>,

    /// Auth token (can also be set via SENTRY_AUTH_TOKEN env var)
    #[arg(long, env = "SENTRY_AUTH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Organization slug
    #[arg(short, long, env = "SENTRY_ORG")]
    org: Option<String>,

    /// Project slug
    #[arg(short, long, env = "SENTRY_PROJECT")]
    project: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch release data once and print the card
    Show {
        /// Release version
        #[arg(short, long)]
        version: String,

        /// Output format (defaults to the config file, then markdown)
        #[arg(short = 'f', long)]
        format: Option<OutputFormat>,

        /// Output file path (stdout if not specified)
        #[arg(short = 'O', long)]
        output: Option<PathBuf>,

        /// Custom handlebars template for markdown output
        #[arg(long)]
        template: Option<PathBuf>,
    },

    /// Toggle the card on every line read from stdin
    Hover {
        #[arg(short, long)]
        version: String,
    },

    /// List the environments a release was deployed to
    Deploys {
        #[arg(short, long)]
        version: String,

        #[arg(long, default_value = "3")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(url) = cli.base_url {
        config.sentry.url = url;
    }
    if cli.token.is_some() {
        config.sentry.token = cli.token;
    }
    let org = cli
        .org
        .or(config.sentry.org.take())
        .context("organization is required (--org or [sentry].org)")?;
    let project = cli
        .project
        .or(config.sentry.project.take())
        .context("project is required (--project or [sentry].project)")?;
    debug!(url = %config.sentry.url, %org, %project, "configured");

    let client: Arc<dyn ApiClient> = Arc::new(SentryClient::new(
        &config.sentry.url,
        config.sentry.token.as_deref(),
    )?);

    match cli.command {
        Commands::Show {
            version,
            format,
            output,
            template,
        } => {
            let props = CardProps::new(&org, &project, &version)?;
            let format = format.unwrap_or(config.output.format);
            let template = template.or(config.output.template);
            let renderer = CardRenderer::new(format, template.as_deref())?;

            let mut card = VersionHoverCard::new(props);
            card.load(client).await;
            if card.state().error {
                warn!(%version, "some release data could not be loaded");
            }
            let content = renderer.render(&card.content(Utc::now()))?;

            if let Some(output_path) = output {
                std::fs::write(&output_path, content)?;
                info!(path = %output_path.display(), "card written");
            } else {
                println!("{}", content);
            }
        }
        Commands::Hover { version } => {
            let props = CardProps::new(&org, &project, &version)?;
            let renderer = CardRenderer::new(config.output.format, config.output.template.as_deref())?;
            hover(client, props, &renderer).await?;
        }
        Commands::Deploys { version, limit } => {
            let props = CardProps::new(&org, &project, &version)?;
            let value = client.get(&props.deploys_path()).await?;
            let deploys: Vec<Deploy> = serde_json::from_value(value)?;
            let index = EnvironmentDeployIndex::from_deploys(&deploys);

            if index.is_empty() {
                println!("Release {} has not been deployed", version);
                return Ok(());
            }
            println!(
                "Release {} deployed to {} environment(s):",
                version,
                index.len()
            );
            for (environment, finished) in index.recent(limit) {
                match finished {
                    Some(date) => println!("  - {}: {}", environment, date.to_rfc3339()),
                    None => println!("  - {}: in progress", environment),
                }
            }
        }
    }

    Ok(())
}

/// Fetches in the background while stdin lines flip visibility. The card is
/// printed whenever it becomes visible, and again once data arrives if it is
/// showing at that moment.
async fn hover(client: Arc<dyn ApiClient>, props: CardProps, renderer: &CardRenderer) -> Result<()> {
    let mut card = VersionHoverCard::new(props);
    let coordinator = FetchCoordinator::new(client, card.props().clone());
    let mut fetch = tokio::spawn(async move { coordinator.fetch().await });
    let mut fetching = true;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprintln!("Press enter to toggle the card, ctrl-d to quit.");

    loop {
        tokio::select! {
            state = &mut fetch, if fetching => {
                fetching = false;
                card.update(state?);
                if card.is_visible() {
                    println!("{}", renderer.render(&card.content(Utc::now()))?);
                }
            }
            line = lines.next_line() => {
                if line?.is_none() {
                    break;
                }
                if card.toggle() {
                    println!("{}", renderer.render(&card.content(Utc::now()))?);
                } else {
                    println!("(hidden)");
                }
            }
        }
    }

    Ok(())
}
