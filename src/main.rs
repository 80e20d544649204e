use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod audit;
mod config;
mod domain;
mod error;
mod models;
mod notify;
mod positioning;
mod ranking;
mod scan;

#[derive(Parser)]
#[command(author, version, about = "SEO visibility scanner behind the agency's audit lead funnel", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: config::ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single scan and print the result as JSON
    Scan {
        /// Page URL to audit
        #[arg(long)]
        url: String,

        /// Lead contact email attached to the scan
        #[arg(long)]
        email: String,

        /// Do not send the lead notification email
        #[arg(long, default_value_t = false)]
        skip_notify: bool,
    },
    /// Start the API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut app_config = config::build_config(&cli.config)?;

    match cli.command {
        Commands::Scan {
            url,
            email,
            skip_notify,
        } => {
            if skip_notify {
                // An empty SMTP host disables the notifier.
                app_config.smtp_host.clear();
            }
            run_single_scan(Arc::new(app_config), url, email).await?;
        }
        Commands::Serve { port } => {
            api::start_api_server(Arc::new(app_config), port).await?;
        }
    }

    Ok(())
}

async fn run_single_scan(config: Arc<config::Config>, url: String, email: String) -> Result<()> {
    let scanner = scan::SeoScanner::new(config)?;
    let request = models::ScanRequest { url, email };

    let outcome = scanner.run_scan(&request).await?;

    if outcome.onpage_origin.is_fallback() {
        info!("On-page audit used fallback data");
    }
    if outcome.positioning_origin.is_fallback() {
        info!("Positioning used fallback data");
    }

    println!("{}", serde_json::to_string_pretty(&outcome.result)?);
    Ok(())
}
