//! Kong Admin - CLI Application
//!
//! A small command line front end for the admin API client:
//! - List, get and delete any resource kind
//! - Configuration via TOML
//! - Ctrl-C cancels the in-flight request

use clap::{Parser, Subcommand};
use kong_admin::{
    collection::ListOpt, AdminClient, ClientConfig, RequestContext, ResourceKind,
};
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Kong Admin - typed client for the gateway admin API
#[derive(Parser)]
#[command(name = "kong-admin")]
#[command(version, about = "Command line client for the gateway admin API", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "kong-admin.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List entities of a resource kind
    List {
        /// Resource kind (e.g. route, consumer, key-auth)
        kind: ResourceKind,
        /// Parent id or key to scope the listing under
        #[arg(short, long)]
        parent: Option<String>,
        /// Follow cursors and print every page
        #[arg(long)]
        all: bool,
        /// Page size
        #[arg(long)]
        size: Option<usize>,
        /// Cursor returned by a previous page
        #[arg(long)]
        offset: Option<String>,
    },
    /// Fetch one entity by id or key
    Get {
        kind: ResourceKind,
        id: String,
        #[arg(short, long)]
        parent: Option<String>,
    },
    /// Delete one entity by id or key
    Delete {
        kind: ResourceKind,
        id: String,
        #[arg(short, long)]
        parent: Option<String>,
        /// Succeed when the entity does not exist
        #[arg(long)]
        ignore_missing: bool,
    },
    /// Validate the configuration file
    Validate,
    /// Generate a sample configuration file
    Init {
        /// Output file path
        #[arg(short, long, default_value = "kong-admin.toml")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine readable
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Validate => validate_config(&cli.config),
        Commands::Init { output } => generate_sample_config(&output),
        command => run(&cli.config, command).await,
    }
}

/// Run a command against the admin API
async fn run(config_path: &str, command: Commands) -> anyhow::Result<()> {
    let config = ClientConfig::from_file(config_path)?;
    info!("Loaded configuration from {}", config_path);
    let client = AdminClient::from_config(&config)?;

    let ctx = RequestContext::new();
    let cancel = ctx.cancellation().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let output = match command {
        Commands::List {
            kind,
            parent,
            all,
            size,
            offset,
        } => {
            // --size also sets the page size used while following cursors
            let paged = size.map(|size| client.clone().with_page_size(size));
            let collection = paged.as_ref().unwrap_or(&client).collection(kind);
            if all {
                let items = match parent.as_deref() {
                    Some(parent) => collection.list_all_for_parent(&ctx, parent).await?,
                    None => collection.list_all(&ctx).await?,
                };
                serde_json::json!({ "data": items })
            } else {
                let opt = ListOpt {
                    size: size.unwrap_or_else(|| client.page_size()),
                    offset,
                };
                let (items, next) = match parent.as_deref() {
                    Some(parent) => collection.list_for_parent(&ctx, parent, Some(&opt)).await?,
                    None => collection.list(&ctx, Some(&opt)).await?,
                };
                serde_json::json!({
                    "data": items,
                    "offset": next.and_then(|n| n.offset),
                })
            }
        }
        Commands::Get { kind, id, parent } => {
            client
                .collection(kind)
                .get(&ctx, parent.as_deref(), &id)
                .await?
        }
        Commands::Delete {
            kind,
            id,
            parent,
            ignore_missing,
        } => {
            match client.collection(kind).delete(&ctx, parent.as_deref(), &id).await {
                Ok(()) => serde_json::json!({ "deleted": id }),
                Err(e) if ignore_missing && e.is_not_found() => {
                    debug!("{} '{}' already absent", kind, id);
                    serde_json::json!({ "deleted": Value::Null })
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Validate | Commands::Init { .. } => unreachable!("handled before connecting"),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    if let Some(metrics) = client.metrics() {
        debug!(
            requests = metrics.total_requests(),
            errors = metrics.total_errors(),
            "admin requests issued"
        );
    }
    Ok(())
}

/// Validate configuration file
fn validate_config(config_path: &str) -> anyhow::Result<()> {
    match ClientConfig::from_file(config_path) {
        Ok(config) => {
            println!("✓ Configuration is valid!");
            println!();
            println!("Admin URL: {}", config.admin_url());
            println!("Timeout: {}s", config.admin.timeout);
            println!("Page size: {}", config.admin.page_size);
            println!(
                "Auth: {}",
                if config.auth.enabled {
                    config.auth.header_name.as_str()
                } else {
                    "disabled"
                }
            );
            println!("Extra headers: {}", config.headers.len());
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration is invalid:");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}

/// Generate sample configuration file
fn generate_sample_config(output_path: &str) -> anyhow::Result<()> {
    let sample_config = r#"# Kong Admin client configuration

[admin]
url = "http://localhost:8001"
timeout = 30
page_size = 1000

[auth]
enabled = false
header_name = "Kong-Admin-Token"
token = ""

# Extra headers sent with every request
[headers]
# X-Team = "platform"

[metrics]
enabled = true
"#;

    std::fs::write(output_path, sample_config)?;
    println!("Sample configuration written to {}", output_path);
    Ok(())
}
