use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wc_catalog::{api, catalog::Catalog, config::Config, db, registry::NpmRegistry};

#[derive(Parser)]
#[command(name = "wc-catalog")]
#[command(about = "Catalog of custom elements published to npm")]
struct Cli {
    /// SQLite database file (overrides WC_CATALOG_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Import a package and all of its versions from the registry
    Import { package: String },
    /// Show a package, importing it if it isn't in the catalog yet
    Show { package: String },
    /// Delete a package and everything imported for it
    Delete { package: String },
    /// List custom elements across all packages
    Elements {
        /// Only elements of versions with this distribution tag
        #[arg(short, long)]
        tag: Option<String>,

        #[arg(short, long)]
        limit: Option<u32>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "wc_catalog=debug,manifest_tools=info,tower_http=debug".into()),
    );

    // Logs go to stderr so command output on stdout stays machine readable.
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_catalog(config: &Config) -> anyhow::Result<Catalog<NpmRegistry>> {
    let db = match &config.db_path {
        Some(path) => db::Database::open(path.clone()),
        None => db::Database::open_default(),
    }
    .context("Failed to open catalog database")?;
    db.migrate().context("Failed to migrate catalog database")?;

    let registry = NpmRegistry::new(config)?;
    Ok(Catalog::new(db, registry))
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn serve(catalog: Catalog<NpmRegistry>, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting catalog server on port {}", port);

    let app = api::create_router(catalog);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Catalog server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = Config::from_env();
    if let Some(path) = cli.db {
        config.db_path = Some(path);
    }
    let catalog = open_catalog(&config)?;

    match cli.command {
        Some(Commands::Serve { port }) => serve(catalog, port).await?,
        Some(Commands::Import { package }) => print_json(&catalog.import_package(&package).await?)?,
        Some(Commands::Show { package }) => {
            print_json(&catalog.get_or_import_package(&package).await?)?
        }
        Some(Commands::Delete { package }) => {
            if catalog.delete_package(&package)? {
                println!("Deleted {}", package);
            } else {
                anyhow::bail!("Package not found: {}", package);
            }
        }
        Some(Commands::Elements { tag, limit }) => {
            print_json(&catalog.get_elements(tag.as_deref(), limit)?)?
        }
        None => serve(catalog, 3000).await?,
    }

    Ok(())
}
