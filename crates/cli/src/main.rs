//! Nimbus CLI - migrations and a terminal client for the weather dashboard.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations (and create the session table)
//! nimbus migrate
//!
//! # Show the dashboard for a position, or the default location
//! nimbus dashboard --lat 51.5074 --lon -0.1278
//! nimbus dashboard --api http://weather.internal:3000
//!
//! # Search the city list
//! nimbus search tok
//!
//! # Manage favorites (local file unless signed in)
//! nimbus favorites list
//! nimbus favorites add --name Oslo --country NO --lat 59.9139 --lon 10.7522
//! nimbus favorites --email me@example.com --password hunter22 remove 4
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `dashboard` - Current conditions, forecast and favorites
//! - `search` - Find cities by name or country code
//! - `favorites` - List, add and remove favorites

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use nimbus_client::{ApiClient, ClientConfig};
use nimbus_core::{Coordinates, LocalFavorite};

mod commands;

use commands::Credentials;

#[derive(Parser)]
#[command(name = "nimbus")]
#[command(author, version, about = "Nimbus weather dashboard CLI")]
struct Cli {
    /// Nimbus server URL
    #[arg(
        long = "api",
        global = true,
        env = "NIMBUS_API_URL",
        default_value = nimbus_client::config::DEFAULT_API_URL
    )]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Show weather for a position (or the default location) and favorites
    Dashboard {
        /// Latitude to use as the device position
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude to use as the device position
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        #[command(flatten)]
        credentials: Credentials,
    },
    /// Search cities by name or country code
    Search {
        /// Text to match
        query: String,
    },
    /// Manage favorite locations
    Favorites {
        #[command(flatten)]
        credentials: Credentials,

        #[command(subcommand)]
        action: FavoritesAction,
    },
}

#[derive(Subcommand)]
enum FavoritesAction {
    /// List favorites
    List,
    /// Add a favorite
    Add {
        /// Display name
        #[arg(long)]
        name: String,

        /// Country code
        #[arg(long)]
        country: String,

        /// Latitude
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        /// Longitude
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },
    /// Remove a favorite by the number shown in `list`
    Remove {
        /// Location id (account) or index (local)
        id: u32,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    // Migrations never talk to the API server.
    let api = || ClientConfig::new(&cli.api_url).and_then(|config| ApiClient::new(&config));

    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Dashboard {
            lat,
            lon,
            credentials,
        } => {
            let position = match (lat, lon) {
                (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)?),
                _ => None,
            };
            commands::dashboard::run(&api()?, position, &credentials).await?;
        }
        Commands::Search { query } => commands::search::run(&api()?, &query).await?,
        Commands::Favorites {
            credentials,
            action,
        } => {
            let api = api()?;
            match action {
                FavoritesAction::List => commands::favorites::list(&api, &credentials).await?,
                FavoritesAction::Add {
                    name,
                    country,
                    lat,
                    lon,
                } => {
                    let favorite = LocalFavorite {
                        lat,
                        lon,
                        name,
                        country,
                    };
                    commands::favorites::add(&api, &credentials, favorite).await?;
                }
                FavoritesAction::Remove { id } => {
                    commands::favorites::remove(&api, &credentials, id).await?;
                }
            }
        }
    }
    Ok(())
}
