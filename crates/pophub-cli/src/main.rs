use anyhow::Context;
use clap::Parser;
use pophub_core::{supported_categories, Catalog, Category, Config, Kind, KindFilter, Listing};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pophub")]
#[command(version, about = "Search and browse movies, TV, games and albums", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Search every configured provider
    Search {
        /// Search query
        query: String,
        /// movie, tv, game, album or all
        #[arg(short, long, default_value = "all")]
        kind: KindFilter,
    },
    /// Print the raw provider payload for one item
    Show {
        kind: Kind,
        /// Provider-side id
        id: String,
    },
    /// Compact title/year/cover card for one item
    Summary { kind: Kind, id: String },
    /// Items similar to the given one
    Recs { kind: Kind, id: String },
    /// Browse a category listing (trending, top-rated, latest, on-air, new-releases, featured)
    Browse { category: Category, kind: Kind },
    /// List the categories each kind supports
    Categories,
    /// Write a default config file if none exists
    Init,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays pipeable JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pophub=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("No command specified. Try --help");
        return Ok(());
    };

    // before load(), so env credentials can't end up in the written file
    if let Commands::Init = command {
        let (path, written) = Config::init().context("Failed to write config")?;
        if written {
            println!("Config written to {}", path.display());
        } else {
            println!("Config already exists at {}, left untouched", path.display());
        }
        return Ok(());
    }

    let config = Config::load().context("Failed to load config")?;

    match command {
        Commands::Categories => {
            for kind in Kind::ALL {
                let names: Vec<String> = supported_categories(kind)
                    .iter()
                    .map(|c| c.to_string())
                    .collect();
                println!("{:<6} {}", kind, names.join(", "));
            }
            return Ok(());
        }
        _ => {}
    }

    let catalog = Catalog::from_config(&config).context("Failed to set up catalog")?;

    match command {
        Commands::Search { query, kind } => {
            tracing::info!("Searching for: {}", query);
            let items = catalog.search(&query, kind).await?;
            print_json(&items)?;
        }
        Commands::Show { kind, id } => {
            print_json(&catalog.item_detail(kind, &id).await?)?;
        }
        Commands::Summary { kind, id } => {
            print_json(&catalog.item_summary(kind, &id).await?)?;
        }
        Commands::Recs { kind, id } => {
            print_json(&catalog.recommendations(kind, &id).await?)?;
        }
        Commands::Browse { category, kind } => {
            let listing = catalog.category_listing(category, kind).await?;
            match &listing {
                Listing::Disabled => {
                    eprintln!("{} is not configured; set its credentials first", kind.provider())
                }
                Listing::Heuristic(_) => {
                    eprintln!("Note: {} {} is approximated from seed artists", category, kind)
                }
                _ => {}
            }
            print_json(&listing.into_items())?;
        }
        Commands::Init | Commands::Categories => {}
    }

    Ok(())
}
