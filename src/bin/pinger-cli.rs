use clap::{Parser, Subcommand};

use container_pinger::config::StoreConfig;
use container_pinger::store::{self, DeleteStatus, HttpStatusStore, ListStatuses};

#[derive(Parser)]
#[command(name = "pinger-cli")]
#[command(about = "Management CLI for the container status store", long_about = None)]
struct Cli {
    #[arg(short, long, env = "PINGER_STORE_URL", default_value = "http://localhost:8080/api/v1")]
    url: String,

    #[arg(short, long, env = "PINGER_API_KEY", default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every status record
    List,
    /// Delete the record for an address
    Delete { address: String },
    /// Update a record, creating it if missing
    Upsert {
        address: String,
        /// Latency in microseconds
        latency_us: i64,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "running")]
        state: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let store = HttpStatusStore::new(&StoreConfig {
        base_url: cli.url,
        api_key: cli.key,
        ..StoreConfig::default()
    })?;

    match cli.command {
        Commands::List => {
            let records = store.list().await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::Delete { address } => {
            store.delete(&address).await?;
            println!("Deleted status for {}", address);
        }
        Commands::Upsert {
            address,
            latency_us,
            name,
            state,
        } => {
            let action = store::upsert(&store, &address, latency_us, &name, &state).await?;
            println!("{} status for {}", action.as_str(), address);
        }
    }

    Ok(())
}
