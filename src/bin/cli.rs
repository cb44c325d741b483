//! StratoKV CLI Client
//!
//! Command-line interface for issuing single operations against StratoKV
//! nodes.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use stratokv::{Client, ClientConfig, ProtocolVariant, Result};

/// StratoKV CLI
#[derive(Parser, Debug)]
#[command(name = "stratokv-cli")]
#[command(about = "CLI for the StratoKV key-value store")]
#[command(version)]
struct Args {
    /// Node address; repeat the flag to shard keys across several nodes
    #[arg(short, long = "server", default_value = "127.0.0.1:9110")]
    server: Vec<String>,

    /// Speak the extended (16-byte header) framing variant
    #[arg(long)]
    extended: bool,

    /// Start of the request-id range assigned to this client
    #[arg(long, default_value = "0")]
    from_id: u32,

    /// End (exclusive) of the request-id range
    #[arg(long, default_value = "4294967295")]
    to_id: u32,

    /// Socket read timeout in milliseconds (0 = block indefinitely)
    #[arg(long, default_value = "5000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Overwrite part of a stored value
    Update {
        /// The key to update
        key: String,

        /// The replacement bytes
        value: String,

        /// Byte offset into the stored value
        #[arg(default_value = "0")]
        offset: u32,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let variant = if args.extended {
        ProtocolVariant::Extended
    } else {
        ProtocolVariant::Basic
    };
    let config = ClientConfig::builder()
        .variant(variant)
        .nodes(args.server.clone())
        .id_range(args.from_id, args.to_id)
        .read_timeout_ms(args.timeout_ms)
        .write_timeout_ms(args.timeout_ms)
        .build();

    let mut client = Client::new(config)?;
    client.connect()?;

    match args.command {
        Commands::Get { key } => match client.get(&key)? {
            Some(value) => println!("{}", String::from_utf8_lossy(&value)),
            None => println!("(not found)"),
        },
        Commands::Set { key, value } => {
            println!("{}", if client.set(&key, &value)? { "OK" } else { "FAILED" });
        }
        Commands::Update { key, value, offset } => {
            let ok = client.update(&key, &value, offset)?;
            println!("{}", if ok { "OK" } else { "FAILED" });
        }
        Commands::Del { key } => {
            println!("{}", if client.delete(&key)? { "OK" } else { "FAILED" });
        }
    }

    client.disconnect()?;
    Ok(())
}
