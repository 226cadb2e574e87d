//! hopcrypt binary.
//!
//! # Usage
//!
//! ```bash
//! # Create two relays
//! hopcrypt keygen --out relay
//! hopcrypt keygen --out exit --passphrase hunter2
//!
//! # Seal for relay then exit, and peel at each hop
//! hopcrypt seal --hop relay.pub --hop exit.pub --input msg.txt --out onion.b64
//! hopcrypt peel --key relay.key --input onion.b64 --out next.b64
//! hopcrypt peel --key exit.key --passphrase hunter2 --input next.b64 --out msg.out
//! ```

use std::io::{self, Write};

use clap::Parser;
use hopcrypt_cli::{Command, run};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// hopcrypt onion and context tool
#[derive(Parser, Debug)]
#[command(name = "hopcrypt")]
#[command(about = "Seal and peel onions, manage hopcrypt identities")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let report = run(args.command)?;
    writeln!(io::stdout().lock(), "{report}")?;

    Ok(())
}
