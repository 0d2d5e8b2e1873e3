//! Mines a JSON corpus of transactions from the command line.
//!
//! Usage: basket <transactions.json> [config-file]
//!
//! The corpus is an array of arrays of item labels. Thresholds and the algorithm
//! come from the optional config file and from BASKET_* environment variables;
//! RUST_LOG controls log output, which goes to stderr.

use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;

use basket::{Miner, MinerConfig, MiningError, TransactionSet};

fn run() -> basket::Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        return Err(MiningError::Config(
            "usage: basket <transactions.json> [config-file]".into(),
        ));
    };
    let config = MinerConfig::load(args.next().as_deref())?;
    let payload: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    let transactions = TransactionSet::from_json(&payload)?;
    let result = Miner::new(config)?.mine(&transactions)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(%e, "mining failed");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
