//! CLI running fixture relationship scenarios.
//!
//! Builds the requested scenarios against an in-memory store, prints a
//! summary per scenario and optionally dumps every committed row as JSON.

mod scenarios;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use fixture_core::config::FixtureConfig;
use fixture_core::context::FixtureContext;
use fixture_core::storage::InMemoryStorage;

use scenarios::{Mode, Scenario, ScenarioOptions};

/// Command-line arguments for the fixture tool.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scenario to run
    #[arg(short, long, value_enum, default_value_t = Scenario::All)]
    scenario: Scenario,

    /// Ownership mode of the to-many relations
    #[arg(short, long, value_enum, default_value_t = Mode::Standard)]
    mode: Mode,

    /// Members created per collection
    #[arg(long, default_value_t = 2)]
    members: usize,

    /// Reference the global fixture through a lazy proxy
    #[arg(long)]
    proxy: bool,

    /// Seed for generated values (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Print every committed row as JSON
    #[arg(long)]
    dump: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt::init();

    let config = FixtureConfig {
        seed: args.seed,
        ..Default::default()
    };
    let storage = Arc::new(InMemoryStorage::new());
    let ctx = FixtureContext::with_storage(config, storage.clone());
    scenarios::register_schemas(&ctx, args.mode)?;

    let options = ScenarioOptions {
        mode: args.mode,
        members: args.members,
        as_proxy: args.proxy,
    };
    tracing::info!("Running {:?} scenario(s) in {:?} mode", args.scenario, args.mode);

    for scenario in args.scenario.expand() {
        match scenarios::run(&ctx, scenario, options) {
            Ok(summary) => println!("{}", summary),
            Err(e) => {
                tracing::error!("Scenario {:?} failed: {:#}", scenario, e);
                return Err(e);
            }
        }
    }

    if args.dump {
        println!("{}", serde_json::to_string_pretty(&storage.dump()?)?);
    }
    Ok(())
}
