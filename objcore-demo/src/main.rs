//! objcore walkthrough
//!
//! Prints how the object kernel behaves: safe casts, shallow and deep
//! copies, clones, the canonical encoding and metadata.
//!
//! Usage:
//!   objcore-demo --scenario serialize --pretty

use anyhow::Result;
use clap::Parser;
use objcore_demo::{Demo, Scenario};
use objcore_model::{CodecConfig, DEFAULT_MAX_DEPTH};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "objcore-demo")]
#[command(about = "Walk through the objcore object kernel")]
struct Args {
    /// Scenario to print
    #[arg(short, long, value_enum, default_value = "all")]
    scenario: Scenario,

    /// Indent encoded output
    #[arg(long)]
    pretty: bool,

    /// Maximum value nesting accepted by the codec
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = CodecConfig {
        pretty: args.pretty,
        max_depth: args.max_depth,
    };
    info!(?config, "objcore demo starting");

    let demo = Demo::new(config);
    let stdout = std::io::stdout();
    demo.run(args.scenario, &mut stdout.lock())?;
    Ok(())
}
