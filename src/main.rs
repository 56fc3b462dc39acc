use anyhow::Result;
use clap::Parser;
use rubyblocks_rs_core::cli::Args;
use tracing::Level;

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    rubyblocks_rs_core::run_cli(&args)
}
