//! CLI entry point. Grounded on the teacher's `Cli` derive-struct idiom in
//! `ck3-tiger/src/main.rs`, generalized to a single positional config path
//! plus the `--purge` flag spec §6 names as the sole CLI surface.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use harvestlore_atlas::{driver, Config};

#[derive(Parser)]
#[command(name = "harvestlore-atlas")]
struct Cli {
    /// Path to the TOML configuration file.
    config: PathBuf,

    /// Invalidate the scene-interest cache and rescan from scratch.
    #[arg(long)]
    purge: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    driver::run(config, cli.purge)
}
