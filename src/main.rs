use anyhow::Context;
use clap::Parser;

use retouch::cli::{self, CliArgs};

fn main() -> anyhow::Result<()> {
    retouch::logging::init();
    let args = CliArgs::parse();

    let outcome = cli::run(&args)
        .with_context(|| format!("failed to edit {}", args.input.display()))?;
    println!(
        "{} ({}x{})",
        outcome.output.display(),
        outcome.width,
        outcome.height
    );
    if let Some(saved) = outcome.saved {
        println!("{}", saved.display_url);
    }
    Ok(())
}
