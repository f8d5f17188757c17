use anyhow::Context;
use clap::Parser;

use lootsplit_cli::{Cli, run};
use lootsplit_observability::ObservabilityConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ObservabilityConfig::from_env().context("invalid logging configuration")?;
    if let Some(format) = cli.log_format {
        config = config.with_format(format.into());
    }
    lootsplit_observability::init(&config);

    let output = run(&cli.command)?;
    println!("{output}");
    Ok(())
}
