use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

use toolbelt::pipeline::{self, ValidateOptions};
use toolbelt::validate::DEFAULT_TIMEOUT;
use toolbelt::{logging, HttpProbe};

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Check that every tool download in a dockerfile config is reachable", long_about = None)]
struct Cli {
    /// YAML file which lists the tools to be tested
    #[arg(long = "dockerfile-config")]
    dockerfile_config: PathBuf,

    /// Additional tool configs, checked after the primary one
    #[arg(long = "additional-configs", num_args = 1.., action = ArgAction::Append)]
    additional_configs: Vec<PathBuf>,

    /// Timeout for each download probe, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs(), value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Output the report as JSON
    #[arg(short, long)]
    json: bool,
}

impl Cli {
    fn options(&self) -> ValidateOptions {
        ValidateOptions {
            dockerfile_config: self.dockerfile_config.clone(),
            additional_configs: self.additional_configs.clone(),
            timeout: Duration::from_secs(self.timeout),
        }
    }
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();
    let options = cli.options();

    let probe = HttpProbe::new(options.timeout).context("Failed to create HTTP client")?;
    let report = pipeline::run_validation(&options, &probe)?;

    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        println!("{}", report);
    }

    if !report.is_success() {
        std::process::exit(report.exit_code());
    }
    Ok(())
}
