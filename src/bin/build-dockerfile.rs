use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::fs;
use std::path::PathBuf;

use toolbelt::logging;
use toolbelt::pipeline::{self, RenderOptions};

#[derive(Parser)]
#[command(name = "build-dockerfile")]
#[command(about = "Render a Dockerfile from dockerfile configs")]
struct Args {
    /// YAML file which lists the tools to install
    #[arg(long = "dockerfile-config")]
    dockerfile_config: PathBuf,

    /// Additional tool configs, installed after the primary one
    #[arg(long = "additional-configs", num_args = 1.., action = ArgAction::Append)]
    additional_configs: Vec<PathBuf>,

    /// Image the Dockerfile starts FROM
    #[arg(long)]
    base_image: String,

    /// Write the Dockerfile here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    let options = RenderOptions {
        dockerfile_config: args.dockerfile_config,
        additional_configs: args.additional_configs,
        base_image: args.base_image,
    };
    let dockerfile = pipeline::render(&options)?;

    match args.output {
        Some(path) => {
            fs::write(&path, &dockerfile)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("✓ Dockerfile written to {}", path.display());
        }
        None => print!("{}", dockerfile),
    }
    Ok(())
}
