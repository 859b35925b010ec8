//! DevBlog - A static site generator for Markdown content collections.

use anyhow::{Result, bail};
use clap::Parser;
use devblog::{
    cli::{Cli, Commands},
    config::SiteConfig,
    content::Registry,
    init::new_site,
    log,
    pipeline::{self, Pipeline},
};
use std::{path::Path, process::ExitCode};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log!("error"; "{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;

    match &cli.command {
        Commands::Init { name } => new_site(&config, name.is_some()),
        Commands::Check => {
            let registry = Registry::standard(&config.build.content)?;
            let content = pipeline::scan(&config, &registry)?;
            for (name, entries) in content.iter() {
                log!("check"; "{}: {} entries", name, entries.len());
            }
            log!("check"; "all {} entries are valid", content.total());
            Ok(())
        }
        Commands::Build { .. } => {
            let registry = Registry::standard(&config.build.content)?;
            Pipeline::from_config(&config).run(&config, &registry)?;
            Ok(())
        }
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    let mut config = if !cli.is_init() && config_path.exists() {
        SiteConfig::from_path(&config_path)?
    } else {
        SiteConfig::default()
    };
    config.update_with_cli(cli);

    // Validate config state based on command
    let config_exists = config.config_path.exists();
    match (cli.is_init(), config_exists) {
        (true, true) => {
            bail!("Config file already exists. Remove it manually or init in a different path.")
        }
        (false, false) => bail!("Config file not found: {}", config.config_path.display()),
        _ => {}
    }

    if !cli.is_init() {
        config.validate(&cli.command)?;
    }

    Ok(config)
}
