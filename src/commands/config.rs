use std::path::PathBuf;

use clap::Subcommand;
use harvester::{StrategyConfig, config_file_path, load_config, save_config};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Write the default strategy config
    Init {
        /// Config file (defaults to .harvester/config.json)
        #[arg(long)]
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Print the effective strategy config as JSON
    Show {
        /// Config file (defaults to .harvester/config.json)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

pub(super) fn run_config(cmd: ConfigCommand) -> Result<(), String> {
    match cmd {
        ConfigCommand::Init { path, force } => {
            let path = path.unwrap_or_else(config_file_path);
            if path.exists() && !force {
                return Err(format!(
                    "{} already exists; pass --force to overwrite",
                    path.display()
                ));
            }
            save_config(&path, &StrategyConfig::default()).map_err(|e| e.to_string())?;
            println!("Wrote default strategy config to {}", path.display());
        }
        ConfigCommand::Show { path } => {
            let path = path.unwrap_or_else(config_file_path);
            let config = load_config(&path).map_err(|e| e.to_string())?;
            let json = serde_json::to_string_pretty(&config).map_err(|e| e.to_string())?;
            println!("{}", json);
        }
    }
    Ok(())
}
