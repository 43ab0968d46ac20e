use crate::config::toml_config::TomlConfig;
use crate::config::RunConfig;
use crate::utils::error::Result;
use clap::Parser;

/// Running without arguments exports the IFRC GO country list into `ifrc_data/`.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "ifrc-export")]
#[command(about = "Export a paginated JSON API to flattened CSV files")]
pub struct CliArgs {
    /// Optional TOML file with [source] and [load] settings
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the first page URL
    #[arg(long)]
    pub api_endpoint: Option<String>,

    /// Override the output directory
    #[arg(long)]
    pub output_path: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

impl CliArgs {
    /// Defaults, then the config file, then command line flags.
    pub fn resolve(&self) -> Result<RunConfig> {
        let mut config = RunConfig::default();

        if let Some(path) = &self.config {
            tracing::info!("📁 Loading configuration from: {}", path);
            TomlConfig::from_file(path)?.apply_to(&mut config);
        }

        if let Some(endpoint) = &self.api_endpoint {
            config.api_endpoint = endpoint.clone();
        }
        if let Some(output_path) = &self.output_path {
            config.output_path = output_path.clone();
        }

        Ok(config)
    }
}
