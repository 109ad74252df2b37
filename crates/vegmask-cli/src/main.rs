//! vegmask CLI - vegetation coverage and RGB indices for photos

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use vegmask::{AnalysisConfig, IndexSelection, ThresholdMethod};

mod commands;

/// Vegetation masks and RGB vegetation indices.
#[derive(Parser)]
#[command(name = "vegmask")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available indices
    Indices,

    /// Analyze a single image
    Analyze {
        /// Image file (JPEG or PNG)
        input: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        settings: AnalysisArgs,
    },

    /// Analyze images and export a CSV report
    Batch {
        /// Image files or directories of images
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output CSV file (default: vegetation_analysis_<date>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        settings: AnalysisArgs,
    },
}

/// Options shared by `analyze` and `batch`.
#[derive(Args)]
struct AnalysisArgs {
    /// Threshold: `auto` for Otsu, or a fixed ExG value in [-1, 1]
    #[arg(short, long)]
    threshold: Option<String>,

    /// Comma-separated index keys (default: all)
    #[arg(short, long)]
    indices: Option<String>,

    /// JSON configuration file; other flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disable parallel processing
    #[arg(long)]
    sequential: bool,
}

impl AnalysisArgs {
    fn resolve(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => AnalysisConfig::default(),
        };
        if let Some(threshold) = &self.threshold {
            config.threshold = threshold
                .parse::<ThresholdMethod>()
                .with_context(|| format!("Invalid --threshold '{threshold}'"))?;
        }
        if let Some(indices) = &self.indices {
            config.indices = IndexSelection::parse(indices)
                .with_context(|| format!("Invalid --indices '{indices}'"))?;
        }
        if self.sequential {
            config.parallel = false;
        }
        config.validate()?;
        Ok(config)
    }
}

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install log subscriber")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Indices => commands::indices::run(),
        Commands::Analyze { input, json, settings } => {
            commands::analyze::run(&input, &settings.resolve()?, json, cli.verbose)
        }
        Commands::Batch { inputs, output, settings } => {
            commands::batch::run(&inputs, output, &settings.resolve()?, cli.verbose)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(threshold: Option<&str>, indices: Option<&str>) -> AnalysisArgs {
        AnalysisArgs {
            threshold: threshold.map(str::to_string),
            indices: indices.map(str::to_string),
            config: None,
            sequential: false,
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = args(Some("0.1"), Some("GLI,ExG")).resolve().unwrap();
        assert_eq!(config.threshold, ThresholdMethod::Fixed(0.1));
        let keys: Vec<_> = config.indices.keys().collect();
        assert_eq!(keys, vec!["GLI", "ExG"]);
        assert!(config.parallel);

        let config = args(None, None).resolve().unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_bad_flags_are_rejected() {
        assert!(args(Some("1.5"), None).resolve().is_err());
        assert!(args(Some("green"), None).resolve().is_err());
        assert!(args(None, Some("ExG,NDVI")).resolve().is_err());
    }

    #[test]
    fn test_config_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let base = AnalysisConfig::builder()
            .fixed_threshold(-0.2)
            .indices(IndexSelection::parse("VARI").unwrap())
            .build()
            .unwrap();
        let json = base.to_json_string().unwrap();
        std::fs::write(&path, json).unwrap();

        let settings = AnalysisArgs {
            threshold: None,
            indices: Some("INT".to_string()),
            config: Some(path),
            sequential: true,
        };
        let config = settings.resolve().unwrap();
        assert_eq!(config.threshold, ThresholdMethod::Fixed(-0.2));
        let keys: Vec<_> = config.indices.keys().collect();
        assert_eq!(keys, vec!["INT"]);
        assert!(!config.parallel);
    }
}
