use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use dataset_splitter::config::{ConfigOverrides, SplitConfig};
use dataset_splitter::io::Format;
use dataset_splitter::runtime;

#[derive(Parser)]
#[command(name = "dsplit")]
#[command(about = "dsplit - Split a tabular dataset into train/validation/test sets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a dataset into train.csv, val.csv and test.csv
    Split(SplitArgs),
    /// Validate a split configuration
    Validate {
        /// Path to split YAML file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show version information
    Version,
}

#[derive(Args)]
struct SplitArgs {
    /// Path to split YAML file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Input dataset (.csv or .parquet)
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// Directory receiving the three subsets
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// Column to stratify on
    #[arg(short, long)]
    target_column: Option<String>,
    /// Fraction of rows for validation + test
    #[arg(long)]
    test_size: Option<f64>,
    /// Fraction of the validation + test rows that go to validation
    #[arg(long)]
    val_size: Option<f64>,
    /// Random seed
    #[arg(long, allow_negative_numbers = true)]
    seed: Option<i64>,
    /// Output format
    #[arg(long, value_enum)]
    format: Option<Format>,
    /// Skip writing manifest.json
    #[arg(long)]
    no_manifest: bool,
}

impl SplitArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            input_path: self.input.clone(),
            output_dir: self.output_dir.clone(),
            target_column: self.target_column.clone(),
            test_size: self.test_size,
            val_size: self.val_size,
            random_seed: self.seed,
            format: self.format,
            no_manifest: self.no_manifest,
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Split(args) => {
            let config = SplitConfig::resolve(args.config.as_deref(), args.overrides())?;
            println!("Input file: {}", config.input_path.display());
            println!("Output directory: {}", config.output_dir.display());

            let report = runtime::run_split(&config)?;

            println!("\n✓ Splits completed!");
            println!("Train: {} samples", report.train_rows);
            println!("Validation: {} samples", report.val_rows);
            println!("Test: {} samples", report.test_rows);
        }
        Commands::Validate { config } => {
            let _config = SplitConfig::from_yaml_file(&config)?;
            println!("✓ Split configuration is valid");
        }
        Commands::Version => {
            println!("dsplit version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
