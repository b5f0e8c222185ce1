use clap::Parser;
use std::path::PathBuf;

mod commands;

use commands::{BuildArgs, Commands};

#[derive(Parser)]
#[command(name = "lampsmith")]
#[command(about = "Regenerate lamp part meshes from Blender generator scripts", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory containing the generator scripts (defaults to the current directory)
    #[arg(short = 'C', long, global = true)]
    dir: Option<PathBuf>,

    /// Build cache file, relative to the script directory
    #[arg(long, global = true)]
    cache_file: Option<PathBuf>,

    /// Output directory for exported meshes, relative to the script directory
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    lampsmith_utils::tracing::init(cli.verbose)
        .map_err(|e| eyre::eyre!("failed to initialize logging: {e}"))?;

    let globals = commands::GlobalOptions {
        dir: cli.dir,
        cache_file: cli.cache_file,
        output_dir: cli.output_dir,
    };

    let command = cli
        .command
        .unwrap_or(Commands::Build(BuildArgs::default()));
    command.execute(globals).await?;

    Ok(())
}
