use clap::Subcommand;
use lampsmith_config::ConfigLoader;
use lampsmith_core::Result;
use std::path::PathBuf;

pub mod build;
pub mod cache;
pub mod plan;

pub use self::build::BuildArgs;
use self::cache::CacheCommands;

#[derive(Subcommand)]
pub enum Commands {
    /// Run every generator whose script or mesh changed (default)
    #[command(visible_alias = "b")]
    Build(BuildArgs),

    /// Show what a build would do without running anything
    Plan {
        /// Treat every script as needing a rebuild
        #[arg(short, long)]
        force: bool,
    },

    /// Inspect or reset the build cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

/// Options shared by every command
#[derive(Debug, Default)]
pub struct GlobalOptions {
    pub dir: Option<PathBuf>,
    pub cache_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

impl GlobalOptions {
    /// Config loader seeded with the global path overrides
    pub fn loader(&self) -> ConfigLoader {
        let mut loader = ConfigLoader::new();
        if let Some(dir) = &self.dir {
            loader = loader.directory(dir);
        }
        if let Some(cache_file) = &self.cache_file {
            loader = loader.cache_file(cache_file);
        }
        if let Some(output_dir) = &self.output_dir {
            loader = loader.output_directory(output_dir);
        }
        loader
    }
}

impl Commands {
    pub async fn execute(self, globals: GlobalOptions) -> Result<()> {
        match self {
            Commands::Build(args) => build::execute(&globals, args).await,
            Commands::Plan { force } => plan::execute(&globals, force),
            Commands::Cache { command } => command.execute(&globals),
        }
    }
}
