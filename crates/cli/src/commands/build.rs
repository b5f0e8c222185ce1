use super::GlobalOptions;
use clap::Args;
use lampsmith_core::Result;
use lampsmith_task::ChangeGatedRunner;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    /// Path to the Blender executable (overrides BLENDER_PATH and auto-detection)
    #[arg(long, value_name = "PATH")]
    pub host: Option<PathBuf>,

    /// Rebuild every script regardless of the cache
    #[arg(short, long)]
    pub force: bool,

    /// Fail instead of prompting when Blender cannot be found
    #[arg(long)]
    pub non_interactive: bool,
}

pub async fn execute(globals: &GlobalOptions, args: BuildArgs) -> Result<()> {
    let mut loader = globals
        .loader()
        .force(args.force)
        .interactive(!args.non_interactive);
    if let Some(host) = args.host {
        loader = loader.host(host);
    }
    let config = loader.load()?;
    let output_directory = config.output_directory.clone();

    let summary = ChangeGatedRunner::new(config).run().await?;

    let failed = summary.failures().count();
    if failed > 0 {
        tracing::warn!(failed, "some generator scripts failed");
    }

    println!();
    println!(
        "Done! Check {} for your generated lamp models.",
        output_directory.display()
    );
    Ok(())
}
