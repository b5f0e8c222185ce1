use super::GlobalOptions;
use lampsmith_core::Result;
use lampsmith_task::ChangeGatedRunner;

pub fn execute(globals: &GlobalOptions, force: bool) -> Result<()> {
    let config = globals.loader().force(force).interactive(false).load()?;
    let plan = ChangeGatedRunner::new(config).plan()?;

    if plan.scripts.is_empty() {
        println!("No lamp scripts found");
        return Ok(());
    }

    let pending = plan
        .scripts
        .iter()
        .filter(|s| s.decision.should_run())
        .count();

    for script in &plan.scripts {
        let glyph = if script.decision.should_run() { "▶" } else { "⏩" };
        println!(
            "{glyph} {} -> {}: {}",
            script.script, script.output, script.decision
        );
    }

    println!();
    println!(
        "{pending} of {} scripts would run",
        plan.scripts.len()
    );
    Ok(())
}
