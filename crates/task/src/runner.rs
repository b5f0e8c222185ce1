//! Change-gated execution of generator scripts
//!
//! Each script is hashed and compared with the build cache. New or modified
//! scripts, and unchanged scripts whose mesh is missing, are executed in the
//! host application; the rest are skipped. The cache is read once before the
//! first script and written once after the last one.

use crate::command_executor::{CommandExecutor, SystemCommandExecutor};
use crate::host::{HostLocator, HostPrompt, NoPrompt, StdinPrompt};
use crate::locator;
use chrono::{Local, NaiveDateTime};
use lampsmith_cache::{script_digest, BuildCache, CacheState};
use lampsmith_config::BuildConfig;
use lampsmith_core::{
    constants::{HOST_BACKGROUND_FLAG, HOST_SCRIPT_FLAG},
    Error, OutputMapping, Result, RunDecision, RunOutcome, ScriptEntry,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// What happened to one script during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptReport {
    pub script: String,
    pub output: String,
    pub decision: RunDecision,
    /// `None` when the script was skipped
    pub outcome: Option<RunOutcome>,
}

/// Whether a mapped output exists after the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPresence {
    pub output: String,
    pub found: bool,
}

/// Everything a completed run observed
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub reports: Vec<ScriptReport>,
    pub presence: Vec<OutputPresence>,
    pub cache_saved: bool,
}

impl RunSummary {
    pub fn executed(&self) -> impl Iterator<Item = &ScriptReport> {
        self.reports.iter().filter(|r| r.outcome.is_some())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ScriptReport> {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, Some(RunOutcome::Failure { .. })))
    }

    #[must_use]
    pub fn report(&self, script: &str) -> Option<&ScriptReport> {
        self.reports.iter().find(|r| r.script == script)
    }

    #[must_use]
    pub fn missing_outputs(&self) -> Vec<&str> {
        self.presence
            .iter()
            .filter(|p| !p.found)
            .map(|p| p.output.as_str())
            .collect()
    }
}

/// A decision computed without executing anything
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedScript {
    pub script: String,
    pub output: String,
    pub hash: Option<String>,
    pub decision: RunDecision,
}

/// Result of a dry run
#[derive(Debug, Clone, Default)]
pub struct BuildPlan {
    pub mapping: OutputMapping,
    pub scripts: Vec<PlannedScript>,
}

/// Decide whether a script must run
#[must_use]
pub fn decide(cache_state: CacheState, output_exists: bool, force: bool) -> RunDecision {
    if force {
        return RunDecision::RunForced;
    }
    match cache_state {
        CacheState::New => RunDecision::RunNew,
        CacheState::Modified => RunDecision::RunModified,
        CacheState::Unchanged if !output_exists => RunDecision::RunOutputMissing,
        CacheState::Unchanged => RunDecision::Skip,
    }
}

/// Sequential runner over the scripts of one directory
pub struct ChangeGatedRunner {
    config: BuildConfig,
    executor: Box<dyn CommandExecutor>,
    locator: HostLocator,
    prompt: Box<dyn HostPrompt>,
}

impl ChangeGatedRunner {
    /// Runner with the real process executor and host locator
    pub fn new(config: BuildConfig) -> Self {
        let locator = HostLocator::new(config.host.clone());
        let prompt: Box<dyn HostPrompt> = if config.host.interactive {
            Box::new(StdinPrompt)
        } else {
            Box::new(NoPrompt)
        };

        Self {
            config,
            executor: Box::new(SystemCommandExecutor::new()),
            locator,
            prompt,
        }
    }

    pub fn with_executor(mut self, executor: Box<dyn CommandExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_locator(mut self, locator: HostLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn with_prompt(mut self, prompt: Box<dyn HostPrompt>) -> Self {
        self.prompt = prompt;
        self
    }

    #[must_use]
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Compute decisions without invoking the host or touching the cache
    pub fn plan(&self) -> Result<BuildPlan> {
        let scripts = locator::discover(&self.config.working_directory)?;
        let mapping = locator::build_mapping(&scripts);
        let cache = BuildCache::load(&self.config.cache_file);

        let planned = scripts
            .iter()
            .filter_map(|entry| {
                let output = mapping.get(entry.filename())?.to_string();
                let hash = script_digest(entry.path());
                let decision = self.decision_for(&cache, entry, &output, hash.as_deref());
                Some(PlannedScript {
                    script: entry.filename().to_string(),
                    output,
                    hash,
                    decision,
                })
            })
            .collect();

        Ok(BuildPlan {
            mapping,
            scripts: planned,
        })
    }

    /// Run every script that needs it and persist the updated cache
    pub async fn run(&self) -> Result<RunSummary> {
        self.ensure_output_directory()?;

        let scripts = locator::discover(&self.config.working_directory)?;
        let names: Vec<&str> = scripts.iter().map(ScriptEntry::filename).collect();
        println!("Found {} lamp scripts: {}", scripts.len(), names.join(", "));

        let mapping = locator::build_mapping(&scripts);
        println!("Script to STL mapping:");
        for (script, output) in mapping.iter() {
            println!("  {script} -> {output}");
        }

        let mut cache = BuildCache::load(&self.config.cache_file);

        let host = self.locator.locate(self.prompt.as_ref())?;
        println!("Found Blender at: {}", host.display());

        let mut summary = RunSummary::default();
        let mut seen: Vec<(String, Option<String>, bool)> = Vec::with_capacity(scripts.len());

        for entry in &scripts {
            if !entry.path().exists() {
                println!("Warning: Script file not found: {}", entry.path().display());
                continue;
            }

            let Some(output) = mapping.get(entry.filename()).map(str::to_string) else {
                continue;
            };

            let hash = script_digest(entry.path());
            let decision = self.decision_for(&cache, entry, &output, hash.as_deref());

            let outcome = match decision.reason() {
                Some(reason) => {
                    println!("Processing {} (reason: {reason})", entry.filename());
                    let outcome = self.invoke(&host, entry).await;
                    if outcome.is_success() {
                        println!("✅ Successfully ran {}", entry.filename());
                    } else {
                        println!("❌ Failed to run {}", entry.filename());
                    }
                    Some(outcome)
                }
                None => {
                    println!("⏩ Skipping {} (unchanged since last run)", entry.filename());
                    None
                }
            };

            let processed = outcome.as_ref().is_some_and(RunOutcome::is_success);
            seen.push((entry.filename().to_string(), hash, processed));
            summary.reports.push(ScriptReport {
                script: entry.filename().to_string(),
                output,
                decision,
                outcome,
            });
        }

        let now = now();
        for (script, hash, processed) in seen {
            cache.record(&script, hash, processed, now);
        }

        summary.cache_saved = match cache.save() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "failed to save build cache");
                println!(
                    "Warning: Could not save hash cache to {}",
                    cache.path().display()
                );
                false
            }
        };

        println!();
        println!("Checking STL output files:");
        for (_, output) in mapping.iter() {
            let found = self.config.output_path(output).exists();
            if found {
                println!("✅ Found STL: {output}");
            } else {
                println!("❌ Missing STL: {output}");
            }
            summary.presence.push(OutputPresence {
                output: output.to_string(),
                found,
            });
        }

        Ok(summary)
    }

    fn decision_for(
        &self,
        cache: &BuildCache,
        entry: &ScriptEntry,
        output: &str,
        hash: Option<&str>,
    ) -> RunDecision {
        let state = cache.classify(entry.filename(), hash);
        lampsmith_utils::tracing::cache_event(
            entry.filename(),
            state == CacheState::Unchanged,
            "classify",
        );
        let output_exists = self.config.output_path(output).exists();
        decide(state, output_exists, self.config.runtime.force)
    }

    fn ensure_output_directory(&self) -> Result<()> {
        let dir = &self.config.output_directory;
        if dir.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(dir).map_err(|e| Error::file_system(dir, "create output directory", e))?;
        println!("Created STLs directory: {}", dir.display());
        Ok(())
    }

    async fn invoke(&self, host: &Path, entry: &ScriptEntry) -> RunOutcome {
        let script_path = absolute(entry.path());
        if !script_path.exists() {
            println!("Error: Script file not found: {}", script_path.display());
            return RunOutcome::Failure {
                reason: "script file not found".to_string(),
            };
        }

        println!("Running Blender with script: {}", entry.filename());
        tracing::info!(script = %entry.filename(), host = %host.display(), "invoking host");

        let args = vec![
            HOST_BACKGROUND_FLAG.to_string(),
            HOST_SCRIPT_FLAG.to_string(),
            script_path.display().to_string(),
        ];

        let started = Instant::now();
        let result = self.executor.execute(host, &args).await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let outcome = match result {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);

                if output.status.success() {
                    print_captured(&stdout, &stderr);
                    RunOutcome::Success
                } else {
                    let reason = match output.status.code() {
                        Some(code) => format!("exit code {code}"),
                        None => "terminated by signal".to_string(),
                    };
                    println!("Error running Blender: {reason}");
                    print_captured(&stdout, &stderr);
                    RunOutcome::Failure { reason }
                }
            }
            Err(e) => {
                println!("Error running Blender: {e}");
                RunOutcome::Failure {
                    reason: e.to_string(),
                }
            }
        };

        lampsmith_utils::tracing::script_completed(
            entry.filename(),
            duration_ms,
            outcome.is_success(),
        );
        outcome
    }
}

fn print_captured(stdout: &str, stderr: &str) {
    println!("---- Output ----");
    println!("{stdout}");
    if !stderr.is_empty() {
        println!("---- Errors ----");
        println!("{stderr}");
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_executor::{TestCommandExecutor, TestResponse};
    use lampsmith_config::ConfigLoader;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Shares one `TestCommandExecutor` between the runner and the assertions
    struct SharedExecutor(Arc<TestCommandExecutor>);

    #[async_trait::async_trait]
    impl CommandExecutor for SharedExecutor {
        async fn execute(&self, program: &Path, args: &[String]) -> Result<std::process::Output> {
            self.0.execute(program, args).await
        }
    }

    struct Fixture {
        dir: TempDir,
        host: PathBuf,
        executor: Arc<TestCommandExecutor>,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let host = dir.path().join("fake-blender");
            fs::write(&host, "").unwrap();
            Self {
                dir,
                host,
                executor: Arc::new(TestCommandExecutor::new()),
            }
        }

        fn script(&self, name: &str, content: &str) {
            fs::write(self.dir.path().join(name), content).unwrap();
        }

        fn output(&self, name: &str) -> PathBuf {
            self.dir.path().join("STLs").join(name)
        }

        fn runner(&self, force: bool) -> ChangeGatedRunner {
            let config = ConfigLoader::new()
                .directory(self.dir.path())
                .host(&self.host)
                .interactive(false)
                .force(force)
                .load()
                .unwrap();
            ChangeGatedRunner::new(config)
                .with_executor(Box::new(SharedExecutor(Arc::clone(&self.executor))))
        }

        fn cache(&self) -> BuildCache {
            BuildCache::load(self.dir.path().join(".lamp_build_cache.json"))
        }
    }

    #[test]
    fn test_decide() {
        assert_eq!(decide(CacheState::New, true, false), RunDecision::RunNew);
        assert_eq!(decide(CacheState::Modified, true, false), RunDecision::RunModified);
        assert_eq!(
            decide(CacheState::Unchanged, false, false),
            RunDecision::RunOutputMissing
        );
        assert_eq!(decide(CacheState::Unchanged, true, false), RunDecision::Skip);
        assert_eq!(decide(CacheState::Unchanged, true, true), RunDecision::RunForced);
    }

    #[tokio::test]
    async fn test_second_run_skips_unchanged_scripts() {
        let fx = Fixture::new();
        fx.script("lamp_base.py", "import bpy\n");
        fx.executor.add_export("lamp_base.py", fx.output("base.stl"));

        let first = fx.runner(false).run().await.unwrap();
        assert_eq!(first.reports[0].decision, RunDecision::RunNew);
        assert_eq!(first.reports[0].outcome, Some(RunOutcome::Success));
        assert!(first.cache_saved);

        let second = fx.runner(false).run().await.unwrap();
        assert_eq!(second.reports[0].decision, RunDecision::Skip);
        assert_eq!(second.reports[0].outcome, None);
        assert_eq!(fx.executor.executed_scripts(), vec!["lamp_base.py"]);
        assert!(second.missing_outputs().is_empty());
    }

    #[tokio::test]
    async fn test_modified_script_reruns_and_updates_hash() {
        let fx = Fixture::new();
        fx.script("lamp_base.py", "SHADE_SIZE = 200\n");
        fx.executor.add_export("lamp_base.py", fx.output("base.stl"));
        fx.runner(false).run().await.unwrap();
        let old_hash = fx.cache().get("lamp_base.py").unwrap().hash.clone();

        fx.script("lamp_base.py", "SHADE_SIZE = 240\n");
        let summary = fx.runner(false).run().await.unwrap();

        assert_eq!(summary.reports[0].decision, RunDecision::RunModified);
        let new_hash = fx.cache().get("lamp_base.py").unwrap().hash.clone();
        assert_ne!(old_hash, new_hash);
        assert_eq!(
            new_hash,
            lampsmith_cache::hash_file(&fx.dir.path().join("lamp_base.py")).ok()
        );
    }

    #[tokio::test]
    async fn test_deleted_output_triggers_rerun() {
        let fx = Fixture::new();
        fx.script("simple_cube_lamp.py", "import bpy\n");
        fx.executor
            .add_export("simple_cube_lamp.py", fx.output("simple_cube_shade.stl"));
        fx.runner(false).run().await.unwrap();

        fs::remove_file(fx.output("simple_cube_shade.stl")).unwrap();
        let summary = fx.runner(false).run().await.unwrap();

        assert_eq!(summary.reports[0].decision, RunDecision::RunOutputMissing);
        assert_eq!(fx.executor.executed_scripts().len(), 2);
        assert!(fx.output("simple_cube_shade.stl").exists());
    }

    #[tokio::test]
    async fn test_invalid_cache_treats_every_script_as_new() {
        let fx = Fixture::new();
        fx.script("lamp_base.py", "a\n");
        fx.script("simple_cube_lamp.py", "b\n");
        fs::create_dir_all(fx.dir.path().join("STLs")).unwrap();
        fs::write(fx.output("base.stl"), "solid").unwrap();
        fs::write(fx.output("simple_cube_shade.stl"), "solid").unwrap();
        fs::write(fx.dir.path().join(".lamp_build_cache.json"), "not json at all").unwrap();
        fx.executor.add_export("lamp_base.py", fx.output("base.stl"));
        fx.executor
            .add_export("simple_cube_lamp.py", fx.output("simple_cube_shade.stl"));

        let summary = fx.runner(false).run().await.unwrap();

        assert!(summary
            .reports
            .iter()
            .all(|r| r.decision == RunDecision::RunNew));
        assert_eq!(fx.cache().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_script_records_hash_and_reports_missing() {
        let fx = Fixture::new();
        fx.script("lamp_base.py", "raise RuntimeError\n");
        fx.executor.add_error_response("lamp_base.py", "Traceback");

        let summary = fx.runner(false).run().await.unwrap();

        assert!(matches!(
            summary.reports[0].outcome,
            Some(RunOutcome::Failure { .. })
        ));
        assert_eq!(summary.failures().count(), 1);
        assert_eq!(summary.missing_outputs(), vec!["base.stl"]);
        let entry = fx.cache().get("lamp_base.py").cloned().unwrap();
        assert!(entry.hash.is_some());
        assert!(entry.last_processed.is_some());

        // Unchanged hash but still no output: retried next run
        let retry = fx.runner(false).run().await.unwrap();
        assert_eq!(retry.reports[0].decision, RunDecision::RunOutputMissing);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_remaining_scripts() {
        let fx = Fixture::new();
        fx.script("cylindrical_lamp_shade.py", "x\n");
        fx.script("lamp_base.py", "y\n");
        fx.executor.add_response(
            "cylindrical_lamp_shade.py",
            TestResponse {
                launch_error: true,
                ..TestResponse::default()
            },
        );
        fx.executor.add_export("lamp_base.py", fx.output("base.stl"));

        let summary = fx.runner(false).run().await.unwrap();

        assert_eq!(
            fx.executor.executed_scripts(),
            vec!["cylindrical_lamp_shade.py", "lamp_base.py"]
        );
        assert_eq!(
            summary.report("lamp_base.py").unwrap().outcome,
            Some(RunOutcome::Success)
        );
        assert_eq!(summary.missing_outputs(), vec!["cylindrical_shade.stl"]);
    }

    #[tokio::test]
    async fn test_last_processed_only_advances_on_success() {
        let fx = Fixture::new();
        fx.script("lamp_base.py", "x\n");
        fx.script("simple_cube_lamp.py", "y\n");
        fs::create_dir_all(fx.dir.path().join("STLs")).unwrap();
        fs::write(fx.output("base.stl"), "solid").unwrap();

        let old = chrono::NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut seeded = BuildCache::empty(fx.dir.path().join(".lamp_build_cache.json"));
        for script in ["lamp_base.py", "simple_cube_lamp.py"] {
            let hash = lampsmith_cache::hash_file(&fx.dir.path().join(script)).ok();
            seeded.record(script, hash, true, old);
        }
        seeded.save().unwrap();
        fx.executor.add_error_response("simple_cube_lamp.py", "boom");

        fx.runner(false).run().await.unwrap();

        let cache = fx.cache();
        // Skipped
        assert_eq!(cache.get("lamp_base.py").unwrap().last_processed, Some(old));
        // Ran but failed
        assert_eq!(
            cache.get("simple_cube_lamp.py").unwrap().last_processed,
            Some(old)
        );
    }

    #[tokio::test]
    async fn test_invocation_arguments() {
        let fx = Fixture::new();
        fx.script("lamp_base.py", "x\n");
        fx.executor.add_export("lamp_base.py", fx.output("base.stl"));

        fx.runner(false).run().await.unwrap();

        let invocations = fx.executor.invocations();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0][0], "--background");
        assert_eq!(invocations[0][1], "--python");
        assert_eq!(
            PathBuf::from(&invocations[0][2]),
            fx.dir.path().join("lamp_base.py")
        );
    }

    #[tokio::test]
    async fn test_force_reruns_everything() {
        let fx = Fixture::new();
        fx.script("lamp_base.py", "x\n");
        fx.executor.add_export("lamp_base.py", fx.output("base.stl"));
        fx.runner(false).run().await.unwrap();

        let summary = fx.runner(true).run().await.unwrap();

        assert_eq!(summary.reports[0].decision, RunDecision::RunForced);
        assert_eq!(fx.executor.executed_scripts().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_host_aborts_before_processing() {
        let fx = Fixture::new();
        fx.script("lamp_base.py", "x\n");
        let config = ConfigLoader::new()
            .directory(fx.dir.path())
            .host(fx.dir.path().join("no-such-blender"))
            .interactive(false)
            .load()
            .unwrap();
        let runner = ChangeGatedRunner::new(config)
            .with_executor(Box::new(SharedExecutor(Arc::clone(&fx.executor))));

        let err = runner.run().await.unwrap_err();

        assert!(matches!(err, Error::HostNotFound { .. }));
        assert!(fx.executor.invocations().is_empty());
        assert!(!fx.dir.path().join(".lamp_build_cache.json").exists());
        // Output directory is prepared before the host lookup
        assert!(fx.dir.path().join("STLs").is_dir());
    }

    #[tokio::test]
    async fn test_plan_has_no_side_effects() {
        let fx = Fixture::new();
        fx.script("lamp_base.py", "x\n");
        fx.script("simple_cube_lamp.py", "y\n");

        let plan = fx.runner(false).plan().unwrap();

        assert_eq!(plan.scripts.len(), 2);
        assert!(plan
            .scripts
            .iter()
            .all(|s| s.decision == RunDecision::RunNew && s.hash.is_some()));
        assert_eq!(plan.mapping.get("lamp_base.py"), Some("base.stl"));
        assert!(fx.executor.invocations().is_empty());
        assert!(!fx.dir.path().join("STLs").exists());
        assert!(!fx.dir.path().join(".lamp_build_cache.json").exists());
    }

    #[tokio::test]
    async fn test_unsaveable_cache_is_only_a_warning() {
        let fx = Fixture::new();
        fx.script("lamp_base.py", "x\n");
        fx.executor.add_export("lamp_base.py", fx.output("base.stl"));
        let blocker = fx.dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let config = ConfigLoader::new()
            .directory(fx.dir.path())
            .cache_file(blocker.join("cache.json"))
            .host(&fx.host)
            .interactive(false)
            .load()
            .unwrap();
        let summary = ChangeGatedRunner::new(config)
            .with_executor(Box::new(SharedExecutor(Arc::clone(&fx.executor))))
            .run()
            .await
            .unwrap();

        assert!(!summary.cache_saved);
        assert_eq!(summary.reports[0].outcome, Some(RunOutcome::Success));
    }
}
