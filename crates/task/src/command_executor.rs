use async_trait::async_trait;
use lampsmith_core::{Error, Result};
#[cfg(test)]
use std::collections::HashMap;
use std::path::Path;
use std::process::{Output, Stdio};

/// Trait for executing external commands
/// This abstraction allows for testing without spawning the host application
/// by providing different implementations for production and test environments
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Execute `program` with `args`, capturing stdout and stderr in full
    async fn execute(&self, program: &Path, args: &[String]) -> Result<Output>;
}

/// Production implementation that spawns real processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandExecutor;

impl SystemCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandExecutor for SystemCommandExecutor {
    async fn execute(&self, program: &Path, args: &[String]) -> Result<Output> {
        tracing::debug!(program = %program.display(), args = ?args, "spawning command");

        // No timeout: a hung host has to be killed externally
        tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                Error::command_execution(
                    program.display().to_string(),
                    args.to_vec(),
                    format!("failed to execute command: {e}"),
                    None,
                )
            })
    }
}

/// Test implementation that simulates host invocations
/// Responses are keyed by the file name of the script passed as last argument
#[cfg(test)]
#[derive(Default)]
pub struct TestCommandExecutor {
    responses: std::sync::Mutex<HashMap<String, TestResponse>>,
    invocations: std::sync::Mutex<Vec<Vec<String>>>,
}

#[cfg(test)]
#[derive(Clone, Default)]
pub struct TestResponse {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub status_code: i32,
    /// File written before the response is returned, simulating an export
    pub artifact: Option<std::path::PathBuf>,
    /// Fail as if the process could not be spawned
    pub launch_error: bool,
}

#[cfg(test)]
impl TestCommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_response(&self, script: &str, response: TestResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(script.to_string(), response);
    }

    /// Succeed and write `artifact`, like a generator exporting its mesh
    pub fn add_export(&self, script: &str, artifact: impl Into<std::path::PathBuf>) {
        self.add_response(
            script,
            TestResponse {
                stdout: format!("exported {script}\n").into_bytes(),
                artifact: Some(artifact.into()),
                ..TestResponse::default()
            },
        );
    }

    pub fn add_error_response(&self, script: &str, stderr: &str) {
        self.add_response(
            script,
            TestResponse {
                stderr: stderr.as_bytes().to_vec(),
                status_code: 1,
                ..TestResponse::default()
            },
        );
    }

    /// Script file names in the order they were executed
    pub fn executed_scripts(&self) -> Vec<String> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .filter_map(|args| args.last())
            .map(|path| script_key(path))
            .collect()
    }

    pub fn invocations(&self) -> Vec<Vec<String>> {
        self.invocations.lock().unwrap().clone()
    }
}

#[cfg(test)]
fn script_key(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
#[async_trait]
impl CommandExecutor for TestCommandExecutor {
    async fn execute(&self, program: &Path, args: &[String]) -> Result<Output> {
        self.invocations.lock().unwrap().push(args.to_vec());

        let key = args.last().map(|path| script_key(path)).unwrap_or_default();
        let response = self.responses.lock().unwrap().get(&key).cloned();

        match response {
            Some(response) if response.launch_error => Err(Error::command_execution(
                program.display().to_string(),
                args.to_vec(),
                "failed to execute command: simulated launch failure",
                None,
            )),
            Some(response) => {
                if let Some(artifact) = &response.artifact {
                    std::fs::write(artifact, b"solid test\nendsolid test\n").map_err(|e| {
                        Error::file_system(artifact, "write test artifact", e)
                    })?;
                }
                Ok(Output {
                    status: exit_status::from_code(response.status_code),
                    stdout: response.stdout,
                    stderr: response.stderr,
                })
            }
            None => Err(Error::configuration(format!(
                "no test response configured for script: {key}"
            ))),
        }
    }
}
