use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;

use crate::event::Event;

/// A test run for one submitted solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub program: String,
    pub args: Vec<String>,
    /// Test scripts, already resolved against the package directory.
    pub tests: Vec<PathBuf>,
    pub solution: PathBuf,
}

impl RunRequest {
    /// Full argument list: configured args, then tests, then the solution.
    pub fn command_args(&self) -> Vec<String> {
        let mut args = self.args.clone();
        args.extend(self.tests.iter().map(|t| t.to_string_lossy().to_string()));
        args.push(self.solution.to_string_lossy().to_string());
        args
    }
}

/// Run the tests, streaming output lines and finally the exit as events.
pub async fn run_solution(request: RunRequest, tx: UnboundedSender<Event>) {
    let args = request.command_args();
    tracing::info!("Running {} {}", request.program, args.join(" "));

    let mut cmd = Command::new(&request.program);
    cmd.args(&args);
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            tracing::warn!("Failed to spawn {}: {}", request.program, e);
            let _ = tx.send(Event::RunnerOutput(format!(
                "Failed to start {}: {}",
                request.program, e
            )));
            let _ = tx.send(Event::RunnerExit { passed: false });
            return;
        }
    };

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let out_tx = tx.clone();
    let err_tx = tx.clone();

    let stdout_future = async move {
        if let Some(stdout) = stdout {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let _ = out_tx.send(Event::RunnerOutput(line));
            }
        }
    };
    let stderr_future = async move {
        if let Some(stderr) = stderr {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let _ = err_tx.send(Event::RunnerOutput(line));
            }
        }
    };
    tokio::join!(stdout_future, stderr_future);

    let passed = match child.wait().await {
        Ok(status) => {
            tracing::info!("Runner exited with {}", status);
            status.success()
        }
        Err(e) => {
            tracing::warn!("Failed to wait for runner: {}", e);
            false
        }
    };
    let _ = tx.send(Event::RunnerExit { passed });
}
