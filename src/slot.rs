//! Worker slots and the process-execution seam.
//!
//! A slot is one of N reusable launchers: it runs at most one external
//! process at a time and reports each completion as a message on the
//! dispatcher's channel. The actual execution goes through the
//! [`ProcessRunner`] trait so tests can substitute scripted runners.

use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::debug;

/// Index of a worker slot within the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub usize);

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "slot{}", self.0)
    }
}

/// Exit code and captured output of one finished process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Process exit code; `-1` when the process was killed by a signal.
    pub exit_code: i32,
    /// Combined stdout and stderr.
    pub output: String,
}

/// Executes one external process and reports its outcome.
///
/// Exactly one completion per invocation. An `Err` means the process
/// could not be launched at all; the slot turns that into a failure
/// completion so a bad binary path never wedges the pool.
pub trait ProcessRunner: Send + Sync + 'static {
    fn run(
        &self,
        program: &str,
        args: &[String],
    ) -> impl Future<Output = std::io::Result<ProcessOutput>> + Send;
}

/// Production runner: spawns the program via `tokio::process` and
/// captures both output streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandRunner;

impl ProcessRunner for CommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<ProcessOutput> {
        let out = Command::new(program).args(args).output().await?;

        let mut combined = String::from_utf8_lossy(&out.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&out.stderr));

        Ok(ProcessOutput {
            exit_code: out.status.code().unwrap_or(-1),
            output: combined,
        })
    }
}

/// Completion message delivered to the dispatch loop.
#[derive(Debug, Clone)]
pub struct SlotCompletion {
    pub slot: SlotId,
    pub exit_code: i32,
    pub output: String,
}

impl SlotCompletion {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// One reusable worker slot. Created once at dispatcher construction and
/// reused for every job assigned to its index.
pub struct WorkerSlot<R> {
    id: SlotId,
    runner: Arc<R>,
    completions: mpsc::UnboundedSender<SlotCompletion>,
}

impl<R: ProcessRunner> WorkerSlot<R> {
    pub(crate) fn new(
        id: SlotId,
        runner: Arc<R>,
        completions: mpsc::UnboundedSender<SlotCompletion>,
    ) -> Self {
        Self {
            id,
            runner,
            completions,
        }
    }

    /// Launch one process for this slot. Returns immediately; the
    /// completion arrives later on the dispatcher's channel.
    pub(crate) fn start(&self, program: String, args: Vec<String>) {
        let slot = self.id;
        let runner = Arc::clone(&self.runner);
        let completions = self.completions.clone();

        tokio::spawn(async move {
            debug!(%slot, %program, "process starting");
            let completion = match runner.run(&program, &args).await {
                Ok(out) => SlotCompletion {
                    slot,
                    exit_code: out.exit_code,
                    output: out.output,
                },
                Err(e) => SlotCompletion {
                    slot,
                    exit_code: -1,
                    output: format!("failed to launch {program}: {e}"),
                },
            };
            debug!(%slot, exit_code = completion.exit_code, "process finished");
            // receiver gone means the dispatcher was dropped mid-flight
            let _ = completions.send(completion);
        });
    }
}
