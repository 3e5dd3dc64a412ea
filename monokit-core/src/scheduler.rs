//! Parallel task scheduling with topological ordering and bounded concurrency.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::graph::DependencyGraph;

/// Terminal state of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskStatus {
    /// The command ran and exited zero.
    Success,
    /// The command ran and exited non-zero, or could not be spawned.
    Failed,
    /// Not run because a dependency did not succeed.
    Skipped,
    /// Not run because fail-fast halted admissions first.
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Success => "success",
            TaskStatus::Failed => "failed",
            TaskStatus::Skipped => "skipped",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

/// Result of executing one task for one package.
#[derive(Debug, Clone, Serialize)]
pub struct TaskResult {
    pub package: String,
    pub status: TaskStatus,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

mod duration_millis {
    use super::Duration;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u128(d.as_millis())
    }
}

impl TaskResult {
    fn not_run(package: String, status: TaskStatus) -> Self {
        Self {
            package,
            status,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            duration: Duration::ZERO,
        }
    }
}

/// Aggregated results of one scheduler run, ordered by completion time.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunReport {
    results: Vec<TaskResult>,
}

impl RunReport {
    fn push(&mut self, result: TaskResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[TaskResult] {
        &self.results
    }

    /// Looks a result up by package name.
    pub fn get(&self, package: &str) -> Option<&TaskResult> {
        self.results.iter().find(|r| r.package == package)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn count(&self, status: TaskStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    pub fn all_success(&self) -> bool {
        self.results.iter().all(|r| r.status == TaskStatus::Success)
    }

    /// Whether the overall invocation must exit non-zero.
    pub fn is_failure(&self) -> bool {
        self.results
            .iter()
            .any(|r| matches!(r.status, TaskStatus::Failed | TaskStatus::Cancelled))
    }
}

/// Output of one subprocess run.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// External process collaborator. Blocking; no implicit timeout.
pub trait ProcessRunner: Send + Sync {
    fn execute(
        &self,
        working_dir: &Path,
        command: &str,
        env: &HashMap<String, String>,
    ) -> Result<ProcessOutput>;
}

/// Production runner: executes the command through `sh -c` in the package
/// directory, inheriting the parent environment plus the merged layers.
pub struct ShellRunner;

impl ProcessRunner for ShellRunner {
    fn execute(
        &self,
        working_dir: &Path,
        command: &str,
        env: &HashMap<String, String>,
    ) -> Result<ProcessOutput> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(working_dir)
            .envs(env)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        Ok(ProcessOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// One unit of scheduled work: a resolved command for one package.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub package: String,
    pub command: String,
    /// Script-level environment layer.
    pub env: HashMap<String, String>,
}

/// Scheduling policy for one run.
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    pub concurrency: usize,
    pub fail_fast: bool,
    pub topological: bool,
    /// Global environment layer, lowest precedence.
    pub global_env: HashMap<String, String>,
    /// Per-invocation overrides, highest precedence.
    pub override_env: HashMap<String, String>,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            fail_fast: false,
            topological: true,
            global_env: HashMap::new(),
            override_env: HashMap::new(),
        }
    }
}

/// Runs tasks across packages respecting ordering, concurrency and failure
/// policy.
///
/// The admission loop is event-driven: a package becomes eligible the instant
/// every one of its selected dependencies has succeeded, without waiting for
/// the rest of its level. Eligible packages are admitted in lexical order.
pub struct Scheduler {
    root: PathBuf,
    runner: Arc<dyn ProcessRunner>,
    options: ExecutionOptions,
}

impl Scheduler {
    pub fn new(root: impl Into<PathBuf>, options: ExecutionOptions) -> Self {
        Self {
            root: root.into(),
            runner: Arc::new(ShellRunner),
            options,
        }
    }

    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Executes the given tasks and returns the full report.
    ///
    /// Task failures are data in the report, never an `Err`: only setup
    /// problems (a task naming an unknown package) abort the run.
    pub fn run(&self, graph: &DependencyGraph, tasks: &[TaskSpec]) -> Result<RunReport> {
        let mut selected: BTreeMap<String, &TaskSpec> = BTreeMap::new();
        for task in tasks {
            if !graph.contains(&task.package) {
                return Err(Error::PackageNotFound {
                    name: task.package.clone(),
                    available: graph
                        .all_packages()
                        .iter()
                        .map(|p| p.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                });
            }
            selected.insert(task.package.clone(), task);
        }

        if selected.is_empty() {
            return Ok(RunReport::default());
        }

        // Dependency bookkeeping restricted to the selected set. Edges to
        // non-selected packages do not gate eligibility.
        let mut deps_remaining: HashMap<String, usize> = HashMap::new();
        let mut selected_dependents: HashMap<String, Vec<String>> = HashMap::new();
        for name in selected.keys() {
            let deps = if self.options.topological {
                graph
                    .dependencies(name)?
                    .into_iter()
                    .filter(|d| selected.contains_key(d))
                    .collect::<Vec<_>>()
            } else {
                Vec::new()
            };
            deps_remaining.insert(name.clone(), deps.len());
            for dep in deps {
                selected_dependents.entry(dep).or_default().push(name.clone());
            }
        }

        let mut ready: BTreeSet<String> = deps_remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(name, _)| name.clone())
            .collect();

        let mut report = RunReport::default();
        let mut terminal: HashSet<String> = HashSet::new();
        let mut running = 0usize;
        let mut halted = false;

        let (tx, rx) = channel::unbounded::<TaskResult>();

        std::thread::scope(|scope| {
            loop {
                while !halted && running < self.options.concurrency {
                    let Some(name) = ready.iter().next().cloned() else {
                        break;
                    };
                    ready.remove(&name);

                    let spec = selected[&name];
                    let package = graph
                        .get_package(&name)
                        .expect("selected package exists in graph");
                    let working_dir = self.root.join(&package.path);
                    let env = self.merged_env(spec, &package.version, &package.path);
                    let runner = Arc::clone(&self.runner);
                    let tx = tx.clone();
                    let command = spec.command.clone();

                    debug!(package = %name, command = %command, "admitting task");
                    scope.spawn(move || {
                        let start = Instant::now();
                        let result = match runner.execute(&working_dir, &command, &env) {
                            Ok(output) => TaskResult {
                                package: name,
                                status: if output.exit_code == 0 {
                                    TaskStatus::Success
                                } else {
                                    TaskStatus::Failed
                                },
                                exit_code: Some(output.exit_code),
                                stdout: output.stdout,
                                stderr: output.stderr,
                                duration: start.elapsed(),
                            },
                            Err(e) => TaskResult {
                                package: name,
                                status: TaskStatus::Failed,
                                exit_code: None,
                                stdout: String::new(),
                                stderr: e.to_string(),
                                duration: start.elapsed(),
                            },
                        };
                        let _ = tx.send(result);
                    });
                    running += 1;
                }

                if running == 0 {
                    break;
                }

                let result = rx.recv().expect("worker channel closed unexpectedly");
                running -= 1;

                let name = result.package.clone();
                let failed = result.status == TaskStatus::Failed;
                terminal.insert(name.clone());
                report.push(result);

                if failed {
                    warn!(package = %name, "task failed");
                    if self.options.fail_fast {
                        // Already-running tasks drain naturally.
                        halted = true;
                    }
                    if self.options.topological {
                        self.skip_dependents(
                            &name,
                            &selected_dependents,
                            &mut ready,
                            &mut terminal,
                            &mut report,
                        );
                    }
                } else if self.options.topological {
                    for dependent in selected_dependents.get(&name).into_iter().flatten() {
                        if terminal.contains(dependent) {
                            continue;
                        }
                        let count = deps_remaining
                            .get_mut(dependent)
                            .expect("dependent tracked in deps_remaining");
                        *count -= 1;
                        if *count == 0 {
                            ready.insert(dependent.clone());
                        }
                    }
                }
            }

            // Everything not admitted by the time the loop ends was either
            // halted by fail-fast or unreachable; list it explicitly.
            for name in selected.keys() {
                if !terminal.contains(name) {
                    report.push(TaskResult::not_run(name.clone(), TaskStatus::Cancelled));
                }
            }
        });

        Ok(report)
    }

    /// Marks every selected transitive dependent of a non-successful package
    /// as skipped, so no task observes a failed dependency's output.
    fn skip_dependents(
        &self,
        failed: &str,
        selected_dependents: &HashMap<String, Vec<String>>,
        ready: &mut BTreeSet<String>,
        terminal: &mut HashSet<String>,
        report: &mut RunReport,
    ) {
        let mut queue = vec![failed.to_string()];
        while let Some(current) = queue.pop() {
            for dependent in selected_dependents.get(&current).into_iter().flatten() {
                if terminal.insert(dependent.clone()) {
                    debug!(package = %dependent, cause = %failed, "skipping dependent");
                    ready.remove(dependent);
                    report.push(TaskResult::not_run(dependent.clone(), TaskStatus::Skipped));
                    queue.push(dependent.clone());
                }
            }
        }
    }

    /// Merges environment layers: global, then script, then per-invocation
    /// overrides, then the package identity variables. Later layers win.
    fn merged_env(
        &self,
        spec: &TaskSpec,
        version: &str,
        path: &Path,
    ) -> HashMap<String, String> {
        let mut env = self.options.global_env.clone();
        env.extend(spec.env.clone());
        env.extend(self.options.override_env.clone());
        env.insert("MONOKIT_PACKAGE_NAME".to_string(), spec.package.clone());
        env.insert(
            "MONOKIT_PACKAGE_PATH".to_string(),
            path.display().to_string(),
        );
        env.insert("MONOKIT_PACKAGE_VERSION".to_string(), version.to_string());
        env
    }
}
