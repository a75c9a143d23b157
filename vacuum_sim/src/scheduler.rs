//! Worker pool that runs every (house, algorithm) pair under a timeout.
//!
//! Each task runs on its own named thread so the worker can stop waiting
//! for it. A run that overstays its budget is cancelled through its
//! [`CancelToken`], detached and scored with the timeout penalty; a
//! panicking algorithm is caught and scored as dead. Neither affects any
//! other task.

use crate::cancel::CancelToken;
use crate::config::HarnessConfig;
use crate::engine::{RunOutcome, RunStatus, SimulationEngine};
use crate::error::{Diagnostic, DiagnosticKind};
use crate::house::House;
use crate::registry::AlgorithmRegistry;
use crate::report::{ResultTable, ScheduleReport};
use crate::task_queue::TaskQueue;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use vacuum_core::NavigationAlgorithm;

/// Worker threads used when none are configured.
pub const DEFAULT_NUM_THREADS: usize = 10;

/// Wall-clock budget per simulated step used when none is configured.
pub const DEFAULT_TIMEOUT_PER_STEP: Duration = Duration::from_millis(1);

/// A house paired with one freshly built algorithm instance.
pub struct Task {
    pub house: Arc<House>,
    pub algorithm: String,
    instance: Box<dyn NavigationAlgorithm>,
}

impl Task {
    pub fn new(house: Arc<House>, algorithm: impl Into<String>, instance: Box<dyn NavigationAlgorithm>) -> Self {
        Self {
            house,
            algorithm: algorithm.into(),
            instance,
        }
    }

    /// `<house>-<algorithm>`, used for thread names and diagnostics.
    pub fn key(&self) -> String {
        format!("{}-{}", self.house.name, self.algorithm)
    }
}

/// Outcome of the run thread; `Err` carries a panic message.
type Completion = Result<RunOutcome, String>;

#[derive(Default)]
struct RunSlot {
    done: Mutex<Option<Completion>>,
    signal: Condvar,
}

impl RunSlot {
    fn complete(&self, completion: Completion) {
        *lock(&self.done) = Some(completion);
        self.signal.notify_all();
    }
}

/// Runs competitions on a fixed-size worker pool.
#[derive(Debug, Clone)]
pub struct TaskScheduler {
    num_threads: usize,
    timeout_per_step: Duration,
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_NUM_THREADS)
    }
}

impl TaskScheduler {
    /// Creates a scheduler with `num_threads` workers.
    pub fn new(num_threads: usize) -> Self {
        Self {
            num_threads,
            timeout_per_step: DEFAULT_TIMEOUT_PER_STEP,
        }
    }

    /// Creates a scheduler from the harness configuration.
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(config.num_threads).with_timeout_per_step(config.timeout_per_step())
    }

    /// Sets the wall-clock budget per simulated step.
    pub fn with_timeout_per_step(mut self, timeout: Duration) -> Self {
        self.timeout_per_step = timeout;
        self
    }

    /// Wall-clock budget of a run on a house with `max_steps`.
    pub fn run_budget(&self, max_steps: usize) -> Duration {
        let steps = u32::try_from(max_steps.max(1)).unwrap_or(u32::MAX);
        self.timeout_per_step.saturating_mul(steps)
    }

    /// Runs every registered algorithm on every house.
    pub fn run(&self, houses: &[Arc<House>], registry: &AlgorithmRegistry) -> ScheduleReport {
        let started = Instant::now();
        let mut diagnostics = Vec::new();
        let (tasks, algorithms) = build_tasks(houses, registry, &mut diagnostics);

        let house_names = houses.iter().map(|house| house.name.clone()).collect();
        let table = Mutex::new(ResultTable::new(house_names, algorithms));
        let diagnostics = Mutex::new(diagnostics);

        let total = tasks.len();
        let queue = TaskQueue::new();
        for task in tasks {
            if queue.push(task).is_err() {
                error!("Task queue closed while filling");
            }
        }
        queue.close();

        let workers = self.num_threads.clamp(1, total.max(1));
        info!("Running {} tasks on {} workers", total, workers);

        thread::scope(|scope| {
            let mut spawned = 0;
            for id in 0..workers {
                let worker = thread::Builder::new()
                    .name(format!("worker-{id}"))
                    .spawn_scoped(scope, || self.work(&queue, &table, &diagnostics));
                match worker {
                    Ok(_) => spawned += 1,
                    Err(e) => error!("Failed to spawn worker {}: {}", id, e),
                }
            }
            if spawned == 0 {
                self.work(&queue, &table, &diagnostics);
            }
        });

        let report = ScheduleReport {
            table: table.into_inner().unwrap_or_else(PoisonError::into_inner),
            diagnostics: diagnostics.into_inner().unwrap_or_else(PoisonError::into_inner),
            elapsed: started.elapsed(),
        };
        info!(
            "Recorded {}/{} results in {:.2?} ({} diagnostics)",
            report.table.len(),
            total,
            report.elapsed,
            report.diagnostics.len()
        );
        report
    }

    fn work(&self, queue: &TaskQueue<Task>, table: &Mutex<ResultTable>, diagnostics: &Mutex<Vec<Diagnostic>>) {
        while let Some(task) = queue.pop_blocking_or_closed() {
            let house = task.house.name.clone();
            let algorithm = task.algorithm.clone();
            let key = task.key();

            let (outcome, problem) = self.execute(task);
            debug!("{}: {} score={} steps={}", key, outcome.status, outcome.score, outcome.steps_taken);

            let mut found: Vec<Diagnostic> = problem.into_iter().collect();
            if lock(table).insert(&house, &algorithm, outcome).is_err() {
                found.push(Diagnostic::new(
                    DiagnosticKind::DuplicateResult,
                    key,
                    "a result for this pair was already recorded",
                ));
            }
            for diagnostic in found {
                warn!("{}", diagnostic);
                lock(diagnostics).push(diagnostic);
            }
        }
    }

    /// Runs one task on a dedicated thread and waits at most its budget.
    fn execute(&self, task: Task) -> (RunOutcome, Option<Diagnostic>) {
        let key = task.key();
        let Task { house, instance, .. } = task;
        let budget = self.run_budget(house.max_steps);
        let cancel = CancelToken::with_budget(budget);
        let slot = Arc::new(RunSlot::default());

        let spawned = {
            let house = Arc::clone(&house);
            let cancel = cancel.clone();
            let slot = Arc::clone(&slot);
            thread::Builder::new()
                .name(format!("run-{key}"))
                .spawn(move || slot.complete(simulate(house, instance, &cancel)))
        };
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                let reason = format!("could not start run thread: {e}");
                return (
                    RunOutcome::abandoned(&house, RunStatus::Dead, reason.clone()),
                    Some(Diagnostic::new(DiagnosticKind::RuntimeInvariantViolation, key, reason)),
                );
            }
        };

        let completion = {
            let guard = lock(&slot.done);
            let (mut guard, _) = slot
                .signal
                .wait_timeout_while(guard, budget, |done| done.is_none())
                .unwrap_or_else(PoisonError::into_inner);
            guard.take()
        };

        let Some(completion) = completion else {
            cancel.cancel();
            drop(handle);
            let reason = format!("no result within {budget:?}, run cancelled");
            return (
                RunOutcome::abandoned(&house, RunStatus::TimedOut, reason.clone()),
                Some(Diagnostic::new(DiagnosticKind::TaskTimeout, key, reason)),
            );
        };
        if handle.join().is_err() {
            error!("{}: run thread failed after reporting", key);
        }

        match completion {
            Ok(outcome) => {
                let problem = if outcome.status == RunStatus::TimedOut {
                    Some(Diagnostic::new(
                        DiagnosticKind::TaskTimeout,
                        key,
                        format!("deadline of {budget:?} reached after {} steps", outcome.steps_taken),
                    ))
                } else {
                    outcome
                        .violation
                        .clone()
                        .map(|reason| Diagnostic::new(DiagnosticKind::RuntimeInvariantViolation, key, reason))
                };
                (outcome, problem)
            }
            Err(message) => {
                let reason = format!("algorithm panicked: {message}");
                (
                    RunOutcome::abandoned(&house, RunStatus::Dead, reason.clone()),
                    Some(Diagnostic::new(DiagnosticKind::AlgorithmPanic, key, reason)),
                )
            }
        }
    }
}

/// Builds one task per (algorithm, house).
///
/// An algorithm whose factory fails or panics for any house gets no tasks
/// at all and does not appear in the returned names.
fn build_tasks(
    houses: &[Arc<House>],
    registry: &AlgorithmRegistry,
    diagnostics: &mut Vec<Diagnostic>,
) -> (Vec<Task>, Vec<String>) {
    let mut tasks = Vec::new();
    let mut algorithms = Vec::new();

    for (name, factory) in registry.iter() {
        let instances: Result<Vec<_>, String> = houses
            .iter()
            .map(|_| match panic::catch_unwind(AssertUnwindSafe(|| factory())) {
                Ok(Ok(instance)) => Ok(instance),
                Ok(Err(e)) => Err(e.to_string()),
                Err(payload) => Err(format!("factory panicked: {}", panic_message(payload))),
            })
            .collect();

        match instances {
            Ok(instances) => {
                algorithms.push(name.to_string());
                tasks.extend(
                    houses
                        .iter()
                        .zip(instances)
                        .map(|(house, instance)| Task::new(Arc::clone(house), name, instance)),
                );
            }
            Err(reason) => {
                warn!("Excluding algorithm {}: {}", name, reason);
                diagnostics.push(Diagnostic::new(DiagnosticKind::AlgorithmFactoryFailure, name, reason));
            }
        }
    }
    (tasks, algorithms)
}

fn simulate(house: Arc<House>, instance: Box<dyn NavigationAlgorithm>, cancel: &CancelToken) -> Completion {
    panic::catch_unwind(AssertUnwindSafe(|| {
        let mut engine = SimulationEngine::new(house, instance);
        engine.run(cancel)
    }))
    .map_err(panic_message)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::timeout_penalty;
    use crate::error::AlgorithmError;
    use vacuum_core::GraphExplorer;
    use vacuum_env::{SensorSuite, Step};

    /// Never finishes and sleeps on every call.
    struct Sluggish {
        delay: Duration,
    }

    impl NavigationAlgorithm for Sluggish {
        fn set_max_steps(&mut self, _max_steps: usize) {}
        fn set_sensors(&mut self, _sensors: SensorSuite) {}
        fn next_step(&mut self) -> Step {
            thread::sleep(self.delay);
            Step::Stay
        }
    }

    struct Panicky;

    impl NavigationAlgorithm for Panicky {
        fn set_max_steps(&mut self, _max_steps: usize) {}
        fn set_sensors(&mut self, _sensors: SensorSuite) {}
        fn next_step(&mut self) -> Step {
            panic!("lost track of the dock");
        }
    }

    fn houses() -> Vec<Arc<House>> {
        vec![
            Arc::new(House::from_rows("corridor", 80, 20, &["D..3..2"]).unwrap()),
            Arc::new(House::from_rows("room", 120, 30, &["D12", "W 4", "9  "]).unwrap()),
            Arc::new(House::from_rows("tiny", 50, 20, &["D5 ", "   ", "   "]).unwrap()),
        ]
    }

    fn explorer_only() -> AlgorithmRegistry {
        let mut registry = AlgorithmRegistry::new();
        registry.register("graph_explorer", || {
            Ok(Box::new(GraphExplorer::new()) as Box<dyn NavigationAlgorithm>)
        });
        registry
    }

    fn generous(num_threads: usize) -> TaskScheduler {
        TaskScheduler::new(num_threads).with_timeout_per_step(Duration::from_millis(50))
    }

    #[test]
    fn test_every_pair_gets_a_result() {
        let houses = houses();
        let report = generous(4).run(&houses, &AlgorithmRegistry::with_builtin());

        assert_eq!(report.table.len(), 6);
        for house in &houses {
            for algorithm in ["graph_explorer", "graph_explorer_shuffled"] {
                assert!(report.table.get(&house.name, algorithm).is_some());
            }
        }
        assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
    }

    #[test]
    fn test_scores_match_across_thread_counts() {
        let houses = houses();
        let registry = explorer_only();
        let single = generous(1).run(&houses, &registry);
        let pooled = generous(8).run(&houses, &registry);

        for house in &houses {
            let a = single.table.get(&house.name, "graph_explorer").unwrap();
            let b = pooled.table.get(&house.name, "graph_explorer").unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_timeout_scores_penalty_without_hanging() {
        let house = Arc::new(House::from_rows("slow", 40, 100, &["D9"]).unwrap());
        let mut registry = AlgorithmRegistry::new();
        registry.register("sluggish", || {
            Ok(Box::new(Sluggish {
                delay: Duration::from_millis(5),
            }) as Box<dyn NavigationAlgorithm>)
        });

        let started = Instant::now();
        let report = TaskScheduler::new(2).run(&[Arc::clone(&house)], &registry);
        let elapsed = started.elapsed();

        let outcome = report.table.get("slow", "sluggish").unwrap();
        assert_eq!(outcome.status, RunStatus::TimedOut);
        assert_eq!(outcome.score, 2 * 40 + 9 * 300 + 2000);
        assert_eq!(outcome.score, timeout_penalty(&house));
        assert!(elapsed < Duration::from_millis(1000), "took {elapsed:?}");
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::TaskTimeout);
        assert_eq!(report.diagnostics[0].subject, "slow-sluggish");
    }

    #[test]
    fn test_stuck_algorithm_is_detached() {
        let house = Arc::new(House::from_rows("stuck", 10, 10, &["D1"]).unwrap());
        let mut registry = explorer_only();
        registry.register("stuck", || {
            Ok(Box::new(Sluggish {
                delay: Duration::from_secs(30),
            }) as Box<dyn NavigationAlgorithm>)
        });

        let started = Instant::now();
        let report = TaskScheduler::new(1)
            .with_timeout_per_step(Duration::from_millis(5))
            .run(&[house], &registry);

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(report.table.get("stuck", "stuck").unwrap().status, RunStatus::TimedOut);
        assert_eq!(
            report.table.get("stuck", "graph_explorer").unwrap().status,
            RunStatus::Finished
        );
    }

    #[test]
    fn test_panic_is_isolated() {
        let houses = houses();
        let mut registry = explorer_only();
        registry.register("panicky", || Ok(Box::new(Panicky) as Box<dyn NavigationAlgorithm>));

        let report = generous(3).run(&houses, &registry);

        assert_eq!(report.table.len(), 6);
        for house in &houses {
            let outcome = report.table.get(&house.name, "panicky").unwrap();
            assert_eq!(outcome.status, RunStatus::Dead);
            assert_eq!(outcome.score, house.max_steps as u64 + house.total_dirt() * 300 + 2000);
            assert_eq!(
                report.table.get(&house.name, "graph_explorer").unwrap().status,
                RunStatus::Finished
            );
        }
        let panics = report
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::AlgorithmPanic)
            .count();
        assert_eq!(panics, houses.len());
    }

    #[test]
    fn test_factory_failure_excludes_algorithm() {
        let houses = houses();
        let mut registry = explorer_only();
        registry.register("broken", || Err(AlgorithmError::factory("missing weights")));
        registry.register("exploding", || -> Result<Box<dyn NavigationAlgorithm>, AlgorithmError> {
            panic!("constructor blew up")
        });

        let report = generous(2).run(&houses, &registry);

        assert_eq!(report.table.algorithms(), &["graph_explorer".to_string()]);
        assert_eq!(report.table.len(), houses.len());
        let failures: Vec<&str> = report
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::AlgorithmFactoryFailure)
            .map(|d| d.subject.as_str())
            .collect();
        assert_eq!(failures, vec!["broken", "exploding"]);
    }

    #[test]
    fn test_no_tasks() {
        let report = TaskScheduler::default().run(&[], &AlgorithmRegistry::with_builtin());
        assert!(report.table.is_empty());
        assert_eq!(report.table.algorithms().len(), 2);
    }

    #[test]
    fn test_run_budget_scales_with_steps() {
        let scheduler = TaskScheduler::new(1).with_timeout_per_step(Duration::from_millis(2));
        assert_eq!(scheduler.run_budget(50), Duration::from_millis(100));
        assert_eq!(scheduler.run_budget(0), Duration::from_millis(2));
    }
}
