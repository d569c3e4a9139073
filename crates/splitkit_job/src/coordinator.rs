//! Bounded-pool execution of independent write tasks.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use splitkit_io_xlsx::{NoopObserver, ObserveStep, SpecXlsxWriteOptions, StepTimer, write_dataset_file};

use crate::probe::{MemoryGovernor, MemoryProbe, NoopMemoryProbe};
use crate::report::ReportJobBuilder;
use crate::spec::{EnumJobWarning, EnumTaskState, SpecTaskOutcome, SpecWriteTask};
use crate::util::{calculate_worker_limit, format_duration_short};

/// Progress callback receiving `(completed, total)` after each finished task.
pub type ProgressFn<'a> = dyn Fn(usize, usize) + Send + Sync + 'a;

/// State listener receiving `(task index, label, new state)` on each transition.
pub type TaskStateFn<'a> = dyn Fn(usize, &str, EnumTaskState) + Send + Sync + 'a;

/// Shared flag stopping admission of further batches.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Running tasks finish; pending ones are skipped.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Pool and back-pressure settings.
#[derive(Debug, Clone)]
pub struct SpecCoordinatorOptions {
    /// Requested pool size, clamped to available parallelism.
    pub max_workers: usize,
    /// Advisory resident-memory limit in MiB; 0 disables the governor.
    pub memory_limit_mb: u64,
    /// Longest admission stall per batch.
    pub timeout_memory_stall: Duration,
    /// Writer options applied to every task.
    pub write_options: SpecXlsxWriteOptions,
}

impl Default for SpecCoordinatorOptions {
    fn default() -> Self {
        Self {
            max_workers: 4,
            memory_limit_mb: 512,
            timeout_memory_stall: Duration::from_secs(10),
            write_options: SpecXlsxWriteOptions::default(),
        }
    }
}

/// Outcomes in task order plus coordinator-level warnings.
#[derive(Debug, Clone, Default)]
pub struct SpecCoordinatorOutcome {
    /// One outcome per submitted task, in submission order.
    pub l_outcomes: Vec<SpecTaskOutcome>,
    /// Pool fallback, memory stalls and cancellation.
    pub warnings: Vec<EnumJobWarning>,
}

impl SpecCoordinatorOutcome {
    /// Number of tasks in `state`.
    pub fn count_state(&self, state: EnumTaskState) -> usize {
        self.l_outcomes.iter().filter(|o| o.state == state).count()
    }

    /// Fold outcomes into a job report.
    pub fn apply_to(self, builder: &mut ReportJobBuilder) {
        builder.extend_warnings(self.warnings);
        for outcome in self.l_outcomes {
            match outcome.state {
                EnumTaskState::Succeeded => {
                    let n_rows = outcome.report.as_ref().map(|r| r.n_rows).unwrap_or(0);
                    if let Some(report) = outcome.report {
                        for c_warning in report.warnings {
                            builder.add_warning(EnumJobWarning::Writer {
                                label: outcome.label.clone(),
                                message: c_warning,
                            });
                        }
                    }
                    builder.add_written(outcome.path_file_out, n_rows);
                }
                EnumTaskState::Failed => builder.add_error(
                    outcome.label,
                    outcome.path_file_out,
                    outcome.error.unwrap_or_default(),
                ),
                EnumTaskState::Pending | EnumTaskState::Running => builder.add_skipped(),
            }
        }
    }
}

/// Runs write tasks over a bounded rayon pool.
///
/// Tasks are admitted in batches of the pool size. Before each batch the
/// memory governor may stall admission, and a cancelled token stops it.
/// Each task writes with its own writer and style registry; failures and
/// panics stay inside the task.
pub struct Coordinator<'a> {
    options: SpecCoordinatorOptions,
    observer: &'a dyn ObserveStep,
    probe: &'a dyn MemoryProbe,
    progress: Option<&'a ProgressFn<'a>>,
    state_listener: Option<&'a TaskStateFn<'a>>,
    cancel_token: CancelToken,
}

impl<'a> Coordinator<'a> {
    /// Coordinator without memory probe, progress callback or cancellation.
    pub fn new(options: SpecCoordinatorOptions) -> Self {
        Self {
            options,
            observer: &NoopObserver,
            probe: &NoopMemoryProbe,
            progress: None,
            state_listener: None,
            cancel_token: CancelToken::new(),
        }
    }

    /// Report step timings to `observer`.
    pub fn with_observer(mut self, observer: &'a dyn ObserveStep) -> Self {
        self.observer = observer;
        self
    }

    /// Use `probe` for memory back-pressure.
    pub fn with_probe(mut self, probe: &'a dyn MemoryProbe) -> Self {
        self.probe = probe;
        self
    }

    /// Call `progress(completed, total)` after each finished task.
    pub fn with_progress(mut self, progress: &'a ProgressFn<'a>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Notify `state_listener` when a task starts running and when it finishes.
    pub fn with_state_listener(mut self, state_listener: &'a TaskStateFn<'a>) -> Self {
        self.state_listener = Some(state_listener);
        self
    }

    /// Stop admitting batches once `cancel_token` is cancelled.
    pub fn with_cancel_token(mut self, cancel_token: CancelToken) -> Self {
        self.cancel_token = cancel_token;
        self
    }

    /// Execute every task and collect outcomes in submission order.
    pub fn run(&self, l_tasks: Vec<SpecWriteTask>) -> SpecCoordinatorOutcome {
        let n_total = l_tasks.len();
        let mut outcome = SpecCoordinatorOutcome::default();
        if n_total == 0 {
            return outcome;
        }

        let n_workers = calculate_worker_limit(Some(self.options.max_workers));
        let thread_pool = if n_workers > 1 {
            match ThreadPoolBuilder::new().num_threads(n_workers).build() {
                Ok(pool) => Some(pool),
                Err(err) => {
                    let c_msg = format!(
                        "Failed to initialize thread pool (workers={n_workers}); fallback to serial write ({err})."
                    );
                    log::warn!("{c_msg}");
                    outcome.warnings.push(EnumJobWarning::PoolFallback(c_msg));
                    None
                }
            }
        } else {
            None
        };
        log::info!("Writing {n_total} output(s) with {n_workers} worker(s)");

        let governor = MemoryGovernor::new(self.probe, self.options.memory_limit_mb).with_timing(
            self.options.timeout_memory_stall,
            Duration::from_millis(200),
        );
        let ctx = SpecRunContext {
            n_total,
            n_completed: AtomicUsize::new(0),
            l_results: Mutex::new(Vec::with_capacity(n_total)),
            l_states: Mutex::new(vec![EnumTaskState::Pending; n_total]),
            t_start: Instant::now(),
        };

        let mut iter_tasks = l_tasks.into_iter().enumerate().peekable();
        while iter_tasks.peek().is_some() {
            if self.cancel_token.is_cancelled() {
                let l_pending: Vec<(usize, SpecTaskOutcome)> = iter_tasks
                    .by_ref()
                    .map(|(n_idx, task)| (n_idx, derive_pending_outcome(task)))
                    .collect();
                log::warn!("Cancelled; {} task(s) not started", l_pending.len());
                outcome.warnings.push(EnumJobWarning::Cancelled {
                    n_tasks: l_pending.len(),
                });
                lock_results(&ctx.l_results).extend(l_pending);
                break;
            }
            if let Some(warning) = governor.wait_for_admission() {
                outcome.warnings.push(warning);
            }

            let l_batch: Vec<(usize, SpecWriteTask)> = iter_tasks.by_ref().take(n_workers).collect();
            match &thread_pool {
                Some(pool) => pool.install(|| {
                    l_batch
                        .into_par_iter()
                        .for_each(|(n_idx, task)| self.execute_task(n_idx, task, &ctx));
                }),
                None => {
                    for (n_idx, task) in l_batch {
                        self.execute_task(n_idx, task, &ctx);
                    }
                }
            }
        }

        let mut l_results = match ctx.l_results.into_inner() {
            Ok(v) => v,
            Err(poisoned) => poisoned.into_inner(),
        };
        l_results.sort_by_key(|(n_idx, _)| *n_idx);
        outcome.l_outcomes = l_results.into_iter().map(|(_, o)| o).collect();
        outcome
    }

    fn execute_task(&self, n_idx: usize, task: SpecWriteTask, ctx: &SpecRunContext) {
        log::debug!("Task {} -> {} running", task.label, task.path_file_out.display());
        self.advance_state(ctx, n_idx, &task.label, EnumTaskState::Running);
        let t_start = Instant::now();
        let timer = StepTimer::start("write_output", self.observer);
        let res_write = catch_unwind(AssertUnwindSafe(|| {
            write_dataset_file(
                &task.dataset,
                &task.style_source,
                &task.path_file_out,
                &self.options.write_options,
                self.observer,
            )
        }));
        timer.finish(&task.label);

        let (state, report, error) = match res_write {
            Ok(Ok(report)) => (EnumTaskState::Succeeded, Some(report), None),
            Ok(Err(err)) => (EnumTaskState::Failed, None, Some(err.to_string())),
            Err(payload) => (
                EnumTaskState::Failed,
                None,
                Some(format!("writer panicked: {}", derive_panic_text(payload.as_ref()))),
            ),
        };
        if let Some(c_error) = &error {
            log::error!("Output {} failed: {c_error}", task.path_file_out.display());
        }
        self.advance_state(ctx, n_idx, &task.label, state);

        let outcome = SpecTaskOutcome {
            label: task.label,
            path_file_out: task.path_file_out,
            state,
            report,
            error,
            elapsed: t_start.elapsed(),
        };
        lock_results(&ctx.l_results).push((n_idx, outcome));

        let n_completed = ctx.n_completed.fetch_add(1, Ordering::SeqCst) + 1;
        self.report_progress(n_completed, ctx);
    }

    fn advance_state(&self, ctx: &SpecRunContext, n_idx: usize, label: &str, next: EnumTaskState) {
        {
            let mut l_states = match ctx.l_states.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let Some(current) = l_states.get_mut(n_idx) else {
                return;
            };
            if !current.can_advance_to(next) {
                log::warn!("Task {label}: ignored transition {current:?} -> {next:?}");
                return;
            }
            *current = next;
        }
        if let Some(state_listener) = self.state_listener {
            state_listener(n_idx, label, next);
        }
    }

    fn report_progress(&self, n_completed: usize, ctx: &SpecRunContext) {
        if let Some(progress) = self.progress {
            progress(n_completed, ctx.n_total);
        }
        let elapsed = ctx.t_start.elapsed();
        let n_remaining = ctx.n_total.saturating_sub(n_completed);
        let eta = elapsed.mul_f64(n_remaining as f64 / n_completed.max(1) as f64);
        log::info!(
            "Progress {n_completed}/{} ({:.1}%) elapsed {} eta {}",
            ctx.n_total,
            n_completed as f64 * 100.0 / ctx.n_total as f64,
            format_duration_short(elapsed),
            format_duration_short(eta)
        );
    }
}

struct SpecRunContext {
    n_total: usize,
    n_completed: AtomicUsize,
    l_results: Mutex<Vec<(usize, SpecTaskOutcome)>>,
    l_states: Mutex<Vec<EnumTaskState>>,
    t_start: Instant,
}

fn lock_results(
    l_results: &Mutex<Vec<(usize, SpecTaskOutcome)>>,
) -> std::sync::MutexGuard<'_, Vec<(usize, SpecTaskOutcome)>> {
    match l_results.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn derive_pending_outcome(task: SpecWriteTask) -> SpecTaskOutcome {
    SpecTaskOutcome {
        label: task.label,
        path_file_out: task.path_file_out,
        state: EnumTaskState::Pending,
        report: None,
        error: None,
        elapsed: Duration::ZERO,
    }
}

fn derive_panic_text(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(c_msg) = payload.downcast_ref::<&str>() {
        return (*c_msg).to_string();
    }
    if let Some(c_msg) = payload.downcast_ref::<String>() {
        return c_msg.clone();
    }
    "unknown panic".to_string()
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use splitkit_io_xlsx::{Dataset, EnumCellValue, StyleSource, WorkbookModel};
    use tempfile::tempdir;

    use super::{CancelToken, Coordinator, SpecCoordinatorOptions};
    use crate::probe::MemoryProbe;
    use crate::report::ReportJobBuilder;
    use crate::spec::{EnumJobWarning, EnumTaskState, SpecWriteTask};

    fn make_tasks(path_dir: &Path, n_tasks: usize) -> Vec<SpecWriteTask> {
        let style_source: StyleSource = Arc::new(WorkbookModel {
            sheet_name: "Data".to_string(),
            columns: vec!["K".to_string()],
            ..Default::default()
        });
        (0..n_tasks)
            .map(|i| SpecWriteTask {
                label: format!("t{i}"),
                path_file_out: path_dir.join(format!("t{i}.xlsx")),
                dataset: Dataset {
                    columns: vec!["K".to_string()],
                    rows: vec![vec![EnumCellValue::Number(i as f64)]],
                },
                style_source: style_source.clone(),
            })
            .collect()
    }

    struct HighMemoryProbe;

    impl MemoryProbe for HighMemoryProbe {
        fn resident_bytes(&self) -> Option<u64> {
            Some(4096 * 1024 * 1024)
        }
    }

    #[test]
    fn test_run_writes_all_tasks_in_order_with_progress() {
        let dir = tempdir().unwrap();
        let l_progress = Mutex::new(Vec::new());
        let progress = |n_done: usize, n_total: usize| l_progress.lock().unwrap().push((n_done, n_total));
        let options = SpecCoordinatorOptions {
            max_workers: 3,
            ..Default::default()
        };

        let outcome = Coordinator::new(options)
            .with_progress(&progress)
            .run(make_tasks(dir.path(), 5));

        let l_labels: Vec<&str> = outcome.l_outcomes.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(l_labels, vec!["t0", "t1", "t2", "t3", "t4"]);
        assert_eq!(outcome.count_state(EnumTaskState::Succeeded), 5);
        for o in &outcome.l_outcomes {
            assert!(o.path_file_out.exists());
        }
        let l_progress = l_progress.into_inner().unwrap();
        assert_eq!(l_progress.len(), 5);
        assert!(l_progress.contains(&(5, 5)));
    }

    #[test]
    fn test_tasks_pass_through_running_before_terminal_state() {
        let dir = tempdir().unwrap();
        let mut l_tasks = make_tasks(dir.path(), 3);
        l_tasks[2].path_file_out = dir.path().join("missing").join("t2.xlsx");
        let l_events = Mutex::new(Vec::new());
        let listener = |n_idx: usize, label: &str, state: EnumTaskState| {
            l_events.lock().unwrap().push((n_idx, label.to_string(), state));
        };

        let outcome = Coordinator::new(SpecCoordinatorOptions::default())
            .with_state_listener(&listener)
            .run(l_tasks);
        assert_eq!(outcome.count_state(EnumTaskState::Running), 0);

        let l_events = l_events.into_inner().unwrap();
        assert_eq!(l_events.len(), 6);
        for n_idx in 0..3 {
            let l_states: Vec<EnumTaskState> = l_events
                .iter()
                .filter(|(i, _, _)| *i == n_idx)
                .map(|(_, _, state)| *state)
                .collect();
            assert_eq!(l_states[0], EnumTaskState::Running);
            assert_eq!(l_states[1], outcome.l_outcomes[n_idx].state);
        }
        assert_eq!(outcome.l_outcomes[2].state, EnumTaskState::Failed);
    }

    #[test]
    fn test_failed_task_does_not_abort_siblings() {
        let dir = tempdir().unwrap();
        let mut l_tasks = make_tasks(dir.path(), 3);
        l_tasks[1].path_file_out = dir.path().join("missing").join("t1.xlsx");

        let outcome = Coordinator::new(SpecCoordinatorOptions::default()).run(l_tasks);
        assert_eq!(outcome.count_state(EnumTaskState::Succeeded), 2);
        assert_eq!(outcome.l_outcomes[1].state, EnumTaskState::Failed);
        assert!(outcome.l_outcomes[1].error.is_some());

        let mut builder = ReportJobBuilder::default();
        builder.add_planned(3);
        outcome.apply_to(&mut builder);
        let report = builder.build();
        assert_eq!(report.cnt_outputs_written, 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].label, "t1");
    }

    #[test]
    fn test_cancelled_token_leaves_tasks_pending() {
        let dir = tempdir().unwrap();
        let cancel_token = CancelToken::new();
        cancel_token.cancel();

        let outcome = Coordinator::new(SpecCoordinatorOptions::default())
            .with_cancel_token(cancel_token)
            .run(make_tasks(dir.path(), 2));
        assert_eq!(outcome.count_state(EnumTaskState::Pending), 2);
        assert_eq!(outcome.warnings, vec![EnumJobWarning::Cancelled { n_tasks: 2 }]);
        assert!(!dir.path().join("t0.xlsx").exists());
    }

    #[test]
    fn test_memory_pressure_stalls_but_still_runs() {
        let dir = tempdir().unwrap();
        let options = SpecCoordinatorOptions {
            max_workers: 1,
            memory_limit_mb: 1,
            timeout_memory_stall: Duration::ZERO,
            ..Default::default()
        };
        let n_calls = AtomicUsize::new(0);
        let progress = |_: usize, _: usize| {
            n_calls.fetch_add(1, Ordering::SeqCst);
        };

        let outcome = Coordinator::new(options)
            .with_probe(&HighMemoryProbe)
            .with_progress(&progress)
            .run(make_tasks(dir.path(), 2));
        assert_eq!(outcome.count_state(EnumTaskState::Succeeded), 2);
        assert_eq!(n_calls.load(Ordering::SeqCst), 2);
        let n_stalls = outcome
            .warnings
            .iter()
            .filter(|w| matches!(w, EnumJobWarning::MemoryStall { .. }))
            .count();
        assert_eq!(n_stalls, 2);
    }
}
