use anyhow::{Result, anyhow};
use crossbeam::channel::{Receiver, Sender, bounded};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Worker pool that processes items concurrently and hands results back in
/// the order the items were supplied.
pub struct ParallelExecutor {
    max_workers: usize,
    buffer_size: usize,
}

/// Context for worker threads to avoid too many function parameters
struct WorkerContext<'a, T, R, F, P> {
    worker_id: usize,
    work_rx: Receiver<(usize, T)>,
    result_tx: Sender<(usize, R)>,
    progress_counter: &'a AtomicUsize,
    total_items: usize,
    processor: &'a F,
    progress_reporter: Option<&'a P>,
}

impl ParallelExecutor {
    pub fn new(max_workers: usize) -> Self {
        let max_workers = max_workers.max(1);
        Self {
            max_workers,
            buffer_size: max_workers * 2,
        }
    }

    /// Execute work items on a producer/worker/collector pipeline.
    ///
    /// Every item is tagged with its position before dispatch; the collector
    /// sorts on that tag, so completion order never leaks into the result.
    pub fn execute<T, R, F, P>(
        &self,
        work_items: Vec<T>,
        processor: F,
        progress_reporter: Option<P>,
    ) -> Result<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn(&T, usize) -> R + Sync, // (item, worker_id)
        P: Fn(usize, usize, usize) + Sync, // (current, total, worker_id)
    {
        if work_items.is_empty() {
            return Ok(Vec::new());
        }

        let total_items = work_items.len();
        let actual_workers = std::cmp::min(self.max_workers, total_items);
        let (work_tx, work_rx): (Sender<(usize, T)>, Receiver<(usize, T)>) =
            bounded(self.buffer_size);
        let (result_tx, result_rx): (Sender<(usize, R)>, Receiver<(usize, R)>) =
            bounded(self.buffer_size);

        let progress_counter = AtomicUsize::new(0);

        let mut indexed = crossbeam::thread::scope(|s| {
            for worker_id in 0..actual_workers {
                let ctx = WorkerContext {
                    worker_id,
                    work_rx: work_rx.clone(),
                    result_tx: result_tx.clone(),
                    progress_counter: &progress_counter,
                    total_items,
                    processor: &processor,
                    progress_reporter: progress_reporter.as_ref(),
                };

                s.spawn(move |_| Self::worker_thread(ctx));
            }

            // Producer thread: send work to workers
            s.spawn(move |_| {
                for indexed_item in work_items.into_iter().enumerate() {
                    if work_tx.send(indexed_item).is_err() {
                        break; // Workers dropped
                    }
                }
            });

            // Drop our handles so the channels close once workers finish
            drop(work_rx);
            drop(result_tx);

            result_rx.iter().collect::<Vec<(usize, R)>>()
        })
        .map_err(|_| anyhow!("Thread panic occurred during parallel execution"))?;

        if indexed.len() != total_items {
            return Err(anyhow!(
                "Parallel execution returned {} of {} results",
                indexed.len(),
                total_items
            ));
        }

        indexed.sort_by_key(|(index, _)| *index);
        Ok(indexed.into_iter().map(|(_, result)| result).collect())
    }

    fn worker_thread<T, R, F, P>(ctx: WorkerContext<'_, T, R, F, P>)
    where
        F: Fn(&T, usize) -> R,
        P: Fn(usize, usize, usize),
    {
        while let Ok((index, work_item)) = ctx.work_rx.recv() {
            let result = (ctx.processor)(&work_item, ctx.worker_id);

            if ctx.result_tx.send((index, result)).is_err() {
                break; // Receiver dropped
            }

            let current = ctx.progress_counter.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(reporter) = ctx.progress_reporter {
                reporter(current, ctx.total_items, ctx.worker_id);
            }
        }
    }
}

/// Strict one-at-a-time processing in input order
pub struct SequentialExecutor;

impl SequentialExecutor {
    pub fn execute<T, R, F, P>(
        work_items: Vec<T>,
        processor: F,
        progress_reporter: Option<P>,
    ) -> Vec<R>
    where
        F: Fn(&T, usize) -> R,
        P: Fn(usize, usize, usize),
    {
        let total_items = work_items.len();
        let mut results = Vec::with_capacity(total_items);

        for (index, work_item) in work_items.iter().enumerate() {
            results.push(processor(work_item, 0)); // Sequential uses worker_id 0

            if let Some(reporter) = &progress_reporter {
                reporter(index + 1, total_items, 0);
            }
        }

        results
    }
}

/// Execution strategy enum for choosing between parallel and sequential
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStrategy {
    Sequential,
    Parallel { workers: usize },
}

impl ExecutionStrategy {
    pub fn execute<T, R, F, P>(
        &self,
        work_items: Vec<T>,
        processor: F,
        progress_reporter: Option<P>,
    ) -> Result<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn(&T, usize) -> R + Sync,
        P: Fn(usize, usize, usize) + Sync,
    {
        match self {
            ExecutionStrategy::Sequential => Ok(SequentialExecutor::execute(
                work_items,
                processor,
                progress_reporter,
            )),
            ExecutionStrategy::Parallel { workers } => {
                ParallelExecutor::new(*workers).execute(work_items, processor, progress_reporter)
            }
        }
    }

    /// Threshold decision between sequential and parallel execution.
    ///
    /// The caller supplies the worker count; this only compares the workload
    /// against `min_items_for_parallel`.
    ///
    /// ```rust
    /// use icpsr_filter::parallel::ExecutionStrategy;
    ///
    /// let strategy = ExecutionStrategy::auto(2, 4, 8);
    /// assert!(matches!(strategy, ExecutionStrategy::Sequential));
    ///
    /// let strategy = ExecutionStrategy::auto(12, 4, 8);
    /// assert!(matches!(strategy, ExecutionStrategy::Parallel { workers: 8 }));
    /// ```
    pub fn auto(
        work_items_count: usize,
        min_items_for_parallel: usize,
        optimal_workers: usize,
    ) -> Self {
        if work_items_count >= min_items_for_parallel && optimal_workers > 1 {
            ExecutionStrategy::Parallel {
                workers: optimal_workers,
            }
        } else {
            ExecutionStrategy::Sequential
        }
    }

    /// Maximum workers allowed by the machine and the configured limits.
    ///
    /// `cores * thread_percentage / 100`, capped by `max_threads_config` when
    /// it is non-zero, never below one.
    pub fn calculate_optimal_workers(max_threads_config: usize, thread_percentage: u8) -> usize {
        let available_cores = num_cpus::get();

        let workers_by_percentage =
            std::cmp::max(1, (available_cores * thread_percentage as usize) / 100);

        if max_threads_config > 0 {
            std::cmp::min(max_threads_config, workers_by_percentage)
        } else {
            workers_by_percentage
        }
    }
}
