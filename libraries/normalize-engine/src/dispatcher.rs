/// Bounded worker pool running normalization jobs
use crate::config::NormalizeConfig;
use crate::error::{NormalizeError, Result};
use crate::job::{JobOutcome, NormalizationJob};
use crate::scratch::ScratchDir;
use crate::transcoder::Transcoder;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Terminal report for one enqueued path
#[derive(Debug)]
pub struct JobReport {
    /// Position of the path in the submitted batch
    pub index: usize,
    pub path: PathBuf,
    pub result: Result<JobOutcome>,
}

impl JobReport {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Counts collected once every job has reported
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub normalized: usize,
    pub skipped: usize,
    /// Failed paths with their error message
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn completed(&self) -> usize {
        self.normalized + self.skipped + self.failed.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    fn record(&mut self, report: &JobReport) {
        match &report.result {
            Ok(JobOutcome::Normalized { .. }) => self.normalized += 1,
            Ok(JobOutcome::Skipped(_)) => self.skipped += 1,
            Err(e) => self.failed.push((report.path.clone(), e.to_string())),
        }
    }
}

/// What a worker is handed at spawn time
struct WorkerContext {
    config: Arc<NormalizeConfig>,
    transcoder: Arc<dyn Transcoder>,
    scratch_dir: PathBuf,
}

type JobQueue = Arc<Mutex<mpsc::UnboundedReceiver<(usize, PathBuf)>>>;

pub struct Dispatcher {
    config: Arc<NormalizeConfig>,
    transcoder: Arc<dyn Transcoder>,
}

impl Dispatcher {
    pub fn new(config: NormalizeConfig, transcoder: Arc<dyn Transcoder>) -> Self {
        Self {
            config: Arc::new(config),
            transcoder,
        }
    }

    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    /// Normalize every path, each exactly once, and wait for all of them
    ///
    /// `on_report` is called on the caller's task once per path in completion
    /// order. Per-file failures are reported there and in the summary; they
    /// never stop the batch.
    pub async fn run<F>(&self, paths: Vec<PathBuf>, mut on_report: F) -> BatchSummary
    where
        F: FnMut(&JobReport),
    {
        let total = paths.len();
        let mut summary = BatchSummary {
            total,
            ..BatchSummary::default()
        };
        if total == 0 {
            return summary;
        }

        let scratch = ScratchDir::create(self.config.scratch_root());
        let context = Arc::new(WorkerContext {
            config: Arc::clone(&self.config),
            transcoder: Arc::clone(&self.transcoder),
            scratch_dir: scratch.path().to_path_buf(),
        });

        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let queue: JobQueue = Arc::new(Mutex::new(queue_rx));
        let (report_tx, mut report_rx) = mpsc::unbounded_channel();

        let workers = self.config.workers().min(total);
        tracing::info!("Normalizing {} files with {} workers", total, workers);

        for worker_id in 0..workers {
            let queue = Arc::clone(&queue);
            let reports = report_tx.clone();
            let context = Arc::clone(&context);
            tokio::spawn(async move {
                worker_loop(worker_id, queue, reports, context).await;
            });
        }
        drop(report_tx);

        let mut enqueued = Vec::with_capacity(total);
        for (index, path) in paths.into_iter().enumerate() {
            enqueued.push(path.clone());
            if queue_tx.send((index, path)).is_err() {
                break;
            }
        }
        // Workers exit once the queue is drained
        drop(queue_tx);

        // Completion barrier: one report per enqueued path
        let mut reported = vec![false; total];
        let mut outstanding = total;
        while outstanding > 0 {
            let Some(report) = report_rx.recv().await else {
                break;
            };
            if let Some(seen) = reported.get_mut(report.index) {
                *seen = true;
            }
            outstanding -= 1;
            summary.record(&report);
            on_report(&report);
        }

        // Only reachable if every worker died without reporting
        for (index, path) in enqueued.into_iter().enumerate() {
            if !reported[index] {
                let report = JobReport {
                    index,
                    path,
                    result: Err(NormalizeError::Task("worker exited before processing".into())),
                };
                summary.record(&report);
                on_report(&report);
            }
        }

        tracing::info!(
            "Batch finished: {} normalized, {} skipped, {} failed",
            summary.normalized,
            summary.skipped,
            summary.failed.len()
        );

        drop(scratch);
        summary
    }
}

/// Worker loop - takes one path at a time until the queue is closed and empty
async fn worker_loop(
    worker_id: usize,
    queue: JobQueue,
    reports: mpsc::UnboundedSender<JobReport>,
    context: Arc<WorkerContext>,
) {
    tracing::debug!("Normalization worker {} started", worker_id);

    loop {
        let next = {
            let mut queue = queue.lock().await;
            queue.recv().await
        };
        let Some((index, path)) = next else {
            break;
        };

        tracing::debug!("Worker {} processing {}", worker_id, path.display());
        let result = run_isolated(index, &path, &context).await;

        match &result {
            Ok(outcome) => tracing::debug!("Worker {} {}: {}", worker_id, path.display(), outcome),
            Err(e) => tracing::error!("Worker {} failed on {}: {}", worker_id, path.display(), e),
        }

        if reports.send(JobReport { index, path, result }).is_err() {
            break;
        }
    }

    tracing::debug!("Normalization worker {} stopped", worker_id);
}

/// Run a job on its own task so a panic becomes an error report
async fn run_isolated(index: usize, path: &Path, context: &Arc<WorkerContext>) -> Result<JobOutcome> {
    let job = NormalizationJob::new(
        index,
        path,
        &context.scratch_dir,
        context.config.resolver(),
    )?;
    let transcoder = Arc::clone(&context.transcoder);

    tokio::spawn(async move { job.run(transcoder.as_ref()).await }).await?
}
