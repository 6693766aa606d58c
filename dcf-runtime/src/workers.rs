use std::thread::JoinHandle;

use dcf_vdom::{PropDiffJob, PropDiffOutcome, PropOffload, diff_json_keys};

/// Pure prop-comparison workers.
///
/// Jobs carry plain JSON snapshots, never VDOM state, so workers have
/// no side effects and results are identical to diffing inline on the
/// render thread. The pool only pays off for wide child lists; the
/// engine gates usage behind the configured subtree threshold.
pub struct WorkerPool {
    job_tx: Option<flume::Sender<PropDiffJob>>,
    result_rx: flume::Receiver<PropDiffOutcome>,
    threads: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let (job_tx, job_rx) = flume::unbounded::<PropDiffJob>();
        let (result_tx, result_rx) = flume::unbounded();

        let threads = (0..size.max(1))
            .map(|n| {
                let jobs = job_rx.clone();
                let results = result_tx.clone();
                std::thread::Builder::new()
                    .name(format!("dcf-diff-{n}"))
                    .spawn(move || {
                        while let Ok(job) = jobs.recv() {
                            let changed = diff_json_keys(&job.old, &job.new);
                            let outcome = PropDiffOutcome {
                                index: job.index,
                                changed,
                            };
                            if results.send(outcome).is_err() {
                                break;
                            }
                        }
                    })
                    .expect("spawning a worker thread")
            })
            .collect();

        Self {
            job_tx: Some(job_tx),
            result_rx,
            threads,
        }
    }

    pub fn size(&self) -> usize {
        self.threads.len()
    }
}

impl PropOffload for WorkerPool {
    fn diff(&self, jobs: Vec<PropDiffJob>) -> Vec<PropDiffOutcome> {
        let expected = jobs.len();
        let Some(tx) = &self.job_tx else { return Vec::new() };

        for job in jobs {
            if tx.send(job).is_err() {
                return Vec::new();
            }
        }

        // Scatter-gather: the engine is single threaded, so every
        // outcome on the channel belongs to this call
        let mut outcomes = Vec::with_capacity(expected);
        while outcomes.len() < expected {
            match self.result_rx.recv() {
                Ok(outcome) => outcomes.push(outcome),
                Err(_) => break,
            }
        }
        outcomes
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the job channel stops the workers
        self.job_tx.take();
        for thread in self.threads.drain(..) {
            let _ = thread.join();
        }
    }
}
