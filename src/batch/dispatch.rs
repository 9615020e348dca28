//! Bounded worker pool for per-file jobs.
//!
//! Every item becomes one task on a fixed-size rayon pool. Tasks report
//! back over a channel; the calling thread drains it while the pool works,
//! so counters and observers are only ever touched from that thread, in
//! completion order.

use std::fmt::Display;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc;

use log::error;

use super::RunResult;
use super::progress::{ProgressInfo, ProgressObserver};
use crate::error::{PrepError, Result};

/// Run `worker` over every item on `concurrency` threads.
///
/// `worker` returns whether the item succeeded. A panicking worker counts
/// as a failure for its item only.
pub fn dispatch<T, F>(
    items: &[T],
    concurrency: usize,
    observer: &dyn ProgressObserver,
    worker: F,
) -> Result<RunResult>
where
    T: Display + Sync,
    F: Fn(&T) -> bool + Sync,
{
    let total = items.len();
    let mut result = RunResult::default();
    observer.on_start(total);

    if total == 0 {
        observer.on_finish(&result);
        return Ok(result);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(concurrency.max(1))
        .thread_name(|i| format!("voiceprep-worker-{}", i))
        .build()
        .map_err(|e| PrepError::Config(format!("cannot start worker pool: {}", e)))?;

    let (tx, rx) = mpsc::channel::<(usize, bool)>();
    let worker = &worker;

    pool.in_place_scope(|scope| {
        for (index, item) in items.iter().enumerate() {
            let tx = tx.clone();
            scope.spawn(move |_| {
                let ok = catch_unwind(AssertUnwindSafe(|| worker(item))).unwrap_or_else(|_| {
                    error!("Worker panicked while processing {}", item);
                    false
                });
                // The receiver lives until every sender is gone
                let _ = tx.send((index, ok));
            });
        }
        drop(tx);

        for (done, (index, ok)) in rx.iter().enumerate() {
            result.record(ok);
            let label = items[index].to_string();
            observer.on_progress_update(&ProgressInfo {
                done: done + 1,
                total,
                current: &label,
                succeeded: ok,
                result,
            });
        }
    });

    observer.on_finish(&result);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::progress::SilentObserver;
    use parking_lot::Mutex;

    struct Recorder(Mutex<Vec<(usize, bool)>>);

    impl ProgressObserver for Recorder {
        fn on_progress_update(&self, progress: &ProgressInfo<'_>) {
            self.0.lock().push((progress.done, progress.succeeded));
        }
    }

    #[test]
    fn counts_successes_and_failures() {
        let items: Vec<u32> = (0..20).collect();
        let result = dispatch(&items, 4, &SilentObserver, |n| n % 5 != 0).unwrap();
        assert_eq!(result, RunResult { succeeded: 16, failed: 4 });
    }

    #[test]
    fn panicking_item_is_a_failure() {
        let items = vec![1, 2, 3];
        let result = dispatch(&items, 2, &SilentObserver, |n| {
            if *n == 2 {
                panic!("boom");
            }
            true
        })
        .unwrap();
        assert_eq!(result, RunResult { succeeded: 2, failed: 1 });
    }

    #[test]
    fn observer_sees_every_item_once() {
        let items: Vec<u32> = (0..10).collect();
        let recorder = Recorder(Mutex::new(Vec::new()));
        dispatch(&items, 3, &recorder, |_| true).unwrap();

        let seen = recorder.0.lock();
        let done: Vec<usize> = seen.iter().map(|(d, _)| *d).collect();
        assert_eq!(done, (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn empty_input_skips_pool() {
        let items: Vec<u32> = Vec::new();
        let result = dispatch(&items, 8, &SilentObserver, |_| true).unwrap();
        assert_eq!(result, RunResult::default());
    }
}
