//! Bounded pattern evaluation.
//!
//! Each pattern evaluation runs on a reusable worker thread and the caller
//! waits at most `deadline`. When the deadline passes, the worker is detached:
//! its job sender is dropped, so once the slow evaluation finishes the thread
//! finds a closed channel and exits, and its late result goes nowhere. A new
//! worker is spawned lazily for the next evaluation.

use crate::pattern::Pattern;
use std::ops::Range;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Outcome of evaluating one pattern against one span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// Captured byte ranges of every accepted occurrence, in document order.
    Completed(Vec<Range<usize>>),
    /// The deadline expired; this pattern contributes nothing for the span.
    Skipped {
        pattern: String,
        span_len: usize,
        elapsed: Duration,
    },
}

struct Worker {
    jobs: mpsc::Sender<Job>,
}

impl Worker {
    fn spawn() -> std::io::Result<Self> {
        let (jobs, rx) = mpsc::channel::<Job>();
        thread::Builder::new()
            .name("bugsafe-guard".to_string())
            .spawn(move || {
                while let Ok(job) = rx.recv() {
                    job();
                }
            })?;
        Ok(Self { jobs })
    }
}

/// Runs pattern evaluations under a wall-clock deadline.
pub struct TimeoutGuard {
    deadline: Option<Duration>,
    worker: Option<Worker>,
    detached: usize,
    #[cfg(test)]
    stalled: Option<String>,
}

impl TimeoutGuard {
    /// Create a guard. `timeout_ms == 0` disables the deadline and evaluates inline.
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            deadline: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
            worker: None,
            detached: 0,
            #[cfg(test)]
            stalled: None,
        }
    }

    /// Make every evaluation of the named pattern sleep past the deadline.
    #[cfg(test)]
    pub(crate) fn stall_pattern(&mut self, name: &str) {
        self.stalled = Some(name.to_string());
    }

    /// The configured deadline, if any.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Number of workers abandoned after a timeout.
    pub fn detached_workers(&self) -> usize {
        self.detached
    }

    /// Evaluate `pattern` over `text`, never capturing inside `reserved`.
    pub fn evaluate(
        &mut self,
        pattern: &Pattern,
        text: &Arc<str>,
        reserved: &Arc<[Range<usize>]>,
    ) -> Evaluation {
        let span_len = text.len();
        let owned = pattern.clone();
        let shared = Arc::clone(text);
        let reserved = Arc::clone(reserved);
        let started = Instant::now();

        #[cfg(test)]
        let stall = self
            .deadline
            .filter(|_| self.stalled.as_deref() == Some(pattern.name.as_str()));

        match self.run(move || {
            #[cfg(test)]
            if let Some(deadline) = stall {
                thread::sleep(deadline * 10);
            }
            find_spans(&owned, &shared, &reserved)
        }) {
            Some(spans) => Evaluation::Completed(spans),
            None => {
                let elapsed = started.elapsed();
                warn!(
                    pattern = %pattern.name,
                    span_len,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "pattern evaluation timed out, skipping"
                );
                Evaluation::Skipped {
                    pattern: pattern.name.clone(),
                    span_len,
                    elapsed,
                }
            }
        }
    }

    /// Run `f` under the deadline. `None` means the deadline expired.
    pub fn run<T, F>(&mut self, f: F) -> Option<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let Some(deadline) = self.deadline else {
            return Some(f());
        };

        let Some(worker) = self.worker() else {
            return Some(f());
        };

        let (reply_tx, reply_rx) = mpsc::sync_channel::<T>(1);
        let job: Job = Box::new(move || {
            // Receiver is gone if the caller already gave up.
            let _ = reply_tx.send(f());
        });

        if let Err(mpsc::SendError(job)) = worker.jobs.send(job) {
            // Worker thread is gone; evaluate here rather than lose the pattern.
            self.worker = None;
            debug!("guard worker unavailable, evaluating inline");
            job();
            return reply_rx.try_recv().ok();
        }

        match reply_rx.recv_timeout(deadline) {
            Ok(value) => Some(value),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                self.worker = None;
                self.detached += 1;
                None
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                self.worker = None;
                None
            }
        }
    }

    fn worker(&mut self) -> Option<&Worker> {
        if self.worker.is_none() {
            match Worker::spawn() {
                Ok(worker) => self.worker = Some(worker),
                Err(e) => {
                    warn!(error = %e, "failed to spawn guard worker, evaluating inline");
                    return None;
                }
            }
        }
        self.worker.as_ref()
    }
}

impl std::fmt::Debug for TimeoutGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeoutGuard")
            .field("deadline", &self.deadline)
            .field("worker_alive", &self.worker.is_some())
            .field("detached", &self.detached)
            .finish()
    }
}

/// Captured ranges of every non-excluded occurrence of `pattern` in `text`.
///
/// `reserved` is sorted and disjoint. When a capture would intersect a
/// reserved range, the search restarts right after that range instead of
/// after the whole match, so text beyond a token is still searched.
pub fn find_spans(pattern: &Pattern, text: &str, reserved: &[Range<usize>]) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut pos = 0;

    while pos <= text.len() {
        let Some(caps) = pattern.regex.captures_at(text, pos) else {
            break;
        };
        let Some(whole) = caps.get(0) else {
            break;
        };
        let mut next = if whole.is_empty() {
            next_char(text, whole.end())
        } else {
            whole.end()
        };

        if let Some(m) = caps.get(pattern.capture_group) {
            let span = m.range();
            match reserved_end(reserved, &span) {
                Some(end) => next = end.max(next_char(text, pos)),
                None if !pattern.is_excluded(m.as_str()) => spans.push(span),
                None => {}
            }
        }
        pos = next;
    }
    spans
}

/// End of the reserved range intersecting `span`, if any.
fn reserved_end(reserved: &[Range<usize>], span: &Range<usize>) -> Option<usize> {
    let idx = reserved.partition_point(|r| r.start < span.end.max(span.start + 1));
    idx.checked_sub(1)
        .map(|i| &reserved[i])
        .filter(|r| r.end > span.start)
        .map(|r| r.end)
}

fn next_char(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map_or(pos + 1, |c| pos + c.len_utf8())
}
