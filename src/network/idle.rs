//! Idle Timer Scheduler
//!
//! Deferred-close facility shared by every pooled connection. One background
//! thread owns a deadline-ordered queue; connections schedule a close job
//! when parked and cancel it when reclaimed. The scheduler is an explicitly
//! owned value (typically held by the pool) injected into each connection,
//! so its lifecycle is visible and tests can drive it with short delays.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering as MemOrdering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

/// Identity token for one scheduled timer
///
/// Process-unique: no two `schedule` calls ever return the same key, so a
/// key held by a connection identifies exactly one idle period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerKey(u64);

/// A deferred action; invoked on the timer thread with its own key
type Job = Box<dyn FnOnce(TimerKey) + Send + 'static>;

enum Cmd {
    Schedule {
        key: TimerKey,
        deadline: Instant,
        job: Job,
    },
    Cancel {
        key: TimerKey,
    },
    Shutdown,
}

/// Shared timer service for idle connection retirement
///
/// Dropping the scheduler stops the timer thread; pending jobs are
/// discarded without running.
pub struct IdleScheduler {
    tx: Sender<Cmd>,
    worker: Option<JoinHandle<()>>,
    next_key: AtomicU64,
}

impl IdleScheduler {
    /// Start the scheduler and its timer thread
    pub fn new() -> Self {
        let (tx, rx) = channel::unbounded();
        let worker = std::thread::spawn(move || run_timer(rx));

        Self {
            tx,
            worker: Some(worker),
            next_key: AtomicU64::new(1),
        }
    }

    /// Schedule `job` to run on the timer thread after `delay`
    ///
    /// Returns the key identifying this timer; the job receives the same key
    /// when it fires. Jobs should be quick: the timer thread is shared.
    pub fn schedule(&self, delay: Duration, job: impl FnOnce(TimerKey) + Send + 'static) -> TimerKey {
        let key = TimerKey(self.next_key.fetch_add(1, MemOrdering::Relaxed));
        // Send only fails once the timer thread is gone, during teardown.
        let _ = self.tx.send(Cmd::Schedule {
            key,
            deadline: Instant::now() + delay,
            job: Box::new(job),
        });
        key
    }

    /// Cancel a scheduled timer, best-effort
    ///
    /// May race with a timer that has already fired or is about to fire;
    /// callers that need a hard guarantee must carry their own token check
    /// inside the job.
    pub fn cancel(&self, key: TimerKey) {
        let _ = self.tx.send(Cmd::Cancel { key });
    }
}

impl Default for IdleScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for IdleScheduler {
    fn drop(&mut self) {
        let _ = self.tx.send(Cmd::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

// =============================================================================
// Timer Thread
// =============================================================================

/// Pending deadline, min-ordered for the heap
struct Entry {
    deadline: Instant,
    key: TimerKey,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.key == other.key
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, the earliest deadline must win
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.key.0.cmp(&self.key.0))
    }
}

fn run_timer(rx: Receiver<Cmd>) {
    let mut deadlines: BinaryHeap<Entry> = BinaryHeap::new();
    let mut jobs: HashMap<TimerKey, Job> = HashMap::new();

    loop {
        // Fire everything that has come due. A cancelled timer leaves a
        // stale deadline behind; the job map is authoritative.
        loop {
            let due = match deadlines.peek() {
                Some(entry) if entry.deadline <= Instant::now() => entry.key,
                _ => break,
            };
            deadlines.pop();
            if let Some(job) = jobs.remove(&due) {
                job(due);
            }
        }

        let cmd = match deadlines.peek().map(|entry| entry.deadline) {
            Some(deadline) => match rx.recv_deadline(deadline) {
                Ok(cmd) => cmd,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match rx.recv() {
                Ok(cmd) => cmd,
                Err(_) => break,
            },
        };

        match cmd {
            Cmd::Schedule { key, deadline, job } => {
                jobs.insert(key, job);
                deadlines.push(Entry { deadline, key });
            }
            Cmd::Cancel { key } => {
                jobs.remove(&key);
            }
            Cmd::Shutdown => break,
        }
    }
}
