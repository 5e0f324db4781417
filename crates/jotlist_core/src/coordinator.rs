//! Off-thread access to the note database.
//!
//! # Responsibility
//! - Own the SQLite connection on one dedicated worker thread.
//! - Run submitted jobs strictly in submission order, one at a time.
//! - Hand every job result back to the submitting thread as a `Completion`.
//!
//! # Invariants
//! - Only the worker thread ever touches the connection.
//! - The job queue is bounded; a full queue is an error, never a block.
//! - Completions arrive in ticket order.
//! - Job results are delivered unchanged. Nothing is retried here.
//! - A panicking job stops the worker; later submissions fail with `Stopped`.

use log::{debug, error, info};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{
    self, Receiver, RecvTimeoutError, Sender, SyncSender, TryRecvError, TrySendError,
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const DEFAULT_QUEUE_CAPACITY: usize = 64;
const DEFAULT_THREAD_NAME: &str = "jotlist-store";

/// Per-operation handle returned by `AccessCoordinator::run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl Display for Ticket {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Worker configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Maximum number of queued, not yet started jobs. Clamped to >= 1.
    pub queue_capacity: usize,
    /// Name given to the worker thread.
    pub thread_name: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum CoordinatorError {
    /// The worker thread could not be spawned.
    Spawn(std::io::Error),
    /// The job queue already holds `capacity` jobs.
    QueueFull { capacity: usize },
    /// The worker has shut down or died.
    Stopped,
}

impl Display for CoordinatorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn(err) => write!(f, "failed to spawn store worker: {err}"),
            Self::QueueFull { capacity } => {
                write!(f, "store queue is full ({capacity} jobs pending)")
            }
            Self::Stopped => write!(f, "store worker is not running"),
        }
    }
}

impl Error for CoordinatorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn(err) => Some(err),
            _ => None,
        }
    }
}

/// Result of one finished job.
#[derive(Debug)]
pub struct Completion<M> {
    pub ticket: Ticket,
    pub output: M,
}

type Job<M> = Box<dyn FnOnce(&mut Connection) -> M + Send>;

struct Envelope<M> {
    ticket: Ticket,
    job: Job<M>,
}

/// Single-writer job queue over one connection.
///
/// `M` is the message type every job produces.
pub struct AccessCoordinator<M: Send + 'static> {
    jobs: Option<SyncSender<Envelope<M>>>,
    completions: Receiver<Completion<M>>,
    worker: Option<JoinHandle<Option<Ticket>>>,
    last_ticket: u64,
    capacity: usize,
}

impl<M: Send + 'static> AccessCoordinator<M> {
    /// Moves `conn` onto a new worker thread and starts accepting jobs.
    pub fn start(conn: Connection, config: CoordinatorConfig) -> Result<Self, CoordinatorError> {
        let capacity = config.queue_capacity.max(1);
        let (job_tx, job_rx) = mpsc::sync_channel(capacity);
        let (done_tx, done_rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || run_worker(conn, job_rx, done_tx))
            .map_err(CoordinatorError::Spawn)?;

        info!(
            "event=coordinator_start module=coordinator status=ok capacity={} thread={}",
            capacity, config.thread_name
        );
        Ok(Self {
            jobs: Some(job_tx),
            completions: done_rx,
            worker: Some(worker),
            last_ticket: 0,
            capacity,
        })
    }

    /// Queues `job` behind every previously submitted job.
    ///
    /// # Errors
    /// - `QueueFull` when `queue_capacity` jobs are already waiting.
    /// - `Stopped` after `shutdown` or when the worker died.
    pub fn run<F>(&mut self, job: F) -> Result<Ticket, CoordinatorError>
    where
        F: FnOnce(&mut Connection) -> M + Send + 'static,
    {
        let jobs = self.jobs.as_ref().ok_or(CoordinatorError::Stopped)?;
        let ticket = Ticket(self.last_ticket + 1);
        match jobs.try_send(Envelope {
            ticket,
            job: Box::new(job),
        }) {
            Ok(()) => {
                self.last_ticket = ticket.0;
                debug!("event=job_submit module=coordinator status=ok ticket={ticket}");
                Ok(ticket)
            }
            Err(TrySendError::Full(_)) => Err(CoordinatorError::QueueFull {
                capacity: self.capacity,
            }),
            Err(TrySendError::Disconnected(_)) => Err(CoordinatorError::Stopped),
        }
    }

    /// Returns the next finished job without blocking.
    ///
    /// Returns `Ok(None)` when nothing is ready yet and `Err(Stopped)` once
    /// the worker is gone and every completion has been taken.
    pub fn try_next(&self) -> Result<Option<Completion<M>>, CoordinatorError> {
        match self.completions.try_recv() {
            Ok(completion) => Ok(Some(completion)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(CoordinatorError::Stopped),
        }
    }

    /// Waits up to `timeout` for the next finished job.
    ///
    /// Returns `Ok(None)` on timeout and `Err(Stopped)` once the worker is
    /// gone and every completion has been taken.
    pub fn next_timeout(&self, timeout: Duration) -> Result<Option<Completion<M>>, CoordinatorError> {
        match self.completions.recv_timeout(timeout) {
            Ok(completion) => Ok(Some(completion)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(CoordinatorError::Stopped),
        }
    }

    /// Highest ticket handed out so far.
    pub fn last_ticket(&self) -> Option<Ticket> {
        (self.last_ticket > 0).then_some(Ticket(self.last_ticket))
    }

    /// False after `shutdown` and once the worker has exited on its own.
    pub fn is_running(&self) -> bool {
        self.jobs.is_some()
            && self
                .worker
                .as_ref()
                .is_some_and(|worker| !worker.is_finished())
    }

    /// Stops accepting jobs, waits for queued ones, closes the connection.
    ///
    /// Completions of drained jobs stay readable through `try_next`.
    /// A worker that already died on a panicking job is only reaped.
    /// Calling this more than once is a no-op.
    pub fn shutdown(&mut self) {
        let Some(jobs) = self.jobs.take() else {
            return;
        };
        drop(jobs);

        let started_at = Instant::now();
        if let Some(worker) = self.worker.take() {
            match worker.join() {
                Ok(None) => {}
                Ok(Some(ticket)) => {
                    error!(
                        "event=coordinator_stop module=coordinator status=error error_code=job_panicked ticket={ticket}"
                    );
                    return;
                }
                Err(_) => {
                    error!("event=coordinator_stop module=coordinator status=error error_code=worker_panicked");
                    return;
                }
            }
        }
        info!(
            "event=coordinator_stop module=coordinator status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        );
    }
}

impl<M: Send + 'static> Drop for AccessCoordinator<M> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Returns the ticket of the job that killed the worker, if any.
fn run_worker<M>(
    mut conn: Connection,
    jobs: Receiver<Envelope<M>>,
    done: Sender<Completion<M>>,
) -> Option<Ticket> {
    for Envelope { ticket, job } in jobs {
        let started_at = Instant::now();
        let output = match catch_unwind(AssertUnwindSafe(|| job(&mut conn))) {
            Ok(output) => output,
            Err(_) => {
                error!(
                    "event=job_run module=coordinator status=error ticket={ticket} error_code=job_panicked"
                );
                return Some(ticket);
            }
        };
        debug!(
            "event=job_run module=coordinator status=ok ticket={ticket} duration_ms={}",
            started_at.elapsed().as_millis()
        );
        // Receiver may be gone already; queued writes still have to land.
        let _ = done.send(Completion { ticket, output });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{AccessCoordinator, CoordinatorConfig, CoordinatorError, Ticket};
    use crate::db::open_db_in_memory;
    use std::sync::mpsc;
    use std::thread;
    use std::time::{Duration, Instant};

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn completions_arrive_in_submission_order() {
        let conn = open_db_in_memory().unwrap();
        let mut coordinator = AccessCoordinator::start(conn, CoordinatorConfig::default()).unwrap();

        let tickets: Vec<Ticket> = (0..10u64)
            .map(|value| coordinator.run(move |_conn| value).unwrap())
            .collect();

        for (expected, ticket) in tickets.iter().enumerate() {
            let completion = coordinator.next_timeout(WAIT).unwrap().unwrap();
            assert_eq!(completion.ticket, *ticket);
            assert_eq!(completion.output, expected as u64);
        }
    }

    #[test]
    fn full_queue_is_reported_without_blocking() {
        let conn = open_db_in_memory().unwrap();
        let config = CoordinatorConfig {
            queue_capacity: 1,
            ..CoordinatorConfig::default()
        };
        let mut coordinator = AccessCoordinator::start(conn, config).unwrap();

        let (release_tx, release_rx) = mpsc::channel::<()>();
        let (started_tx, started_rx) = mpsc::channel::<()>();
        coordinator
            .run(move |_conn| {
                started_tx.send(()).unwrap();
                release_rx.recv().unwrap();
                0
            })
            .unwrap();
        started_rx.recv_timeout(WAIT).unwrap();

        coordinator.run(|_conn| 1).unwrap();
        let err = coordinator.run(|_conn| 2).unwrap_err();
        assert!(matches!(err, CoordinatorError::QueueFull { capacity: 1 }));

        release_tx.send(()).unwrap();
        assert_eq!(coordinator.next_timeout(WAIT).unwrap().unwrap().output, 0);
        assert_eq!(coordinator.next_timeout(WAIT).unwrap().unwrap().output, 1);
    }

    #[test]
    fn shutdown_drains_queue_and_rejects_new_jobs() {
        let conn = open_db_in_memory().unwrap();
        let mut coordinator = AccessCoordinator::start(conn, CoordinatorConfig::default()).unwrap();
        let ticket = coordinator.run(|_conn| "queued").unwrap();

        coordinator.shutdown();
        coordinator.shutdown();
        assert!(!coordinator.is_running());

        let completion = coordinator.try_next().unwrap().unwrap();
        assert_eq!(completion.ticket, ticket);
        assert!(matches!(
            coordinator.try_next(),
            Err(CoordinatorError::Stopped)
        ));
        assert!(matches!(
            coordinator.run(|_conn| "late"),
            Err(CoordinatorError::Stopped)
        ));
    }

    #[test]
    fn panicking_job_stops_the_worker() {
        let conn = open_db_in_memory().unwrap();
        let mut coordinator: AccessCoordinator<u8> =
            AccessCoordinator::start(conn, CoordinatorConfig::default()).unwrap();

        coordinator.run(|_conn| panic!("boom")).unwrap();
        assert!(matches!(
            coordinator.next_timeout(WAIT),
            Err(CoordinatorError::Stopped)
        ));
        assert!(matches!(
            coordinator.run(|_conn| 1),
            Err(CoordinatorError::Stopped)
        ));
    }

    #[test]
    fn worker_killed_by_panic_is_not_reported_running() {
        let conn = open_db_in_memory().unwrap();
        let mut coordinator: AccessCoordinator<u8> =
            AccessCoordinator::start(conn, CoordinatorConfig::default()).unwrap();
        assert!(coordinator.is_running());

        coordinator.run(|_conn| panic!("boom")).unwrap();
        let deadline = Instant::now() + WAIT;
        while coordinator.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        assert!(!coordinator.is_running());
        assert!(matches!(
            coordinator.try_next(),
            Err(CoordinatorError::Stopped)
        ));
        coordinator.shutdown();
        assert!(!coordinator.is_running());
    }
}
