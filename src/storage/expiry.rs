//! Background Janitor
//!
//! Two periodic tasks keep a cache fresh without client intervention:
//!
//! 1. The **reaper** wakes every `cleanup_interval`, sweeps the store once and
//!    removes every entry that is expired according to the cached clock.
//! 2. The **clock** task refreshes the cached clock every tick (1s, or 1ms in
//!    precise mode).
//!
//! Both tasks listen on the same `watch` channel and stop together when the
//! [`Janitor`] handle is stopped or dropped.
//!
//! ## Where the tasks run
//!
//! Both tasks always run on a dedicated `flashcache-janitor` thread that
//! drives them on its own current-thread runtime. The janitor never borrows
//! the caller's runtime, so a cache outlives whatever runtime it was created
//! in and can be created from plain synchronous code.

use crate::error::{CacheError, Result};
use crate::storage::clock::CachedClock;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::runtime;
use tokio::sync::watch;
use tokio::time::{self as tokio_time, Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

/// Name of the dedicated janitor thread.
const JANITOR_THREAD_NAME: &str = "flashcache-janitor";

/// Something the reaper can sweep.
pub trait Sweep: Send + Sync + 'static {
    /// Removes expired entries, returning how many were removed.
    fn sweep(&self) -> usize;

    /// Number of entries physically present (for logging).
    fn physical_len(&self) -> usize;
}

/// Configuration for the janitor.
#[derive(Debug, Clone)]
pub struct JanitorConfig {
    /// Interval between sweeps (None = reaper not started)
    pub cleanup_interval: Option<Duration>,

    /// Interval between clock refreshes
    pub clock_tick: Duration,
}

/// A handle to the running janitor tasks.
///
/// When this handle is dropped, both tasks are stopped.
#[derive(Debug)]
pub struct Janitor {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,

    /// The thread hosting both tasks, until it is joined
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Janitor {
    /// Starts the janitor tasks.
    ///
    /// # Arguments
    ///
    /// * `target` - What the reaper sweeps
    /// * `clock` - The cached clock to keep fresh
    /// * `config` - Tick intervals
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Spawn`] if the dedicated thread or its runtime
    /// could not be created.
    pub fn start(
        target: Arc<dyn Sweep>,
        clock: Arc<CachedClock>,
        config: JanitorConfig,
    ) -> Result<Self> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let JanitorConfig {
            cleanup_interval,
            clock_tick,
        } = config;

        let runtime = runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(CacheError::Spawn)?;

        let thread = thread::Builder::new()
            .name(JANITOR_THREAD_NAME.to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    let reaper = async {
                        if let Some(interval) = cleanup_interval {
                            reaper_loop(target, interval, shutdown_rx.clone()).await;
                        }
                    };
                    tokio::join!(
                        reaper,
                        clock_loop(clock, clock_tick, shutdown_rx.clone())
                    );
                });
            })
            .map_err(CacheError::Spawn)?;

        info!(
            cleanup_interval_ms = cleanup_interval.map(|i| i.as_millis() as u64),
            clock_tick_ms = clock_tick.as_millis() as u64,
            "Background janitor started"
        );

        Ok(Self {
            shutdown_tx,
            thread: Mutex::new(Some(thread)),
        })
    }

    /// Signals both tasks to stop. Safe to call any number of times.
    pub fn stop(&self) {
        let was_stopped = self.shutdown_tx.send_replace(true);
        if !was_stopped {
            debug!("Background janitor stopping");
        }
    }

    /// Stops the tasks and waits for the janitor thread to exit.
    ///
    /// Joining is skipped when called from the janitor thread itself (for
    /// example from an eviction callback).
    pub fn shutdown(&self) {
        self.stop();

        let handle = self.thread.lock().take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                debug!("Janitor thread panicked before shutdown");
            }
        }
    }

    /// True once a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        *self.shutdown_tx.borrow()
    }
}

impl Drop for Janitor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Waits for the next tick or a shutdown signal.
///
/// Returns false when the task should exit.
async fn next_tick(
    ticker: &mut tokio_time::Interval,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> bool {
    if *shutdown_rx.borrow() {
        return false;
    }
    tokio::select! {
        _ = ticker.tick() => true,
        result = shutdown_rx.changed() => result.is_ok() && !*shutdown_rx.borrow(),
    }
}

fn ticker(period: Duration) -> tokio_time::Interval {
    let mut ticker = tokio_time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// The reaper loop.
async fn reaper_loop(
    target: Arc<dyn Sweep>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = ticker(interval);

    while next_tick(&mut ticker, &mut shutdown_rx).await {
        let removed = target.sweep();
        if removed > 0 {
            debug!(
                expired = removed,
                keys_remaining = target.physical_len(),
                "Expired keys cleaned up"
            );
        } else {
            trace!("Reaper found no expired keys");
        }
    }

    debug!("Reaper received shutdown signal");
}

/// The clock refresh loop.
async fn clock_loop(
    clock: Arc<CachedClock>,
    tick: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = ticker(tick);

    while next_tick(&mut ticker, &mut shutdown_rx).await {
        clock.refresh();
    }

    debug!("Clock refresher received shutdown signal");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::clock::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSweep {
        sweeps: AtomicUsize,
    }

    impl Sweep for CountingSweep {
        fn sweep(&self) -> usize {
            self.sweeps.fetch_add(1, Ordering::SeqCst);
            0
        }

        fn physical_len(&self) -> usize {
            0
        }
    }

    fn config(cleanup_ms: Option<u64>) -> JanitorConfig {
        JanitorConfig {
            cleanup_interval: cleanup_ms.map(Duration::from_millis),
            clock_tick: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn test_reaper_runs_on_interval() {
        let sweeper = Arc::new(CountingSweep::default());
        let clock = Arc::new(CachedClock::new(Arc::new(ManualClock::new(0))));
        let _janitor = Janitor::start(sweeper.clone(), clock, config(Some(10))).unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(sweeper.sweeps.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_reaper_not_started_without_interval() {
        let sweeper = Arc::new(CountingSweep::default());
        let clock = Arc::new(CachedClock::new(Arc::new(ManualClock::new(0))));
        let _janitor = Janitor::start(sweeper.clone(), clock, config(None)).unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(sweeper.sweeps.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_clock_task_refreshes() {
        let source = Arc::new(ManualClock::new(0));
        let clock = Arc::new(CachedClock::new(source.clone()));
        let sweeper = Arc::new(CountingSweep::default());
        let _janitor = Janitor::start(sweeper, clock.clone(), config(None)).unwrap();

        source.set(1_000);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(clock.now(), 1_000);
    }

    #[tokio::test]
    async fn test_janitor_stops_on_drop() {
        let sweeper = Arc::new(CountingSweep::default());
        let clock = Arc::new(CachedClock::new(Arc::new(ManualClock::new(0))));

        {
            let _janitor = Janitor::start(sweeper.clone(), clock, config(Some(10))).unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        // Let the tasks observe the shutdown.
        tokio::time::sleep(Duration::from_millis(20)).await;
        let after_drop = sweeper.sweeps.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(sweeper.sweeps.load(Ordering::SeqCst), after_drop);
    }

    #[test]
    fn test_janitor_outlives_creating_runtime() {
        let sweeper = Arc::new(CountingSweep::default());
        let source = Arc::new(ManualClock::new(0));
        let clock = Arc::new(CachedClock::new(source.clone()));

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let janitor = runtime
            .block_on(async { Janitor::start(sweeper.clone(), clock.clone(), config(Some(5))) })
            .unwrap();
        drop(runtime);

        source.set(1_000);
        std::thread::sleep(Duration::from_millis(60));

        assert!(sweeper.sweeps.load(Ordering::SeqCst) >= 1);
        assert_eq!(clock.now(), 1_000);
        janitor.shutdown();
    }

    #[test]
    fn test_dedicated_thread_without_runtime() {
        let sweeper = Arc::new(CountingSweep::default());
        let clock = Arc::new(CachedClock::new(Arc::new(ManualClock::new(0))));
        let janitor = Janitor::start(sweeper.clone(), clock, config(Some(5))).unwrap();

        std::thread::sleep(Duration::from_millis(60));
        janitor.shutdown();
        let after_shutdown = sweeper.sweeps.load(Ordering::SeqCst);
        assert!(after_shutdown >= 1);

        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(sweeper.sweeps.load(Ordering::SeqCst), after_shutdown);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let clock = Arc::new(CachedClock::new(Arc::new(ManualClock::new(0))));
        let janitor =
            Janitor::start(Arc::new(CountingSweep::default()), clock, config(Some(5))).unwrap();

        assert!(!janitor.is_stopped());
        janitor.stop();
        janitor.stop();
        janitor.shutdown();
        janitor.shutdown();
        assert!(janitor.is_stopped());
    }
}
