//! Timeline scheduling
//!
//! The aggregation core never sleeps. It exposes its next deadline and is
//! advanced explicitly, either by a [`ManualClock`] (tests, replays) or by the
//! tokio [`LiveDriver`], which sleeps until the next deadline, advances the
//! machine, and publishes a fresh snapshot on a watch channel.

use crate::aggregator::InteractionAggregator;
use crate::dashboard::{DashboardSnapshot, FlowDashboard};
use crate::ivi::types::IviSnapshot;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A state machine driven by virtual milliseconds
pub trait Timeline: Send + 'static {
    type Snapshot: Clone + Send + Sync + 'static;

    /// Arm timers relative to `now_ms`
    fn start(&mut self, now_ms: u64);

    fn next_deadline(&self) -> Option<u64>;

    /// Fire every timer due at or before `now_ms`
    fn advance_to(&mut self, now_ms: u64);

    fn snapshot(&self) -> Self::Snapshot;

    /// Cancel every timer; later calls must not mutate state
    fn teardown(&mut self);
}

impl Timeline for InteractionAggregator {
    type Snapshot = IviSnapshot;

    fn start(&mut self, now_ms: u64) {
        InteractionAggregator::start(self, now_ms);
    }

    fn next_deadline(&self) -> Option<u64> {
        InteractionAggregator::next_deadline(self)
    }

    fn advance_to(&mut self, now_ms: u64) {
        InteractionAggregator::advance_to(self, now_ms);
    }

    fn snapshot(&self) -> IviSnapshot {
        InteractionAggregator::snapshot(self)
    }

    fn teardown(&mut self) {
        self.stop();
    }
}

impl Timeline for FlowDashboard {
    type Snapshot = DashboardSnapshot;

    fn start(&mut self, now_ms: u64) {
        FlowDashboard::start(self, now_ms);
    }

    fn next_deadline(&self) -> Option<u64> {
        FlowDashboard::next_deadline(self)
    }

    fn advance_to(&mut self, now_ms: u64) {
        FlowDashboard::advance_to(self, now_ms);
    }

    fn snapshot(&self) -> DashboardSnapshot {
        FlowDashboard::snapshot(self)
    }

    fn teardown(&mut self) {
        self.stop();
    }
}

/// Hand-advanced clock for deterministic runs
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualClock {
    now_ms: u64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Move forward by `by_ms` and advance the timeline to the new time
    pub fn advance<T: Timeline>(&mut self, by_ms: u64, timeline: &mut T) {
        self.now_ms += by_ms;
        timeline.advance_to(self.now_ms);
    }

    /// Jump to an absolute time; earlier times are ignored
    pub fn set<T: Timeline>(&mut self, at_ms: u64, timeline: &mut T) {
        self.now_ms = self.now_ms.max(at_ms);
        timeline.advance_to(self.now_ms);
    }
}

struct Shared<T: Timeline> {
    machine: Mutex<T>,
    origin: Instant,
    wake: Notify,
    cancel: CancellationToken,
    publish: watch::Sender<T::Snapshot>,
}

impl<T: Timeline> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, T> {
        // State is consistent after every call, so a poisoned lock is still usable
        self.machine.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn elapsed_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn advance_and_publish(&self) {
        let snapshot = {
            let mut machine = self.lock();
            machine.advance_to(self.elapsed_ms());
            machine.snapshot()
        };
        self.publish.send_replace(snapshot);
    }
}

/// Cloneable handle for mutating and observing a driven timeline
pub struct DriverHandle<T: Timeline> {
    shared: Arc<Shared<T>>,
}

impl<T: Timeline> Clone for DriverHandle<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Timeline> DriverHandle<T> {
    /// Apply a mutation at the current time and publish the result.
    ///
    /// Returns `None` once the driver has been stopped.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        if self.shared.cancel.is_cancelled() {
            return None;
        }
        let (result, snapshot) = {
            let mut machine = self.shared.lock();
            machine.advance_to(self.shared.elapsed_ms());
            let result = f(&mut machine);
            (result, machine.snapshot())
        };
        self.shared.publish.send_replace(snapshot);
        // deadlines may have moved
        self.shared.wake.notify_one();
        Some(result)
    }

    /// Most recently published snapshot
    pub fn snapshot(&self) -> T::Snapshot {
        self.shared.publish.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T::Snapshot> {
        self.shared.publish.subscribe()
    }

    /// Milliseconds since the driver started
    pub fn elapsed_ms(&self) -> u64 {
        self.shared.elapsed_ms()
    }

    pub fn stop(&self) {
        self.shared.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }
}

/// Background task owning a timeline
pub struct LiveDriver<T: Timeline> {
    handle: DriverHandle<T>,
    task: JoinHandle<()>,
}

impl<T: Timeline> LiveDriver<T> {
    /// Start `machine` at time zero and drive it on the current runtime
    pub fn spawn(mut machine: T) -> Self {
        machine.start(0);
        let (publish, _) = watch::channel(machine.snapshot());
        let shared = Arc::new(Shared {
            machine: Mutex::new(machine),
            origin: Instant::now(),
            wake: Notify::new(),
            cancel: CancellationToken::new(),
            publish,
        });
        let task = tokio::spawn(drive(Arc::clone(&shared)));
        info!("live driver started");
        Self {
            handle: DriverHandle { shared },
            task,
        }
    }

    pub fn handle(&self) -> DriverHandle<T> {
        self.handle.clone()
    }

    /// Cancel and wait for the background task to finish
    pub async fn shutdown(self) {
        self.handle.stop();
        if let Err(e) = self.task.await {
            warn!(error = %e, "live driver task failed");
        }
    }
}

async fn drive<T: Timeline>(shared: Arc<Shared<T>>) {
    loop {
        let deadline = shared.lock().next_deadline();
        let sleep = async {
            match deadline {
                Some(ms) => tokio::time::sleep_until(shared.origin + Duration::from_millis(ms)).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = shared.cancel.cancelled() => break,
            _ = shared.wake.notified() => {
                debug!("deadline changed");
            }
            _ = sleep => shared.advance_and_publish(),
        }
    }

    let snapshot = {
        let mut machine = shared.lock();
        machine.teardown();
        machine.snapshot()
    };
    shared.publish.send_replace(snapshot);
    info!("live driver stopped");
}
