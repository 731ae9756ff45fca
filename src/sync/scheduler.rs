//! Per-category fetch scheduling.
//!
//! Every category runs one actor task owning its timers and result set.
//! Commands arrive over an unbounded channel; the latest state is published
//! on a `watch` channel so readers never block the actor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use futures::future::OptionFuture;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior};

use crate::core::config::SchedulerConfig;
use crate::core::engine::{self, EngineEvent};
use crate::core::geo::ViewportBounds;
use crate::feed::{PositionFeed, PositionQuery};
use crate::runtime::{self, AsyncHandle};
use crate::vessels::{VesselCategory, VesselRecord};
use crate::Result;

/// Latest state of one category, as seen by the compositor and selection.
#[derive(Debug, Clone, Default)]
pub struct CategorySnapshot {
    /// Result set of the newest successful fetch
    pub records: Arc<Vec<VesselRecord>>,
    /// Bounds the current records were fetched for
    pub bounds: Option<ViewportBounds>,
    pub enabled: bool,
    /// At least one request in flight
    pub loading: bool,
    /// Message of the last failed fetch, cleared on the next success
    pub error: Option<String>,
    /// Number of result sets applied so far
    pub revision: u64,
}

#[derive(Debug)]
pub(crate) enum SchedulerCommand {
    SetEnabled(bool),
    BoundsChanged(ViewportBounds),
    RefreshNow,
    Shutdown,
}

/// Cloneable front of a category scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    category: VesselCategory,
    commands: UnboundedSender<SchedulerCommand>,
    snapshot: watch::Receiver<CategorySnapshot>,
    enabled: Arc<AtomicBool>,
}

impl SchedulerHandle {
    pub fn category(&self) -> VesselCategory {
        self.category
    }

    /// Enables or disables fetching. Disabling cancels a pending debounced
    /// fetch and the periodic refresh; requests already sent still complete.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        self.send(SchedulerCommand::SetEnabled(enabled));
    }

    /// Last value passed to [`set_enabled`](Self::set_enabled), before the
    /// actor has necessarily seen it
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Records new bounds and (re)starts the debounce window
    pub fn on_bounds_changed(&self, bounds: ViewportBounds) {
        self.send(SchedulerCommand::BoundsChanged(bounds));
    }

    /// Fetches immediately with the last recorded bounds, if enabled
    pub fn refresh_now(&self) {
        self.send(SchedulerCommand::RefreshNow);
    }

    pub fn snapshot(&self) -> CategorySnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn records(&self) -> Arc<Vec<VesselRecord>> {
        self.snapshot.borrow().records.clone()
    }

    /// Receiver notified whenever the snapshot changes
    pub fn subscribe(&self) -> watch::Receiver<CategorySnapshot> {
        self.snapshot.clone()
    }

    pub(crate) fn shutdown(&self) {
        self.send(SchedulerCommand::Shutdown);
    }

    fn send(&self, command: SchedulerCommand) {
        if self.commands.send(command).is_err() {
            log::warn!("{} scheduler is not running", self.category);
        }
    }
}

struct FetchOutcome {
    seq: u64,
    bounds: ViewportBounds,
    result: Result<Vec<VesselRecord>>,
}

enum Wake {
    Command(SchedulerCommand),
    Debounce,
    Tick,
    Completed(FetchOutcome),
    Closed,
}

struct CategoryScheduler {
    category: VesselCategory,
    config: SchedulerConfig,
    feed: Arc<dyn PositionFeed>,
    events: Option<Sender<EngineEvent>>,
    enabled: bool,
    bounds: Option<ViewportBounds>,
    debounce_deadline: Option<Instant>,
    ticker: Option<Interval>,
    next_seq: u64,
    /// Newest sequence number that completed, successfully or not
    completed_seq: u64,
    outstanding: usize,
    in_flight: Vec<Box<dyn AsyncHandle>>,
    snapshot: watch::Sender<CategorySnapshot>,
    completions_tx: UnboundedSender<FetchOutcome>,
    completions_rx: UnboundedReceiver<FetchOutcome>,
}

/// Starts the scheduler task for `category` and returns its handle
pub fn spawn_scheduler(
    category: VesselCategory,
    feed: Arc<dyn PositionFeed>,
    config: SchedulerConfig,
    enabled: bool,
    events: Option<Sender<EngineEvent>>,
) -> (SchedulerHandle, Box<dyn AsyncHandle>) {
    let (commands_tx, commands_rx) = unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(CategorySnapshot::default());
    let (completions_tx, completions_rx) = unbounded_channel();

    let scheduler = CategoryScheduler {
        category,
        config,
        feed,
        events,
        enabled: false,
        bounds: None,
        debounce_deadline: None,
        ticker: None,
        next_seq: 0,
        completed_seq: 0,
        outstanding: 0,
        in_flight: Vec::new(),
        snapshot: snapshot_tx,
        completions_tx,
        completions_rx,
    };
    let task = runtime::spawn(scheduler.run(commands_rx, enabled));

    let handle = SchedulerHandle {
        category,
        commands: commands_tx,
        snapshot: snapshot_rx,
        enabled: Arc::new(AtomicBool::new(enabled)),
    };
    (handle, task)
}

impl CategoryScheduler {
    async fn run(mut self, mut commands: UnboundedReceiver<SchedulerCommand>, enabled: bool) {
        log::debug!("{} scheduler started (enabled: {})", self.category, enabled);
        self.set_enabled(enabled);

        loop {
            let wake = {
                let debounce = OptionFuture::from(self.debounce_deadline.map(sleep_until));
                let tick = OptionFuture::from(self.ticker.as_mut().map(|t| t.tick()));
                tokio::select! {
                    cmd = commands.recv() => match cmd {
                        Some(command) => Wake::Command(command),
                        None => Wake::Closed,
                    },
                    Some(()) = debounce => Wake::Debounce,
                    Some(_) = tick => Wake::Tick,
                    Some(outcome) = self.completions_rx.recv() => Wake::Completed(outcome),
                }
            };

            match wake {
                Wake::Command(SchedulerCommand::SetEnabled(enabled)) => self.set_enabled(enabled),
                Wake::Command(SchedulerCommand::BoundsChanged(bounds)) => {
                    self.bounds = Some(bounds);
                    if self.enabled {
                        self.arm_debounce();
                    }
                }
                Wake::Command(SchedulerCommand::RefreshNow) => self.start_fetch(),
                Wake::Command(SchedulerCommand::Shutdown) | Wake::Closed => break,
                Wake::Debounce => {
                    self.debounce_deadline = None;
                    self.start_fetch();
                }
                Wake::Tick => {
                    log::debug!("{} periodic refresh", self.category);
                    self.start_fetch();
                }
                Wake::Completed(outcome) => self.apply(outcome),
            }
        }

        for handle in &self.in_flight {
            handle.cancel();
        }
        log::debug!("{} scheduler stopped", self.category);
    }

    fn set_enabled(&mut self, enabled: bool) {
        let was_enabled = self.enabled;
        self.enabled = enabled;
        self.snapshot.send_modify(|s| s.enabled = enabled);

        if enabled && !was_enabled {
            let period = self.config.refresh_interval;
            self.ticker = (!period.is_zero()).then(|| {
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker
            });
            if self.config.refetch_on_enable && self.bounds.is_some() {
                self.arm_debounce();
            }
        } else if !enabled {
            self.debounce_deadline = None;
            self.ticker = None;
        }
    }

    fn arm_debounce(&mut self) {
        self.debounce_deadline = Some(Instant::now() + self.config.debounce);
    }

    fn start_fetch(&mut self) {
        let Some(bounds) = self.bounds else {
            return;
        };
        if !self.enabled {
            return;
        }

        self.next_seq += 1;
        let seq = self.next_seq;
        let query = PositionQuery::new(bounds, self.category);
        let feed = self.feed.clone();
        let done = self.completions_tx.clone();

        self.outstanding += 1;
        self.in_flight.retain(|h| !h.is_finished());
        self.in_flight.push(runtime::spawn(async move {
            let result = feed.positions(&query).await;
            let _ = done.send(FetchOutcome {
                seq,
                bounds,
                result,
            });
        }));
        self.snapshot.send_modify(|s| s.loading = true);
    }

    fn apply(&mut self, outcome: FetchOutcome) {
        self.outstanding = self.outstanding.saturating_sub(1);
        let still_loading = self.outstanding > 0;

        if !self.enabled {
            log::debug!("{} disabled; discarding response #{}", self.category, outcome.seq);
            self.snapshot.send_modify(|s| s.loading = still_loading);
            return;
        }
        if outcome.seq <= self.completed_seq {
            log::debug!(
                "{} discarding stale response #{} (completed #{})",
                self.category,
                outcome.seq,
                self.completed_seq
            );
            self.snapshot.send_modify(|s| s.loading = still_loading);
            return;
        }
        self.completed_seq = outcome.seq;

        match outcome.result {
            Ok(records) => {
                log::debug!("{} fetched {} vessels", self.category, records.len());
                self.snapshot.send_modify(|s| {
                    s.records = Arc::new(records);
                    s.bounds = Some(outcome.bounds);
                    s.error = None;
                    s.loading = still_loading;
                    s.revision += 1;
                });
                self.emit(EngineEvent::CategoryUpdated(self.category));
            }
            Err(e) => {
                log::warn!("{} fetch failed: {}", self.category, e);
                let message = e.to_string();
                self.snapshot.send_modify(|s| {
                    s.error = Some(message.clone());
                    s.loading = still_loading;
                });
                self.emit(EngineEvent::CategoryFailed {
                    category: self.category,
                    error: message,
                });
            }
        }
    }

    fn emit(&self, event: EngineEvent) {
        if let Some(events) = &self.events {
            engine::emit(events, event);
        }
    }
}
