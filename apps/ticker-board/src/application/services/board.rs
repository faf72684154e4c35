//! Ticker Board Orchestrator
//!
//! Wires the snapshot source, the realtime feed and the reconciliation
//! store together. A single actor task owns the [`TickerStore`]; every
//! mutation happens there, so consumers only ever observe fully sorted
//! views.
//!
//! # Activation
//!
//! ```text
//! activate ──▶ publish retained view ──▶ fetch snapshot ──ok──▶ load + publish ──▶ feed.start()
//!                                              │
//!                                             err ──▶ BoardError::Snapshot
//! ```
//!
//! Each activation bumps an epoch. Snapshot results carrying an older epoch
//! (the board was deactivated or re-activated meanwhile) are discarded.
//! The feed is only started once a snapshot has landed, and stream tickers
//! are only applied while the feed runs.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_stream::wrappers::{BroadcastStream, WatchStream};

use super::hub::{BoardHub, BroadcastConfig};
use crate::application::ports::{FetchError, SnapshotSource, StreamEvent, TickerFeed};
use crate::domain::sort::{SortColumn, SortState};
use crate::domain::store::TickerStore;
use crate::domain::ticker::TickerRecord;
use crate::infrastructure::metrics::{self, DropReason};

// =============================================================================
// Public Types
// =============================================================================

/// Immutable snapshot of the table as published to consumers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardView {
    /// Rows in display order.
    pub records: Arc<[TickerRecord]>,
    /// Sort that produced the order.
    pub sort: SortState,
    /// Row index of the record that changed, for single-record updates.
    pub changed: Option<usize>,
}

impl BoardView {
    /// Market symbols in display order.
    #[must_use]
    pub fn markets(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.market.as_str()).collect()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the view has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Errors surfaced by the board.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// The snapshot fetch failed.
    #[error("snapshot fetch failed: {0}")]
    Snapshot(#[from] FetchError),

    /// The stream gave up reconnecting.
    #[error("stream unavailable after {attempts} attempts")]
    StreamUnavailable {
        /// Connection attempts made.
        attempts: u32,
    },

    /// The board task has stopped.
    #[error("board task has stopped")]
    Closed,
}

/// How the board keeps the table fresh after the first snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoardMode {
    /// Apply realtime tickers from the feed.
    #[default]
    Streaming,
    /// Re-fetch the snapshot on a fixed interval; the feed is never started.
    Polling {
        /// Delay between fetches.
        interval: Duration,
    },
}

/// Orchestrator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickerBoardConfig {
    /// Refresh mode.
    pub mode: BoardMode,
    /// Output channel capacities.
    pub broadcast: BroadcastConfig,
    /// Command queue capacity.
    pub command_capacity: usize,
}

impl Default for TickerBoardConfig {
    fn default() -> Self {
        Self {
            mode: BoardMode::Streaming,
            broadcast: BroadcastConfig::default(),
            command_capacity: 64,
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

#[derive(Debug)]
enum Command {
    Activate,
    Deactivate,
    SetSort {
        column: SortColumn,
        reply: oneshot::Sender<SortState>,
    },
    Refresh,
    Reconnect,
    Shutdown,
}

struct FetchOutcome {
    epoch: u64,
    result: Result<Vec<TickerRecord>, FetchError>,
}

// =============================================================================
// Board Handle
// =============================================================================

/// Consumer handle for a running board.
///
/// Cheap to clone. Commands are queued to the board task and processed in
/// order.
#[derive(Clone)]
pub struct BoardHandle {
    commands: mpsc::Sender<Command>,
    hub: Arc<BoardHub>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl std::fmt::Debug for BoardHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardHandle")
            .field("closed", &self.commands.is_closed())
            .finish_non_exhaustive()
    }
}

impl BoardHandle {
    /// Start (or resume) keeping the table fresh.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Closed`] if the board task has stopped.
    pub async fn activate(&self) -> Result<(), BoardError> {
        self.send(Command::Activate).await
    }

    /// Stop refreshing. The table is retained for the next activation.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Closed`] if the board task has stopped.
    pub async fn deactivate(&self) -> Result<(), BoardError> {
        self.send(Command::Deactivate).await
    }

    /// Cycle the sort for `column` and return the resulting state.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Closed`] if the board task has stopped.
    pub async fn set_sort(&self, column: SortColumn) -> Result<SortState, BoardError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SetSort { column, reply }).await?;
        rx.await.map_err(|_| BoardError::Closed)
    }

    /// Fetch the snapshot again while active.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Closed`] if the board task has stopped.
    pub async fn refresh(&self) -> Result<(), BoardError> {
        self.send(Command::Refresh).await
    }

    /// Force a fresh stream connection with a reset retry budget.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Closed`] if the board task has stopped.
    pub async fn reconnect(&self) -> Result<(), BoardError> {
        self.send(Command::Reconnect).await
    }

    /// Deactivate and stop the board task, waiting for it to finish.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Board task ended abnormally");
            }
        }
    }

    /// Stream of published views, starting with the current one.
    #[must_use]
    pub fn views(&self) -> WatchStream<BoardView> {
        WatchStream::new(self.hub.views_rx())
    }

    /// Raw watch receiver for published views.
    #[must_use]
    pub fn view_receiver(&self) -> watch::Receiver<BoardView> {
        self.hub.views_rx()
    }

    /// Most recently published view.
    #[must_use]
    pub fn latest_view(&self) -> BoardView {
        self.hub.latest_view()
    }

    /// Stream of individual applied updates.
    #[must_use]
    pub fn deltas(&self) -> BroadcastStream<TickerRecord> {
        BroadcastStream::new(self.hub.deltas_rx())
    }

    /// Stream of connectivity changes, starting with the current value.
    #[must_use]
    pub fn connectivity(&self) -> WatchStream<bool> {
        WatchStream::new(self.hub.connectivity_rx())
    }

    /// Whether the feed is currently subscribed.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.hub.is_connected()
    }

    /// Stream of board errors.
    #[must_use]
    pub fn errors(&self) -> BroadcastStream<BoardError> {
        BroadcastStream::new(self.hub.errors_rx())
    }

    /// Raw broadcast receiver for board errors.
    #[must_use]
    pub fn error_receiver(&self) -> broadcast::Receiver<BoardError> {
        self.hub.errors_rx()
    }

    async fn send(&self, command: Command) -> Result<(), BoardError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| BoardError::Closed)
    }
}

// =============================================================================
// Ticker Board
// =============================================================================

/// Board actor. Construct with [`TickerBoard::spawn`].
pub struct TickerBoard {
    mode: BoardMode,
    store: TickerStore,
    hub: Arc<BoardHub>,
    source: Arc<dyn SnapshotSource>,
    feed: Arc<dyn TickerFeed>,
    fetch_tx: mpsc::Sender<FetchOutcome>,
    fetch_task: Option<JoinHandle<()>>,
    active: bool,
    streaming: bool,
    epoch: u64,
}

impl TickerBoard {
    /// Spawn the board task and return its handle.
    ///
    /// `feed_events` must be the receiving end of the channel `feed` emits
    /// into. Must be called from within a Tokio runtime.
    #[must_use]
    pub fn spawn(
        config: TickerBoardConfig,
        source: Arc<dyn SnapshotSource>,
        feed: Arc<dyn TickerFeed>,
        feed_events: mpsc::Receiver<StreamEvent>,
    ) -> BoardHandle {
        let hub = Arc::new(BoardHub::new(config.broadcast));
        let (commands_tx, commands_rx) = mpsc::channel(config.command_capacity.max(1));
        let (fetch_tx, fetch_rx) = mpsc::channel(4);

        let board = Self {
            mode: config.mode,
            store: TickerStore::new(),
            hub: Arc::clone(&hub),
            source,
            feed,
            fetch_tx,
            fetch_task: None,
            active: false,
            streaming: false,
            epoch: 0,
        };

        let connectivity = board.feed.connectivity();
        let task = tokio::spawn(board.run(commands_rx, fetch_rx, feed_events, connectivity));

        BoardHandle {
            commands: commands_tx,
            hub,
            task: Arc::new(Mutex::new(Some(task))),
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut fetches: mpsc::Receiver<FetchOutcome>,
        mut feed_events: mpsc::Receiver<StreamEvent>,
        mut connectivity: watch::Receiver<bool>,
    ) {
        tracing::info!(mode = ?self.mode, "Ticker board started");
        self.on_connectivity(*connectivity.borrow_and_update());
        let mut poll: Option<Interval> = None;
        let mut feed_open = true;
        let mut connectivity_open = true;

        loop {
            tokio::select! {
                command = commands.recv() => {
                    match command {
                        None | Some(Command::Shutdown) => break,
                        Some(command) => self.handle_command(command),
                    }
                    self.sync_poll(&mut poll);
                }
                Some(outcome) = fetches.recv() => self.on_fetch(outcome),
                event = feed_events.recv(), if feed_open => {
                    match event {
                        Some(event) => self.on_feed_event(event),
                        None => {
                            tracing::debug!("Feed event channel closed");
                            feed_open = false;
                        }
                    }
                }
                changed = connectivity.changed(), if connectivity_open => {
                    match changed {
                        Ok(()) => {
                            let connected = *connectivity.borrow_and_update();
                            self.on_connectivity(connected);
                        }
                        Err(_) => connectivity_open = false,
                    }
                }
                () = next_poll(&mut poll) => self.start_fetch(),
            }
        }

        self.deactivate();
        tracing::info!("Ticker board stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Activate => self.activate(),
            Command::Deactivate => self.deactivate(),
            Command::SetSort { column, reply } => {
                let state = self.store.set_sort(column);
                tracing::debug!(sort = %state, "Sort changed");
                self.publish(None);
                let _ = reply.send(state);
            }
            Command::Refresh => {
                if self.active {
                    self.start_fetch();
                } else {
                    tracing::debug!("Refresh ignored while inactive");
                }
            }
            Command::Reconnect => {
                if self.active && self.streaming {
                    self.feed.reconnect();
                } else {
                    tracing::debug!("Reconnect ignored until a snapshot is loaded");
                }
            }
            Command::Shutdown => {}
        }
    }

    fn activate(&mut self) {
        if self.active {
            tracing::debug!("Board already active");
            return;
        }
        self.active = true;
        self.streaming = false;
        self.epoch += 1;
        tracing::info!(epoch = self.epoch, retained = self.store.len(), "Board activated");

        self.publish(None);
        self.start_fetch();
    }

    fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.epoch += 1;
        if let Some(task) = self.fetch_task.take() {
            task.abort();
        }
        if self.streaming {
            self.streaming = false;
            self.feed.stop();
        }
        tracing::info!(retained = self.store.len(), "Board deactivated");
    }

    fn start_fetch(&mut self) {
        if let Some(task) = self.fetch_task.take() {
            task.abort();
        }

        let epoch = self.epoch;
        let source = Arc::clone(&self.source);
        let tx = self.fetch_tx.clone();
        self.fetch_task = Some(tokio::spawn(async move {
            let result = source.fetch_all().await;
            let _ = tx.send(FetchOutcome { epoch, result }).await;
        }));
    }

    fn on_fetch(&mut self, outcome: FetchOutcome) {
        if !self.active || outcome.epoch != self.epoch {
            tracing::debug!(
                epoch = outcome.epoch,
                current = self.epoch,
                "Discarding stale snapshot result"
            );
            return;
        }
        self.fetch_task = None;

        match outcome.result {
            Ok(records) => {
                self.store.load_snapshot(records);
                metrics::set_tickers(self.store.len());
                tracing::info!(count = self.store.len(), "Snapshot loaded");
                self.publish(None);

                if matches!(self.mode, BoardMode::Streaming) && !self.streaming {
                    self.streaming = true;
                    self.feed.start();
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Snapshot unavailable");
                let _ = self.hub.send_error(BoardError::Snapshot(e));
            }
        }
    }

    fn on_feed_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Ticker(record) => {
                if !(self.active && self.streaming) {
                    metrics::record_update_dropped(DropReason::Inactive);
                    return;
                }
                match self.store.apply_update(record.clone()) {
                    Some(row) => {
                        metrics::record_update_applied();
                        self.publish(Some(row));
                        let _ = self.hub.send_delta(record);
                    }
                    None => {
                        metrics::record_update_dropped(DropReason::UnknownSymbol);
                        tracing::trace!(market = %record.market, "Dropping update for unknown market");
                    }
                }
            }
            StreamEvent::Unavailable { attempts } => {
                if self.active {
                    let _ = self.hub.send_error(BoardError::StreamUnavailable { attempts });
                }
            }
        }
    }

    fn on_connectivity(&self, connected: bool) {
        if self.hub.set_connectivity(connected) {
            tracing::info!(connected, "Stream connectivity changed");
        }
    }

    fn publish(&self, changed: Option<usize>) {
        self.hub.publish_view(BoardView {
            records: Arc::from(self.store.records()),
            sort: self.store.sort_state(),
            changed,
        });
    }

    fn sync_poll(&self, poll: &mut Option<Interval>) {
        match (self.mode, self.active) {
            (BoardMode::Polling { interval }, true) if poll.is_none() => {
                let period = interval.max(Duration::from_millis(1));
                let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                *poll = Some(ticker);
            }
            (_, false) => *poll = None,
            _ => {}
        }
    }
}

async fn next_poll(poll: &mut Option<Interval>) {
    match poll {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::time::timeout;
    use tokio_stream::StreamExt;

    use super::*;
    use crate::application::ports::{MockSnapshotSource, MockTickerFeed};
    use crate::domain::ticker::ChangeDirection;

    const WAIT: Duration = Duration::from_secs(2);

    fn ticker(market: &str, value: f64) -> TickerRecord {
        TickerRecord {
            market: market.to_string(),
            change: ChangeDirection::Rise,
            trade_price: value,
            signed_change_rate: 0.0,
            signed_change_price: 0.0,
            acc_trade_price: value,
        }
    }

    fn snapshot_source(records: Vec<TickerRecord>) -> MockSnapshotSource {
        let mut source = MockSnapshotSource::new();
        source
            .expect_fetch_all()
            .returning(move || Ok(records.clone()));
        source
    }

    fn counting_feed(starts: Arc<AtomicUsize>, stops: Arc<AtomicUsize>) -> MockTickerFeed {
        let mut feed = MockTickerFeed::new();
        feed.expect_start().returning(move || {
            starts.fetch_add(1, Ordering::SeqCst);
        });
        feed.expect_stop().returning(move || {
            stops.fetch_add(1, Ordering::SeqCst);
        });
        feed.expect_reconnect().return_const(());
        feed.expect_connectivity().returning(detached_connectivity);
        feed
    }

    fn detached_connectivity() -> watch::Receiver<bool> {
        watch::channel(false).1
    }

    fn quiet_feed_with(connectivity: watch::Receiver<bool>) -> MockTickerFeed {
        let mut feed = MockTickerFeed::new();
        feed.expect_connectivity().return_once(move || connectivity);
        feed
    }

    fn quiet_feed() -> MockTickerFeed {
        let mut feed = MockTickerFeed::new();
        feed.expect_connectivity().returning(detached_connectivity);
        feed
    }

    async fn wait_for_markets(handle: &BoardHandle, expected: &[&str]) -> BoardView {
        let mut rx = handle.view_receiver();
        let view = timeout(WAIT, rx.wait_for(|v| v.markets() == expected))
            .await
            .expect("timed out waiting for view")
            .expect("board closed")
            .clone();
        view
    }

    async fn wait_until(condition: impl Fn() -> bool) {
        timeout(WAIT, async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached");
    }

    #[tokio::test]
    async fn snapshot_then_stream_updates_reorder() {
        let starts = Arc::new(AtomicUsize::new(0));
        let stops = Arc::new(AtomicUsize::new(0));
        let (feed_tx, feed_rx) = mpsc::channel(16);

        let handle = TickerBoard::spawn(
            TickerBoardConfig::default(),
            Arc::new(snapshot_source(vec![
                ticker("KRW-BTC", 100.0),
                ticker("KRW-ETH", 200.0),
            ])),
            Arc::new(counting_feed(Arc::clone(&starts), Arc::clone(&stops))),
            feed_rx,
        );

        handle.activate().await.unwrap();
        wait_for_markets(&handle, &["KRW-ETH", "KRW-BTC"]).await;
        wait_until(|| starts.load(Ordering::SeqCst) == 1).await;

        let mut deltas = handle.deltas();
        feed_tx
            .send(StreamEvent::Ticker(ticker("KRW-BTC", 300.0)))
            .await
            .unwrap();
        let view = wait_for_markets(&handle, &["KRW-BTC", "KRW-ETH"]).await;
        assert_eq!(view.changed, Some(0));

        let delta = timeout(WAIT, deltas.next()).await.unwrap().unwrap().unwrap();
        assert_eq!(delta.market, "KRW-BTC");

        handle.shutdown().await;
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_symbol_updates_are_dropped() {
        let (feed_tx, feed_rx) = mpsc::channel(16);
        let starts = Arc::new(AtomicUsize::new(0));
        let handle = TickerBoard::spawn(
            TickerBoardConfig::default(),
            Arc::new(snapshot_source(vec![
                ticker("KRW-BTC", 100.0),
                ticker("KRW-ETH", 200.0),
            ])),
            Arc::new(counting_feed(Arc::clone(&starts), Arc::default())),
            feed_rx,
        );

        handle.activate().await.unwrap();
        wait_for_markets(&handle, &["KRW-ETH", "KRW-BTC"]).await;
        wait_until(|| starts.load(Ordering::SeqCst) == 1).await;

        feed_tx
            .send(StreamEvent::Ticker(ticker("KRW-XRP", 999.0)))
            .await
            .unwrap();
        // A known update afterwards proves the unknown one was processed first.
        feed_tx
            .send(StreamEvent::Ticker(ticker("KRW-ETH", 250.0)))
            .await
            .unwrap();

        let mut rx = handle.view_receiver();
        let view = timeout(WAIT, rx.wait_for(|v| v.changed.is_some()))
            .await
            .unwrap()
            .unwrap()
            .clone();
        assert_eq!(view.len(), 2);
        assert_eq!(view.markets(), ["KRW-ETH", "KRW-BTC"]);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn failed_snapshot_reports_error_and_never_starts_feed() {
        let mut source = MockSnapshotSource::new();
        source
            .expect_fetch_all()
            .returning(|| Err(FetchError::RateLimited));
        let mut feed = quiet_feed();
        feed.expect_start().never();
        feed.expect_stop().never();

        let (_feed_tx, feed_rx) = mpsc::channel(16);
        let handle = TickerBoard::spawn(
            TickerBoardConfig::default(),
            Arc::new(source),
            Arc::new(feed),
            feed_rx,
        );

        let mut errors = handle.errors();
        handle.activate().await.unwrap();

        let error = timeout(WAIT, errors.next()).await.unwrap().unwrap().unwrap();
        assert_eq!(error, BoardError::Snapshot(FetchError::RateLimited));
        assert!(handle.latest_view().is_empty());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn updates_before_snapshot_are_ignored() {
        let (feed_tx, feed_rx) = mpsc::channel(16);
        let mut feed = quiet_feed();
        feed.expect_start().never();
        feed.expect_stop().never();

        let handle = TickerBoard::spawn(
            TickerBoardConfig::default(),
            Arc::new(MockSnapshotSource::new()),
            Arc::new(feed),
            feed_rx,
        );

        feed_tx
            .send(StreamEvent::Ticker(ticker("KRW-BTC", 1.0)))
            .await
            .unwrap();
        let state = handle.set_sort(SortColumn::Price).await.unwrap();
        assert_eq!(state.column(), SortColumn::Price);
        assert!(handle.latest_view().is_empty());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn sort_commands_cycle_and_publish() {
        let (_feed_tx, feed_rx) = mpsc::channel(16);
        let handle = TickerBoard::spawn(
            TickerBoardConfig::default(),
            Arc::new(snapshot_source(vec![
                TickerRecord {
                    trade_price: 10.0,
                    ..ticker("KRW-BTC", 100.0)
                },
                TickerRecord {
                    trade_price: 5.0,
                    ..ticker("KRW-ETH", 200.0)
                },
            ])),
            Arc::new(counting_feed(Arc::default(), Arc::default())),
            feed_rx,
        );

        handle.activate().await.unwrap();
        wait_for_markets(&handle, &["KRW-ETH", "KRW-BTC"]).await;

        let state = handle.set_sort(SortColumn::Price).await.unwrap();
        assert_eq!(state, SortState::default().select(SortColumn::Price));
        assert_eq!(handle.latest_view().markets(), ["KRW-BTC", "KRW-ETH"]);

        handle.set_sort(SortColumn::Price).await.unwrap();
        assert_eq!(handle.latest_view().markets(), ["KRW-ETH", "KRW-BTC"]);

        let state = handle.set_sort(SortColumn::Price).await.unwrap();
        assert!(state.is_default());
        assert_eq!(handle.latest_view().markets(), ["KRW-ETH", "KRW-BTC"]);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn deactivate_stops_feed_and_keeps_table() {
        let starts = Arc::new(AtomicUsize::new(0));
        let stops = Arc::new(AtomicUsize::new(0));
        let (feed_tx, feed_rx) = mpsc::channel(16);
        let handle = TickerBoard::spawn(
            TickerBoardConfig::default(),
            Arc::new(snapshot_source(vec![ticker("KRW-BTC", 100.0)])),
            Arc::new(counting_feed(Arc::clone(&starts), Arc::clone(&stops))),
            feed_rx,
        );

        handle.activate().await.unwrap();
        wait_until(|| starts.load(Ordering::SeqCst) == 1).await;

        handle.deactivate().await.unwrap();
        wait_until(|| stops.load(Ordering::SeqCst) == 1).await;

        feed_tx
            .send(StreamEvent::Ticker(ticker("KRW-BTC", 500.0)))
            .await
            .unwrap();
        handle.set_sort(SortColumn::None).await.unwrap();
        let view = handle.latest_view();
        assert_eq!(view.len(), 1);
        assert!((view.records[0].trade_price - 100.0).abs() < f64::EPSILON);

        // Re-activation starts the feed again after a fresh snapshot.
        handle.activate().await.unwrap();
        wait_until(|| starts.load(Ordering::SeqCst) == 2).await;

        handle.shutdown().await;
        assert_eq!(stops.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn connectivity_and_unavailable_are_forwarded() {
        let (connected_tx, connected_rx) = watch::channel(false);
        let mut feed = quiet_feed_with(connected_rx);
        feed.expect_start().return_const(());
        feed.expect_stop().return_const(());

        let (feed_tx, feed_rx) = mpsc::channel(16);
        let handle = TickerBoard::spawn(
            TickerBoardConfig::default(),
            Arc::new(snapshot_source(vec![ticker("KRW-BTC", 1.0)])),
            Arc::new(feed),
            feed_rx,
        );
        let mut errors = handle.errors();
        handle.activate().await.unwrap();

        connected_tx.send_replace(true);
        let mut connectivity = handle.connectivity();
        timeout(WAIT, async {
            while let Some(connected) = connectivity.next().await {
                if connected {
                    break;
                }
            }
        })
        .await
        .unwrap();
        assert!(handle.is_connected());

        feed_tx
            .send(StreamEvent::Unavailable { attempts: 4 })
            .await
            .unwrap();
        let error = timeout(WAIT, errors.next()).await.unwrap().unwrap().unwrap();
        assert_eq!(error, BoardError::StreamUnavailable { attempts: 4 });

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn disconnect_reaches_board_while_events_are_backed_up() {
        let (connected_tx, connected_rx) = watch::channel(true);
        let mut feed = quiet_feed_with(connected_rx);
        feed.expect_start().return_const(());
        feed.expect_stop().return_const(());

        let (feed_tx, feed_rx) = mpsc::channel(1);
        let handle = TickerBoard::spawn(
            TickerBoardConfig::default(),
            Arc::new(MockSnapshotSource::new()),
            Arc::new(feed),
            feed_rx,
        );
        let mut connectivity = handle.connectivity();
        timeout(WAIT, async {
            while let Some(connected) = connectivity.next().await {
                if connected {
                    break;
                }
            }
        })
        .await
        .unwrap();

        // Keep the event queue full while the stream drops.
        feed_tx
            .send(StreamEvent::Ticker(ticker("KRW-BTC", 1.0)))
            .await
            .unwrap();
        let _ = feed_tx.try_send(StreamEvent::Ticker(ticker("KRW-BTC", 2.0)));
        connected_tx.send_replace(false);

        timeout(WAIT, async {
            while let Some(connected) = connectivity.next().await {
                if !connected {
                    break;
                }
            }
        })
        .await
        .unwrap();
        assert!(!handle.is_connected());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn polling_mode_refetches_without_feed() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fetches);
        let mut source = MockSnapshotSource::new();
        source.expect_fetch_all().returning(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(vec![ticker("KRW-BTC", 1.0)])
        });
        let mut feed = quiet_feed();
        feed.expect_start().never();
        feed.expect_stop().never();

        let (_feed_tx, feed_rx) = mpsc::channel(16);
        let handle = TickerBoard::spawn(
            TickerBoardConfig {
                mode: BoardMode::Polling {
                    interval: Duration::from_millis(20),
                },
                ..TickerBoardConfig::default()
            },
            Arc::new(source),
            Arc::new(feed),
            feed_rx,
        );

        handle.activate().await.unwrap();
        wait_until(|| fetches.load(Ordering::SeqCst) >= 3).await;

        handle.deactivate().await.unwrap();
        handle.set_sort(SortColumn::None).await.unwrap();
        let after = fetches.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(fetches.load(Ordering::SeqCst) <= after + 1);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn commands_after_shutdown_fail() {
        let (_feed_tx, feed_rx) = mpsc::channel(16);
        let handle = TickerBoard::spawn(
            TickerBoardConfig::default(),
            Arc::new(MockSnapshotSource::new()),
            Arc::new(quiet_feed()),
            feed_rx,
        );
        handle.shutdown().await;

        assert_eq!(handle.activate().await, Err(BoardError::Closed));
        assert_eq!(
            handle.set_sort(SortColumn::Price).await,
            Err(BoardError::Closed)
        );
    }
}
