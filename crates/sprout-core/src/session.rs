//! One logged-in user's farm.
//!
//! A [`Session`] is created on login by [`Session::start`] and consumed on
//! logout by [`Session::end`]. It exclusively owns the tile grid, inventory,
//! and wallet, and it decides with its [`SaveScheduler`] when to write them
//! back to the [`DocumentStore`].
//!
//! # Save Triggers
//!
//! | Event | Trigger |
//! |-------|---------|
//! | Auto-harvest during a tick | [`SaveTrigger::Batch`] (once per tick) |
//! | Plant, manual harvest, remove | [`SaveTrigger::Batch`] |
//! | Sell | [`SaveTrigger::Smart`] |
//! | Manual save, session end, offline catch-up, first login | [`SaveTrigger::Immediate`] |
//!
//! Automatic flushes run on a spawned task over a snapshot taken when the
//! flush starts, so play continues while the write is outstanding.
//! Immediate flushes first wait for any outstanding write, then write and
//! wait for the result.

use std::collections::BTreeMap;
use std::sync::Arc;

use sprout_db::{DocumentStore, StoreError};
use sprout_types::{GameDocument, SessionId, Tile, TileId, UserId};
use sprout_world::growth::{self, HarvestEvent, TickReport};
use sprout_world::{CropCatalog, FarmError, Inventory, Sale, TileStore, market, reconcile};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::{FarmConfig, SaveConfig};
use crate::scheduler::{FlushOutcome, FlushTicket, SaveDecision, SaveScheduler, SaveTrigger};

/// Errors that can occur while persisting a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The document store rejected a read or write.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },

    /// The stored farm was never read, so writing could overwrite it.
    #[error("farm {key} was not loaded, refusing to overwrite it")]
    NotLoaded {
        /// Document key that could not be confirmed.
        key: String,
    },

    /// A background flush task panicked or was cancelled.
    #[error("flush task failed: {reason}")]
    FlushTask {
        /// Explanation reported by the runtime.
        reason: String,
    },
}

/// Fixed parameters of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Rows of a new grid.
    pub rows: u32,
    /// Columns of every grid; positions derive from this.
    pub columns: u32,
    /// Gold of a brand-new farm.
    pub starting_gold: u64,
    /// Save scheduler thresholds.
    pub save: SaveConfig,
}

impl SessionSettings {
    /// Take the session parameters from a loaded configuration.
    pub const fn from_config(config: &FarmConfig) -> Self {
        Self {
            rows: config.grid.rows,
            columns: config.grid.columns,
            starting_gold: config.economy.starting_gold,
            save: config.save,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&FarmConfig::default())
    }
}

/// Where a session's starting state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    /// No document existed; a new farm was created and written.
    Created,
    /// An existing document was loaded and caught up.
    Loaded,
    /// The document could not be read; a new farm is used and nothing is
    /// written until the store confirms no farm exists.
    Fallback,
}

/// What happened while starting a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Where the starting state came from.
    pub origin: LoadOrigin,
    /// Whole seconds replayed by offline catch-up.
    pub offline_secs: u64,
    /// Crops harvested while offline, already credited.
    pub offline_harvests: BTreeMap<String, u64>,
}

/// A flush running on a spawned task.
#[derive(Debug)]
struct PendingFlush {
    ticket: FlushTicket,
    handle: JoinHandle<Result<(), StoreError>>,
}

/// A running farm session for one user.
#[derive(Debug)]
pub struct Session<S: DocumentStore> {
    id: SessionId,
    user: UserId,
    key: String,
    tiles: TileStore,
    inventory: Inventory,
    gold: u64,
    catalog: Arc<CropCatalog>,
    scheduler: SaveScheduler,
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    in_flight: Option<PendingFlush>,
    /// Whether the stored copy was read (or known absent) and may be replaced.
    writable: bool,
}

impl<S: DocumentStore> Session<S> {
    /// Log `user` in: load their document, catch up offline growth, and
    /// persist whatever the load changed.
    ///
    /// Never fails. A missing document creates a new farm and writes it. A
    /// document that cannot be read or decoded falls back to a new farm that
    /// is never written over an existing stored copy.
    pub async fn start(
        user: UserId,
        store: Arc<S>,
        catalog: Arc<CropCatalog>,
        clock: Arc<dyn Clock>,
        settings: SessionSettings,
    ) -> (Self, LoadReport) {
        let id = SessionId::new();
        let key = user.document_key();
        let loaded = store.get(&key).await;
        let now = clock.now_ms();

        let mut session = Self {
            id,
            user,
            key,
            tiles: TileStore::new(settings.rows, settings.columns),
            inventory: Inventory::new(),
            gold: settings.starting_gold,
            catalog,
            scheduler: SaveScheduler::new(&settings.save, now),
            store,
            clock,
            in_flight: None,
            writable: true,
        };

        let mut report = LoadReport {
            origin: LoadOrigin::Loaded,
            offline_secs: 0,
            offline_harvests: BTreeMap::new(),
        };

        match loaded {
            Ok(None) => {
                report.origin = LoadOrigin::Created;
                info!(session = %session.id, user = %session.user, "no saved farm, creating a new one");
                session.persist_now("first login").await;
            }
            Ok(Some(document)) => {
                session.restore(document, now, &mut report);
                if report.offline_harvests.is_empty() {
                    info!(session = %session.id, user = %session.user, "farm loaded");
                } else {
                    info!(
                        session = %session.id,
                        user = %session.user,
                        offline_secs = report.offline_secs,
                        harvested = report.offline_harvests.values().fold(0_u64, |acc, n| acc.saturating_add(*n)),
                        "farm loaded with offline progress"
                    );
                    session.persist_now("offline catch-up").await;
                }
            }
            Err(e) => {
                report.origin = LoadOrigin::Fallback;
                session.writable = false;
                warn!(
                    session = %session.id,
                    user = %session.user,
                    error = %e,
                    "failed to load farm, starting from defaults"
                );
            }
        }

        (session, report)
    }

    /// Adopt a loaded document, replaying the offline gap.
    ///
    /// Tiles are collapsed by id before the replay so a record repeated in
    /// the document is only credited once.
    fn restore(&mut self, document: GameDocument, now: i64, report: &mut LoadReport) {
        let columns = self.tiles.columns();
        let decoded = TileStore::from_tiles(columns, document.decode_tiles(columns));
        let decoded = if decoded.is_empty() {
            self.tiles.clone().into_tiles()
        } else {
            decoded.into_tiles()
        };

        let tiles = match document.last_updated {
            Some(last_updated) => {
                let caught_up = reconcile(decoded, last_updated, now);
                report.offline_secs = caught_up.elapsed_secs;
                report.offline_harvests = caught_up.harvests;
                caught_up.tiles
            }
            None => decoded,
        };

        self.tiles = TileStore::from_tiles(columns, tiles);
        self.inventory = Inventory::from_map(document.inventory);
        self.gold = document.gold;

        if let Err(e) = self.inventory.credit_all(&report.offline_harvests) {
            warn!(session = %self.id, error = %e, "offline harvest credit overflowed");
        }
    }

    // =========================================================================
    // Player actions
    // =========================================================================

    /// Advance growth by one second and run due flushes.
    pub async fn tick(&mut self) -> TickReport {
        self.reap().await;

        let report = growth::tick(&mut self.tiles, &mut self.inventory);
        if !report.is_empty() {
            self.record_change(SaveTrigger::Batch);
        }

        if self.scheduler.tick(self.clock.now_ms()) {
            self.spawn_flush();
        }
        report
    }

    /// Plant `crop` on an empty tile.
    ///
    /// # Errors
    ///
    /// Returns the [`FarmError`] explaining why nothing was planted.
    pub async fn plant(&mut self, tile: TileId, crop: &str) -> Result<(), FarmError> {
        self.reap().await;
        growth::plant(&mut self.tiles, &self.catalog, tile, crop)?;
        self.record_change(SaveTrigger::Batch);
        Ok(())
    }

    /// Harvest a growing tile early.
    ///
    /// # Errors
    ///
    /// Returns the [`FarmError`] explaining why nothing was harvested.
    pub async fn manual_harvest(&mut self, tile: TileId) -> Result<HarvestEvent, FarmError> {
        self.reap().await;
        let event = growth::manual_harvest(&mut self.tiles, &mut self.inventory, tile)?;
        self.record_change(SaveTrigger::Batch);
        Ok(event)
    }

    /// Clear a tile, discarding any growth.
    ///
    /// # Errors
    ///
    /// Returns [`FarmError::TileNotFound`] for an unknown tile.
    pub async fn remove_tile(&mut self, tile: TileId) -> Result<(), FarmError> {
        self.reap().await;
        growth::remove_tile(&mut self.tiles, tile)?;
        self.record_change(SaveTrigger::Batch);
        Ok(())
    }

    /// Sell crops for gold.
    ///
    /// # Errors
    ///
    /// Returns the [`FarmError`] explaining why nothing was sold.
    pub async fn sell(&mut self, crop: &str, quantity: u64) -> Result<Sale, FarmError> {
        self.reap().await;
        let sale = market::sell(
            &self.catalog,
            &mut self.inventory,
            &mut self.gold,
            crop,
            quantity,
        )?;
        self.record_change(SaveTrigger::Smart);
        Ok(sale)
    }

    /// Save right now and wait for the result.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the write fails. The changes stay pending.
    pub async fn save(&mut self) -> Result<(), SessionError> {
        self.scheduler.on_change(SaveTrigger::Immediate, self.clock.now_ms());
        self.flush_now().await
    }

    /// End the session: one final save attempt if anything is unsaved, then
    /// the batch timer is cancelled and all state is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the final write fails or is refused. The
    /// session is gone either way.
    pub async fn end(mut self) -> Result<(), SessionError> {
        let result = if self.scheduler.pending() == 0 && self.in_flight.is_none() {
            Ok(())
        } else {
            self.save().await
        };
        self.scheduler.cancel();
        match &result {
            Ok(()) => info!(session = %self.id, user = %self.user, "session ended"),
            Err(e) => warn!(
                session = %self.id,
                user = %self.user,
                error = %e,
                pending = self.scheduler.pending(),
                "session ended with unsaved changes"
            ),
        }
        result
    }

    /// Wait for any background flush, including follow-ups, to finish.
    pub async fn settle(&mut self) {
        while let Some(pending) = self.in_flight.take() {
            if self.complete(pending).await {
                self.spawn_flush();
            }
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Session identifier for log correlation.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// The logged-in user.
    pub const fn user(&self) -> &UserId {
        &self.user
    }

    /// The tile grid.
    pub const fn tiles(&self) -> &TileStore {
        &self.tiles
    }

    /// One tile by id.
    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id)
    }

    /// Harvested crops held.
    pub const fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Wallet balance.
    pub const fn gold(&self) -> u64 {
        self.gold
    }

    /// The save scheduler, for pending counts and flush statistics.
    pub const fn scheduler(&self) -> &SaveScheduler {
        &self.scheduler
    }

    /// The full document as it would be written at `now_ms`.
    pub fn snapshot(&self, now_ms: i64) -> GameDocument {
        GameDocument::from_parts(self.tiles.iter(), self.inventory.as_map(), self.gold, now_ms)
    }

    // =========================================================================
    // Flushing
    // =========================================================================

    fn record_change(&mut self, trigger: SaveTrigger) {
        let now = self.clock.now_ms();
        match self.scheduler.on_change(trigger, now) {
            SaveDecision::FlushNow => self.spawn_flush(),
            decision => debug!(session = %self.id, ?trigger, ?decision, "change recorded"),
        }
    }

    /// Start a background flush over a snapshot of the current state.
    fn spawn_flush(&mut self) {
        if !self.writable {
            return;
        }
        let now = self.clock.now_ms();
        let Some(ticket) = self.scheduler.begin_flush(now) else {
            return;
        };
        let document = self.snapshot(now);
        let store = Arc::clone(&self.store);
        let key = self.key.clone();

        debug!(session = %self.id, covered = ticket.covered(), "background flush started");
        let handle = tokio::spawn(async move { store.set(&key, &document).await });
        self.in_flight = Some(PendingFlush { ticket, handle });
    }

    /// Collect a finished background flush, starting its follow-up if needed.
    async fn reap(&mut self) {
        let finished = self
            .in_flight
            .as_ref()
            .is_some_and(|pending| pending.handle.is_finished());
        if !finished {
            return;
        }
        if let Some(pending) = self.in_flight.take() {
            if self.complete(pending).await {
                self.spawn_flush();
            }
        }
    }

    /// Await a flush and report it to the scheduler. Returns whether a
    /// follow-up flush is needed.
    async fn complete(&mut self, pending: PendingFlush) -> bool {
        let result = join_result(pending.handle.await);
        let now = self.clock.now_ms();

        if let Err(e) = &result {
            warn!(session = %self.id, error = %e, "background save failed, changes kept");
        }
        let outcome = self
            .scheduler
            .finish_flush(pending.ticket, result.map_err(|e| e.to_string()), now);
        matches!(outcome, FlushOutcome::Saved { follow_up: true })
    }

    /// Write the full state now, after any outstanding write.
    async fn flush_now(&mut self) -> Result<(), SessionError> {
        if !self.confirm_writable().await {
            return Err(SessionError::NotLoaded {
                key: self.key.clone(),
            });
        }
        if let Some(pending) = self.in_flight.take() {
            // The write below carries everything the follow-up would.
            self.complete(pending).await;
        }

        let now = self.clock.now_ms();
        let Some(ticket) = self.scheduler.begin_flush(now) else {
            return Ok(());
        };
        let document = self.snapshot(now);
        let result = self.store.set(&self.key, &document).await;
        let finished = self.clock.now_ms();

        match result {
            Ok(()) => {
                self.scheduler.finish_flush(ticket, Ok(()), finished);
                debug!(session = %self.id, covered = ticket.covered(), "saved");
                Ok(())
            }
            Err(e) => {
                self.scheduler
                    .finish_flush(ticket, Err(e.to_string()), finished);
                Err(e.into())
            }
        }
    }

    /// After a failed load, read the store again. Writing is only allowed
    /// once it reports that no farm is stored.
    async fn confirm_writable(&mut self) -> bool {
        if self.writable {
            return true;
        }
        match self.store.get(&self.key).await {
            Ok(None) => {
                info!(session = %self.id, user = %self.user, "no stored farm, saving enabled");
                self.writable = true;
            }
            Ok(Some(_)) => warn!(
                session = %self.id,
                user = %self.user,
                "stored farm was never loaded, refusing to overwrite it"
            ),
            Err(e) => warn!(
                session = %self.id,
                user = %self.user,
                error = %e,
                "store still unreadable, refusing to save"
            ),
        }
        self.writable
    }

    /// Immediate save during start-up; failures are logged, not returned.
    async fn persist_now(&mut self, reason: &'static str) {
        self.scheduler.on_change(SaveTrigger::Immediate, self.clock.now_ms());
        if let Err(e) = self.flush_now().await {
            warn!(session = %self.id, reason, error = %e, "save failed, changes kept");
        }
    }
}

/// Flatten a joined flush task into a store result.
fn join_result(
    joined: Result<Result<(), StoreError>, tokio::task::JoinError>,
) -> Result<(), SessionError> {
    match joined {
        Ok(result) => result.map_err(SessionError::from),
        Err(e) => Err(SessionError::FlushTask {
            reason: e.to_string(),
        }),
    }
}
