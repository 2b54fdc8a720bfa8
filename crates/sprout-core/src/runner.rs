//! The farm run loop.
//!
//! [`run_farm`] is the top-level async function driving one process:
//!
//! - **Growth**: a fixed interval feeds whole ticks to the active session
//! - **Identity**: login and logout end the current session (final save,
//!   timer cancelled, state dropped) and start the next one
//! - **Commands**: player actions arrive on an `mpsc` channel
//! - **Shutdown**: `Quit` or a closed channel ends the session and returns
//!   a [`RunSummary`]

use std::sync::Arc;
use std::time::Duration;

use sprout_db::DocumentStore;
use sprout_types::{TileId, UserId};
use sprout_world::CropCatalog;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::clock::{Clock, ClockError, TickSource};
use crate::identity::Identity;
use crate::session::{Session, SessionSettings};

/// Errors that can occur during the run loop.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The tick source could not be built or overflowed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// A player or operator request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FarmCommand {
    /// Plant a crop on an empty tile.
    Plant {
        /// Target tile.
        tile: TileId,
        /// Catalog name of the crop.
        crop: String,
    },
    /// Harvest a growing tile early.
    Harvest {
        /// Target tile.
        tile: TileId,
    },
    /// Clear a tile.
    Remove {
        /// Target tile.
        tile: TileId,
    },
    /// Sell crops for gold.
    Sell {
        /// Catalog name of the crop.
        crop: String,
        /// Units to sell.
        quantity: u64,
    },
    /// Save immediately.
    Save,
    /// Log the current farm state.
    Status,
    /// Switch to another user.
    Login(UserId),
    /// Log out the current user.
    Logout,
    /// Stop the loop.
    Quit,
}

/// Shared dependencies of the run loop.
#[derive(Debug)]
pub struct FarmContext<S: DocumentStore> {
    /// Where documents live.
    pub store: Arc<S>,
    /// The crop catalog.
    pub catalog: Arc<CropCatalog>,
    /// Source of wall-clock time.
    pub clock: Arc<dyn Clock>,
    /// Session parameters.
    pub settings: SessionSettings,
    /// Real-time milliseconds per growth tick.
    pub tick_interval_ms: u64,
    /// Most ticks replayed after the loop stalls.
    pub max_catch_up_ticks: u32,
}

/// Totals for one run of the loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Sessions started.
    pub sessions: u64,
    /// Growth ticks applied to a session.
    pub ticks: u64,
    /// Units auto-harvested during those ticks.
    pub harvested: u64,
    /// Commands that succeeded.
    pub commands_applied: u64,
    /// Commands rejected by the farm rules or with no session.
    pub commands_rejected: u64,
    /// Immediate saves (manual or session end) that failed.
    pub failed_saves: u64,
}

/// Run the farm until `Quit` arrives or the command channel closes.
///
/// # Errors
///
/// Returns [`RunnerError`] if the tick source cannot be built or overflows.
pub async fn run_farm<S: DocumentStore>(
    context: FarmContext<S>,
    identity: Identity,
    mut commands: mpsc::Receiver<FarmCommand>,
) -> Result<RunSummary, RunnerError> {
    let mut summary = RunSummary::default();
    let mut ticks = TickSource::new(
        context.tick_interval_ms,
        context.max_catch_up_ticks,
        context.clock.now_ms(),
    )?;

    let mut interval = tokio::time::interval(Duration::from_millis(context.tick_interval_ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut users = identity.subscribe();
    let initial = users.borrow_and_update().clone();
    let mut session = match initial {
        Some(user) => Some(open(&context, user, &mut summary).await),
        None => None,
    };

    info!(
        tick_interval_ms = context.tick_interval_ms,
        logged_in = session.is_some(),
        "Farm loop starting"
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let due = ticks.poll(context.clock.now_ms())?;
                if let Some(active) = session.as_mut() {
                    for _ in 0..due {
                        let report = active.tick().await;
                        summary.ticks = summary.ticks.saturating_add(1);
                        summary.harvested = summary.harvested.saturating_add(report.total());
                    }
                }
            }
            changed = users.changed() => {
                if changed.is_err() {
                    break;
                }
                let next = users.borrow_and_update().clone();
                if let Some(previous) = session.take() {
                    close(previous, &mut summary).await;
                }
                if let Some(user) = next {
                    session = Some(open(&context, user, &mut summary).await);
                }
            }
            command = commands.recv() => {
                match command {
                    None | Some(FarmCommand::Quit) => break,
                    Some(FarmCommand::Login(user)) => identity.login(user),
                    Some(FarmCommand::Logout) => identity.logout(),
                    Some(other) => {
                        let applied = match session.as_mut() {
                            Some(active) => apply(active, other, &mut summary).await,
                            None => {
                                warn!(command = ?other, "no user logged in, command ignored");
                                false
                            }
                        };
                        if applied {
                            summary.commands_applied = summary.commands_applied.saturating_add(1);
                        } else {
                            summary.commands_rejected = summary.commands_rejected.saturating_add(1);
                        }
                    }
                }
            }
        }
    }

    if let Some(active) = session.take() {
        close(active, &mut summary).await;
    }

    info!(
        sessions = summary.sessions,
        ticks = summary.ticks,
        harvested = summary.harvested,
        "Farm loop stopped"
    );
    Ok(summary)
}

async fn open<S: DocumentStore>(
    context: &FarmContext<S>,
    user: UserId,
    summary: &mut RunSummary,
) -> Session<S> {
    let (session, report) = Session::start(
        user,
        Arc::clone(&context.store),
        Arc::clone(&context.catalog),
        Arc::clone(&context.clock),
        context.settings,
    )
    .await;
    summary.sessions = summary.sessions.saturating_add(1);
    info!(
        session = %session.id(),
        user = %session.user(),
        origin = ?report.origin,
        offline_secs = report.offline_secs,
        "Session started"
    );
    session
}

async fn close<S: DocumentStore>(session: Session<S>, summary: &mut RunSummary) {
    if session.end().await.is_err() {
        summary.failed_saves = summary.failed_saves.saturating_add(1);
    }
}

/// Apply one command to the active session. Returns whether it succeeded.
async fn apply<S: DocumentStore>(
    session: &mut Session<S>,
    command: FarmCommand,
    summary: &mut RunSummary,
) -> bool {
    let result = match command {
        FarmCommand::Plant { tile, crop } => session.plant(tile, &crop).await,
        FarmCommand::Harvest { tile } => session.manual_harvest(tile).await.map(|_| ()),
        FarmCommand::Remove { tile } => session.remove_tile(tile).await,
        FarmCommand::Sell { crop, quantity } => session.sell(&crop, quantity).await.map(|sale| {
            info!(crop = %sale.crop, quantity = sale.quantity, gold = sale.gold_earned, "Sold");
        }),
        FarmCommand::Save => {
            return match session.save().await {
                Ok(()) => {
                    info!(session = %session.id(), "Saved");
                    true
                }
                Err(e) => {
                    warn!(session = %session.id(), error = %e, "Manual save failed, changes kept");
                    summary.failed_saves = summary.failed_saves.saturating_add(1);
                    false
                }
            };
        }
        FarmCommand::Status => {
            log_status(session);
            return true;
        }
        FarmCommand::Login(_) | FarmCommand::Logout | FarmCommand::Quit => return false,
    };

    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(session = %session.id(), error = %e, "Command rejected");
            false
        }
    }
}

fn log_status<S: DocumentStore>(session: &Session<S>) {
    let stats = session.scheduler().stats();
    info!(
        user = %session.user(),
        gold = session.gold(),
        planted = session.tiles().planted_count(),
        held = session.inventory().total(),
        pending_changes = session.scheduler().pending(),
        saves = stats.successes,
        save_failures = stats.failures,
        last_error = stats.last_error.as_deref().unwrap_or("none"),
        "Status"
    );
    for (crop, quantity) in session.inventory().iter() {
        info!(crop = %crop, quantity, "Inventory");
    }
}
