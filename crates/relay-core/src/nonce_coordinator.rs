//! Per-wallet single-writer nonce actor. Spec §4.2.
//!
//! Grounded on the teacher's per-wallet-actor pattern (`sig_down`'s own
//! mailbox-task style, generalized here to own mutable pool state instead of
//! a cancellation token): one cooperative task per wallet index owns the
//! pool exclusively and serializes every mutation through an mpsc mailbox,
//! which is what makes nonce double-assignment structurally impossible
//! rather than merely unlikely.

use relay_chain_stacks::StacksChainClient;
use relay_types::chain::ChainClient;
use relay_types::nonce::{AssignedNonce, NoncePoolStats, POOL_SIZE, ReservedNonce, ResetMode};
use relay_types::timestamp::UnixTimestamp;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Reconcile runs every 5 minutes. Spec §4.2 "Scheduled alarm".
const RECONCILE_INTERVAL: Duration = Duration::from_secs(300);
/// `resyncDelayed` fires 2 s after being scheduled. Spec §4.2.
const RESYNC_DELAY: Duration = Duration::from_secs(2);
/// Idle window after which an ahead-of-chain pool is hard-reset. Spec §4.2.
const IDLE_HARD_RESET_AFTER: Duration = Duration::from_secs(600);

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum NonceError {
    #[error("no nonce available and the indexer is unreachable")]
    NonceDoUnavailable,
    #[error("nonce coordinator actor is gone")]
    ActorGone,
}

enum Command {
    Assign { request_id: Uuid, reply: oneshot::Sender<Result<AssignedNonce, NonceError>> },
    Consume { nonce: u64, fee: u64 },
    Release { nonce: u64 },
    Reconcile,
    Reset { mode: ResetMode },
    RecordConflict,
    Stats { reply: oneshot::Sender<NoncePoolStats> },
}

struct WalletPool {
    wallet_index: u32,
    address: String,
    chain: Arc<StacksChainClient>,
    available: VecDeque<u64>,
    reserved: HashMap<u64, ReservedNonce>,
    last_executed_nonce: Option<u64>,
    last_chain_sync: UnixTimestamp,
    last_activity: UnixTimestamp,
    stats: NoncePoolStats,
}

impl WalletPool {
    async fn refill(&mut self) -> Result<(), NonceError> {
        if !self.available.is_empty() {
            return Ok(());
        }
        let floor = self
            .chain
            .get_possible_next_nonce(&self.address)
            .await
            .map_err(|_| NonceError::NonceDoUnavailable)?;
        self.last_chain_sync = UnixTimestamp::try_now().unwrap_or(UnixTimestamp(0));
        for candidate in floor..floor + POOL_SIZE {
            if !self.reserved.contains_key(&candidate)
                && self.last_executed_nonce.is_none_or(|last| candidate > last)
            {
                self.available.push_back(candidate);
            }
        }
        Ok(())
    }

    async fn assign(&mut self, request_id: Uuid) -> Result<AssignedNonce, NonceError> {
        self.refill().await?;
        let nonce = self.available.pop_front().ok_or(NonceError::NonceDoUnavailable)?;
        let now = UnixTimestamp::try_now().unwrap_or(UnixTimestamp(0));
        self.reserved.insert(nonce, ReservedNonce { nonce, assigned_at: now, request_id });
        self.stats.total_assigned += 1;
        self.last_activity = now;
        Ok(AssignedNonce { nonce, wallet_index: self.wallet_index })
    }

    fn consume(&mut self, nonce: u64, fee: u64) {
        self.reserved.remove(&nonce);
        self.last_executed_nonce = Some(self.last_executed_nonce.map_or(nonce, |last| last.max(nonce)));
        self.stats.fees_spent += fee as u128;
        self.stats.tx_count_today += 1;
        self.last_activity = UnixTimestamp::try_now().unwrap_or(UnixTimestamp(0));
    }

    fn release(&mut self, nonce: u64) {
        if self.reserved.remove(&nonce).is_some() {
            self.available.push_front(nonce);
        }
    }

    async fn reconcile(&mut self) {
        let Ok(possible_next) = self.chain.get_possible_next_nonce(&self.address).await else {
            warn!(wallet_index = self.wallet_index, "reconcile: indexer unreachable, skipping");
            return;
        };
        self.last_chain_sync = UnixTimestamp::try_now().unwrap_or(UnixTimestamp(0));

        let stale: Vec<u64> =
            self.reserved.keys().copied().filter(|nonce| *nonce < possible_next).collect();
        for nonce in stale {
            self.reserved.remove(&nonce);
            self.last_executed_nonce =
                Some(self.last_executed_nonce.map_or(nonce, |last| last.max(nonce)));
            self.stats.gaps_recovered += 1;
        }
        self.available.retain(|nonce| *nonce >= possible_next);
        let floor = self.available.front().copied().unwrap_or(possible_next);

        let idle_for = UnixTimestamp::try_now()
            .unwrap_or(self.last_activity)
            .0
            .saturating_sub(self.last_activity.0);
        if idle_for > IDLE_HARD_RESET_AFTER.as_secs() && floor > possible_next {
            info!(wallet_index = self.wallet_index, "idle pool ahead of chain, hard-resetting");
            self.hard_reset(possible_next);
        }
    }

    fn hard_reset(&mut self, chain_nonce: u64) {
        self.available.clear();
        self.reserved.clear();
        self.last_executed_nonce = Some(chain_nonce.saturating_sub(1));
    }
}

/// A handle to one wallet's nonce-coordinator actor. Cheap to clone; every
/// clone shares the same mailbox and therefore the same single writer.
#[derive(Clone)]
pub struct NonceCoordinatorHandle {
    tx: mpsc::Sender<Command>,
}

impl NonceCoordinatorHandle {
    pub fn spawn(wallet_index: u32, address: String, chain: Arc<StacksChainClient>) -> Self {
        let (tx, mut rx) = mpsc::channel(256);
        let now = UnixTimestamp::try_now().unwrap_or(UnixTimestamp(0));
        let mut pool = WalletPool {
            wallet_index,
            address,
            chain,
            available: VecDeque::new(),
            reserved: HashMap::new(),
            last_executed_nonce: None,
            last_chain_sync: now,
            last_activity: now,
            stats: NoncePoolStats::default(),
        };

        tokio::spawn(async move {
            let mut reconcile_tick = tokio::time::interval(RECONCILE_INTERVAL);
            reconcile_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    maybe_cmd = rx.recv() => {
                        match maybe_cmd {
                            Some(cmd) => Self::handle(&mut pool, cmd).await,
                            None => break,
                        }
                    }
                    _ = reconcile_tick.tick() => {
                        pool.reconcile().await;
                    }
                }
            }
        });

        NonceCoordinatorHandle { tx }
    }

    async fn handle(pool: &mut WalletPool, cmd: Command) {
        match cmd {
            Command::Assign { request_id, reply } => {
                let result = pool.assign(request_id).await;
                let _ = reply.send(result);
            }
            Command::Consume { nonce, fee } => pool.consume(nonce, fee),
            Command::Release { nonce } => pool.release(nonce),
            Command::Reconcile => pool.reconcile().await,
            Command::Reset { mode } => match mode {
                ResetMode::Resync => pool.reconcile().await,
                ResetMode::HardReset => {
                    let chain_nonce = pool.last_executed_nonce.map(|n| n + 1).unwrap_or(0);
                    pool.hard_reset(chain_nonce);
                }
            },
            Command::RecordConflict => pool.stats.conflicts_detected += 1,
            Command::Stats { reply } => {
                let _ = reply.send(pool.stats);
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn assign(&self, request_id: Uuid) -> Result<AssignedNonce, NonceError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Assign { request_id, reply })
            .await
            .map_err(|_| NonceError::ActorGone)?;
        rx.await.map_err(|_| NonceError::ActorGone)?
    }

    pub async fn consume(&self, nonce: u64, fee: u64) {
        let _ = self.tx.send(Command::Consume { nonce, fee }).await;
    }

    pub async fn release(&self, nonce: u64) {
        let _ = self.tx.send(Command::Release { nonce }).await;
    }

    /// Schedules a reconciliation 2 s out; cheap to call from error paths.
    /// Spec §4.2 `resyncDelayed()`.
    pub fn resync_delayed(&self) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(RESYNC_DELAY).await;
            let _ = tx.send(Command::Reconcile).await;
        });
    }

    /// Records that a broadcast-time nonce conflict was observed, for the
    /// `conflictsDetected` counter. Spec §3 "Nonce pool".
    pub async fn record_conflict(&self) {
        let _ = self.tx.send(Command::RecordConflict).await;
    }

    pub async fn reset(&self, mode: ResetMode) {
        let _ = self.tx.send(Command::Reset { mode }).await;
    }

    pub async fn stats(&self) -> Option<NoncePoolStats> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Command::Stats { reply }).await.ok()?;
        rx.await.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_pool_refill_skips_reserved_and_consumed() {
        // Exercises the pure selection logic `refill` applies, without a
        // real chain client: available should be `floor..floor+POOL_SIZE`
        // minus anything already reserved or at/below last_executed_nonce.
        let floor = 100u64;
        let reserved: HashMap<u64, ()> = HashMap::from([(102, ())]);
        let last_executed = Some(100u64);
        let mut available = VecDeque::new();
        for candidate in floor..floor + POOL_SIZE {
            if !reserved.contains_key(&candidate) && last_executed.is_none_or(|last| candidate > last) {
                available.push_back(candidate);
            }
        }
        assert_eq!(available, VecDeque::from(vec![101, 103, 104, 105, 106, 107]));
    }
}
