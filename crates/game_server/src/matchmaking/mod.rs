//! Matchmaking queue system.
//!
//! Waiting players live in a FIFO owned by a single task; callers never
//! touch the queue directly, they send commands over a channel. A periodic
//! tick scans the queue: once enough players are waiting, exactly one
//! match-sized batch is drained in arrival order and emitted on the matched
//! channel (an awaited send, so a slow consumer applies backpressure);
//! otherwise a best-effort status snapshot goes out to whoever is still
//! waiting.

use crate::messaging::Player;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Periodic snapshot of the queue for players below the match threshold.
#[derive(Debug, Clone)]
pub struct QueueStatus {
    pub players: Vec<Player>,
    pub current: usize,
    pub total: usize,
}

/// Commands processed serially by the queue's owner task.
#[derive(Debug)]
enum QueueCommand {
    Join(Player),
    Leave(Uuid),
}

/// Channel-driven matchmaking queue.
///
/// Construct with [`QueueSystem::new`], wire the matched/status receivers
/// into the hub with the `take_*` methods, then call [`QueueSystem::start`].
#[derive(Debug)]
pub struct QueueSystem {
    command_tx: mpsc::Sender<QueueCommand>,
    command_rx: Mutex<Option<mpsc::Receiver<QueueCommand>>>,
    matched_rx: Mutex<Option<mpsc::Receiver<Vec<Player>>>>,
    status_rx: Mutex<Option<mpsc::Receiver<QueueStatus>>>,
    matched_tx: mpsc::Sender<Vec<Player>>,
    status_tx: mpsc::Sender<QueueStatus>,
    match_size: usize,
    poll_interval: Duration,
}

impl QueueSystem {
    pub fn new(match_size: usize, poll_interval: Duration) -> Self {
        let (command_tx, command_rx) = mpsc::channel(64);
        // Capacity 1: a full matched channel must stall the matcher, not
        // drop a batch.
        let (matched_tx, matched_rx) = mpsc::channel(1);
        let (status_tx, status_rx) = mpsc::channel(8);

        Self {
            command_tx,
            command_rx: Mutex::new(Some(command_rx)),
            matched_rx: Mutex::new(Some(matched_rx)),
            status_rx: Mutex::new(Some(status_rx)),
            matched_tx,
            status_tx,
            match_size: match_size.max(1),
            poll_interval,
        }
    }

    /// Takes the matched-batches receiver. Yields `None` on a second call.
    pub fn take_matched_rx(&self) -> Option<mpsc::Receiver<Vec<Player>>> {
        self.matched_rx.lock().unwrap().take()
    }

    /// Takes the status receiver. Yields `None` on a second call.
    pub fn take_status_rx(&self) -> Option<mpsc::Receiver<QueueStatus>> {
        self.status_rx.lock().unwrap().take()
    }

    /// Spawns the owner task. Idempotent; a second call finds the command
    /// receiver already taken and does nothing.
    pub fn start(&self) {
        let Some(command_rx) = self.command_rx.lock().unwrap().take() else {
            return;
        };
        let matched_tx = self.matched_tx.clone();
        let status_tx = self.status_tx.clone();
        let match_size = self.match_size;
        let poll_interval = self.poll_interval;

        tokio::spawn(async move {
            run_queue(command_rx, matched_tx, status_tx, match_size, poll_interval).await;
        });
        info!(
            "🎯 Matchmaking queue started (match size {}, poll every {:?})",
            self.match_size, self.poll_interval
        );
    }

    /// Enqueues a player for matching. Joining twice is a no-op.
    pub async fn join(&self, player: Player) {
        if self.command_tx.send(QueueCommand::Join(player)).await.is_err() {
            warn!("Matchmaking queue is gone; join dropped");
        }
    }

    /// Removes a player from the queue if they are still waiting.
    pub async fn leave(&self, player_id: Uuid) {
        if self
            .command_tx
            .send(QueueCommand::Leave(player_id))
            .await
            .is_err()
        {
            warn!("Matchmaking queue is gone; leave dropped");
        }
    }
}

/// The owner task: sole holder of the pending-player list.
async fn run_queue(
    mut command_rx: mpsc::Receiver<QueueCommand>,
    matched_tx: mpsc::Sender<Vec<Player>>,
    status_tx: mpsc::Sender<QueueStatus>,
    match_size: usize,
    poll_interval: Duration,
) {
    let mut queue: Vec<Player> = Vec::new();
    let mut ticker = interval(poll_interval);

    loop {
        tokio::select! {
            command = command_rx.recv() => match command {
                Some(QueueCommand::Join(player)) => {
                    if queue.iter().any(|p| p.id == player.id) {
                        debug!("Player {} is already queued", player.id);
                        continue;
                    }
                    info!(
                        "Player {} joined queue. Waiting: {}/{}",
                        player.username,
                        queue.len() + 1,
                        match_size
                    );
                    queue.push(player);
                }
                Some(QueueCommand::Leave(player_id)) => {
                    let before = queue.len();
                    queue.retain(|p| p.id != player_id);
                    if queue.len() < before {
                        info!("Player {} left queue. Waiting: {}/{}", player_id, queue.len(), match_size);
                    }
                }
                None => break,
            },
            _ = ticker.tick() => {
                if queue.len() >= match_size {
                    let matched: Vec<Player> = queue.drain(..match_size).collect();
                    info!("🎉 Match found for {} player(s)", matched.len());
                    if matched_tx.send(matched).await.is_err() {
                        break;
                    }
                } else if !queue.is_empty() {
                    let status = QueueStatus {
                        players: queue.clone(),
                        current: queue.len(),
                        total: match_size,
                    };
                    // Best effort only; a stale snapshot is worthless, so a
                    // full channel drops it rather than stalling the queue.
                    let _ = status_tx.try_send(status);
                }
            }
        }
    }
    debug!("Matchmaking queue task exited");
}
