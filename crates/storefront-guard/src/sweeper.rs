//! # Window Sweeper
//!
//! Background task that purges expired rate-limit windows so the counter map
//! does not grow with every client ever seen.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sweeper task (tokio)                                                   │
//! │                                                                         │
//! │   loop select!                                                          │
//! │   ├── interval.tick()  (every 300 s) ──► store.purge_expired(now)      │
//! │   └── command                                                          │
//! │        ├── SweepNow  ──► purge, reply with count                       │
//! │        └── Shutdown  ──► exit                                          │
//! │                                                                         │
//! │  purge_expired takes the store's lock for one retain() pass. No lock   │
//! │  is held across an await.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::DEFAULT_SWEEP_INTERVAL_SECS;
use crate::error::{GuardError, GuardResult};
use crate::limiter::RateLimiter;
use crate::store::RateLimitStore;

/// Purges expired windows on a fixed interval.
pub struct Sweeper {
    store: Arc<dyn RateLimitStore>,
    period: Duration,
}

/// Handle for controlling a running sweeper.
#[derive(Clone)]
pub struct SweeperHandle {
    cmd_tx: mpsc::Sender<SweeperCommand>,
}

#[derive(Debug)]
enum SweeperCommand {
    SweepNow { reply: oneshot::Sender<usize> },
    Shutdown,
}

impl SweeperHandle {
    /// Sweeps immediately and returns how many windows were removed.
    pub async fn sweep_now(&self) -> GuardResult<usize> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(SweeperCommand::SweepNow { reply })
            .await
            .map_err(|_| GuardError::ChannelClosed)?;
        rx.await.map_err(|_| GuardError::ChannelClosed)
    }

    /// Stops the sweeper.
    pub async fn shutdown(&self) -> GuardResult<()> {
        self.cmd_tx
            .send(SweeperCommand::Shutdown)
            .await
            .map_err(|_| GuardError::ChannelClosed)
    }
}

impl Sweeper {
    /// Creates a sweeper. A zero period falls back to the default.
    pub fn new(store: Arc<dyn RateLimitStore>, period: Duration) -> Self {
        let period = if period.is_zero() {
            Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS)
        } else {
            period
        };
        Sweeper { store, period }
    }

    /// Sweeper over the limiter's store.
    pub fn for_limiter(limiter: &RateLimiter, period: Duration) -> Self {
        Self::new(limiter.store(), period)
    }

    /// Spawns the sweeper on the current tokio runtime.
    pub fn start(self) -> SweeperHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);

        tokio::spawn(async move {
            self.run(cmd_rx).await;
        });

        SweeperHandle { cmd_tx }
    }

    async fn run(self, mut cmd_rx: mpsc::Receiver<SweeperCommand>) {
        info!(interval_secs = self.period.as_secs(), "Rate limit sweeper started");

        // First sweep one full period after start.
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(SweeperCommand::SweepNow { reply }) => {
                            let removed = self.sweep();
                            let _ = reply.send(removed);
                        }
                        Some(SweeperCommand::Shutdown) | None => {
                            info!("Rate limit sweeper shutting down");
                            break;
                        }
                    }
                }
                _ = ticker.tick() => {
                    self.sweep();
                }
            }
        }
    }

    fn sweep(&self) -> usize {
        let removed = self.store.purge_expired(Utc::now());
        debug!(removed, live = self.store.len(), "Swept expired rate limit windows");
        removed
    }
}
