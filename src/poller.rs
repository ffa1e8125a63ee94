//! Command sync loop driven by wake hints and periodic polling

use crate::command::CommandExecutor;
use lodestone_shared::notify::WakeSignal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, warn};

/// Polls the command collection on wake signals and on a periodic tick
///
/// Every trigger performs the same full poll: the wake channel is a hint,
/// never a source of truth. A wake that arrives before its command document
/// is readable simply finds nothing; the next tick picks the command up.
pub struct SyncLoop {
    executor: Arc<CommandExecutor>,
    poll_interval: Duration,
}

impl SyncLoop {
    pub fn new(executor: Arc<CommandExecutor>, poll_interval: Duration) -> Self {
        Self {
            executor,
            poll_interval,
        }
    }

    /// Run until `shutdown` is signalled or its sender is dropped
    pub async fn run(
        self,
        mut wake: mpsc::Receiver<WakeSignal>,
        mut shutdown: mpsc::Receiver<()>,
    ) {
        let mut ticker = interval(self.poll_interval);
        let mut wake_open = true;

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    debug!("sync loop shutting down");
                    break;
                }
                signal = wake.recv(), if wake_open => {
                    match signal {
                        Some(signal) => {
                            debug!("wake signal for {}", signal.topic);
                            self.poll().await;
                        }
                        // Wake channel gone; periodic polling carries on
                        None => wake_open = false,
                    }
                }
                _ = ticker.tick() => self.poll().await,
            }
        }
    }

    async fn poll(&self) {
        match self.executor.drain_pending().await {
            Ok(0) => {}
            Ok(n) => debug!("executed {n} command(s)"),
            // Transient; the next trigger retries the whole poll
            Err(e) => warn!("command poll failed: {e}"),
        }
    }
}
