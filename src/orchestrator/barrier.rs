//! Countdown barrier for the join on a run's generator tasks.
//!
//! [`JoinBarrier::new`] hands out one [`BarrierGuard`] per task up front. Each guard
//! counts the barrier down exactly once, when it is dropped, so a task counts down
//! whether it returns normally, returns an error, or unwinds from a panic.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

/// The barrier's count can no longer reach zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("join barrier closed with {remaining} task(s) outstanding")]
pub struct BarrierInterrupted {
    /// Tasks that had not counted down
    pub remaining: usize,
}

/// Waiting side of the barrier, owned by the finalize job for one cycle
#[derive(Debug)]
pub struct JoinBarrier {
    rx: watch::Receiver<usize>,
}

/// Counting side of the barrier; one per generator task
#[derive(Debug)]
pub struct BarrierGuard {
    tx: Arc<watch::Sender<usize>>,
}

impl JoinBarrier {
    /// Create a barrier expecting `count` tasks, with one guard per task
    pub fn new(count: usize) -> (Self, Vec<BarrierGuard>) {
        let (tx, rx) = watch::channel(count);
        let tx = Arc::new(tx);
        let guards = (0..count)
            .map(|_| BarrierGuard {
                tx: Arc::clone(&tx),
            })
            .collect();
        (Self { rx }, guards)
    }

    /// Tasks that have not counted down yet
    pub fn remaining(&self) -> usize {
        *self.rx.borrow()
    }

    /// Wait until every guard has counted down
    ///
    /// Returns immediately for a barrier created with zero tasks.
    pub async fn wait(&mut self) -> Result<(), BarrierInterrupted> {
        let closed = self.rx.wait_for(|remaining| *remaining == 0).await.is_err();
        if closed {
            return Err(BarrierInterrupted {
                remaining: self.remaining(),
            });
        }
        Ok(())
    }
}

impl Drop for BarrierGuard {
    fn drop(&mut self) {
        self.tx
            .send_modify(|remaining| *remaining = remaining.saturating_sub(1));
    }
}
