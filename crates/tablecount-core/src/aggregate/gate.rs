//! Concurrency gate shared by range-count workers.
//!
//! A counting semaphore of weight `limit`: a worker holds one permit for the
//! whole duration of its query, so at most `limit` queries run at once.
//! Waiting workers are admitted in no particular order.

use std::sync::Arc;

use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Bounded admission gate for database queries. Cloning shares the same slots.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    limit: usize,
    semaphore: Arc<Semaphore>,
}

impl ConcurrencyGate {
    /// Create a gate admitting up to `limit` holders (at least 1).
    pub fn new(limit: usize) -> Self {
        let limit = limit.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            limit,
            semaphore: Arc::new(Semaphore::new(limit)),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Slots currently held.
    pub fn in_use(&self) -> usize {
        self.limit.saturating_sub(self.available())
    }

    /// Wait for a free slot. The slot is released when the permit is dropped.
    /// Fails only if the gate has been closed.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        Arc::clone(&self.semaphore).acquire_owned().await
    }

    /// Stop admitting; pending and future `acquire` calls fail.
    pub fn close(&self) {
        self.semaphore.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn gate_acquire_and_release() {
        let gate = ConcurrencyGate::new(2);
        assert_eq!(gate.limit(), 2);
        assert_eq!(gate.available(), 2);

        let a = gate.acquire().await.unwrap();
        assert_eq!(gate.in_use(), 1);
        let b = gate.acquire().await.unwrap();
        assert_eq!(gate.in_use(), 2);
        assert_eq!(gate.available(), 0);

        drop(a);
        assert_eq!(gate.available(), 1);
        drop(b);
        assert_eq!(gate.in_use(), 0);
    }

    #[tokio::test]
    async fn gate_clamps_zero_to_one() {
        let gate = ConcurrencyGate::new(0);
        assert_eq!(gate.limit(), 1);
        let _permit = gate.acquire().await.unwrap();
        assert_eq!(gate.available(), 0);
    }

    #[tokio::test]
    async fn gate_blocks_when_full() {
        let gate = ConcurrencyGate::new(1);
        let held = gate.acquire().await.unwrap();

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.acquire().await.map(|_| ()) })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(held);
        waiter.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn closed_gate_rejects() {
        let gate = ConcurrencyGate::new(1);
        gate.close();
        assert!(gate.acquire().await.is_err());
    }
}
