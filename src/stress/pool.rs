//! Memory block pool.
//!
//! # Responsibilities
//! - Allocate fixed-size blocks on demand and keep them alive
//! - Release every block at once on clear
//! - Report block count and total allocated bytes
//!
//! # Design Decisions
//! - Blocks are filled with a byte pattern so pages are actually resident
//! - Allocation is fallible (`try_reserve_exact`); out-of-memory is an
//!   error value instead of an abort
//! - Blocks pushed before a failure stay in the pool
//! - Blocks are allocated and filled outside the lock; the lock only
//!   guards the push, so health checks and clears never wait on a fill
//! - The block count is mirrored in an atomic for lock-free reads

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::config::StressConfig;

const MIB: usize = 1024 * 1024;
const FILL_BYTE: u8 = b'x';

/// Allocation failed part-way through a stress call.
#[derive(Debug, Error)]
#[error("failed to allocate {requested_bytes} bytes: {message}")]
pub struct AllocationError {
    /// Underlying allocator message.
    pub message: String,
    /// Size of the block that could not be allocated.
    pub requested_bytes: usize,
    /// Blocks held after the failure (earlier blocks are kept).
    pub block_count: usize,
}

/// Pool state after a stress call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StressSnapshot {
    pub block_count: usize,
    pub allocated_bytes: usize,
}

/// Deliberate memory leak for failover demonstrations.
#[derive(Debug)]
pub struct MemoryPressure {
    blocks: Mutex<Vec<Vec<u8>>>,
    count: AtomicUsize,
    block_bytes: usize,
    blocks_per_call: usize,
}

impl MemoryPressure {
    pub fn new(config: &StressConfig) -> Self {
        // Saturates so an absurd size surfaces as an allocation error.
        Self::with_block_bytes(config.chunk_mb.saturating_mul(MIB), config.chunks)
    }

    /// Pool with an explicit block size in bytes.
    pub fn with_block_bytes(block_bytes: usize, blocks_per_call: usize) -> Self {
        Self {
            blocks: Mutex::new(Vec::new()),
            count: AtomicUsize::new(0),
            block_bytes,
            blocks_per_call,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Vec<u8>>> {
        self.blocks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Size of one block in bytes.
    pub fn block_bytes(&self) -> usize {
        self.block_bytes
    }

    /// Blocks added by each `stress` call.
    pub fn blocks_per_call(&self) -> usize {
        self.blocks_per_call
    }

    /// Allocate one more batch of blocks.
    pub fn stress(&self) -> Result<StressSnapshot, AllocationError> {
        let mut block_count = self.block_count();
        for _ in 0..self.blocks_per_call {
            let block = self.allocate_block().map_err(|message| AllocationError {
                message,
                requested_bytes: self.block_bytes,
                block_count: self.block_count(),
            })?;
            block_count = self.push(block);
        }

        Ok(StressSnapshot {
            block_count,
            allocated_bytes: block_count.saturating_mul(self.block_bytes),
        })
    }

    fn allocate_block(&self) -> Result<Vec<u8>, String> {
        let mut block = Vec::new();
        block
            .try_reserve_exact(self.block_bytes)
            .map_err(|e| e.to_string())?;
        block.resize(self.block_bytes, FILL_BYTE);
        Ok(block)
    }

    /// Keep `block` alive and return the new count.
    fn push(&self, block: Vec<u8>) -> usize {
        let mut blocks = self.lock();
        blocks.push(block);
        let count = blocks.len();
        self.count.store(count, Ordering::Release);
        count
    }

    /// Drop every block and return how many there were.
    pub fn clear(&self) -> usize {
        let released = {
            let mut blocks = self.lock();
            self.count.store(0, Ordering::Release);
            std::mem::take(&mut *blocks)
        };
        let previous = released.len();
        // Freed here, outside the lock.
        drop(released);
        previous
    }

    /// Blocks currently held.
    pub fn block_count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Bytes currently held by the pool.
    pub fn allocated_bytes(&self) -> usize {
        self.block_count().saturating_mul(self.block_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::time::{Duration, Instant};

    #[test]
    fn test_stress_is_additive() {
        let pool = MemoryPressure::with_block_bytes(1024, 3);
        for n in 1..=4 {
            let snap = pool.stress().unwrap();
            assert_eq!(snap.block_count, n * 3);
            assert_eq!(snap.allocated_bytes, n * 3 * 1024);
        }
        assert_eq!(pool.block_count(), 12);
    }

    #[test]
    fn test_blocks_are_filled() {
        let pool = MemoryPressure::with_block_bytes(64, 1);
        pool.stress().unwrap();
        let blocks = pool.lock();
        assert!(blocks[0].iter().all(|b| *b == FILL_BYTE));
        assert_eq!(blocks[0].len(), 64);
    }

    #[test]
    fn test_clear_twice() {
        let pool = MemoryPressure::with_block_bytes(1024, 2);
        pool.stress().unwrap();
        assert_eq!(pool.clear(), 2);
        assert_eq!(pool.clear(), 0);
        assert_eq!(pool.allocated_bytes(), 0);
    }

    #[test]
    fn test_impossible_allocation_is_an_error() {
        let pool = MemoryPressure::with_block_bytes(usize::MAX, 2);
        let err = pool.stress().unwrap_err();
        assert_eq!(err.block_count, 0);
        assert_eq!(pool.block_count(), 0);
    }

    #[test]
    fn test_oversized_config_does_not_overflow() {
        let pool = MemoryPressure::new(&StressConfig {
            chunk_mb: usize::MAX,
            chunks: 1,
        });
        assert_eq!(pool.block_bytes(), usize::MAX);
        let err = pool.stress().unwrap_err();
        assert_eq!(err.requested_bytes, usize::MAX);
        assert_eq!(pool.allocated_bytes(), 0);
    }

    #[test]
    fn test_readers_do_not_wait_for_stress() {
        const CALLS: usize = 3;
        let pool = MemoryPressure::with_block_bytes(32 * MIB, 4);
        let done = AtomicBool::new(false);

        let (stress_elapsed, max_wait) = std::thread::scope(|scope| {
            let stresser = scope.spawn(|| {
                let started = Instant::now();
                for _ in 0..CALLS {
                    pool.stress().unwrap();
                }
                done.store(true, Ordering::Release);
                started.elapsed()
            });

            let mut max_wait = Duration::ZERO;
            let mut last = 0;
            while !done.load(Ordering::Acquire) {
                let started = Instant::now();
                let count = pool.block_count();
                max_wait = max_wait.max(started.elapsed());
                assert!(count >= last, "count went backwards");
                last = count;
                std::thread::yield_now();
            }
            (stresser.join().unwrap(), max_wait)
        });

        assert_eq!(pool.block_count(), CALLS * 4);
        assert!(
            max_wait * 2 < stress_elapsed / CALLS as u32,
            "block_count waited {:?} while one stress call took {:?}",
            max_wait,
            stress_elapsed / CALLS as u32
        );
    }

    #[test]
    fn test_clear_during_stress() {
        let pool = MemoryPressure::with_block_bytes(8 * MIB, 8);
        std::thread::scope(|scope| {
            let stresser = scope.spawn(|| pool.stress().unwrap());
            pool.clear();
            let snap = stresser.join().unwrap();
            assert!(snap.block_count <= 8);
        });
        assert!(pool.block_count() <= 8);
        assert_eq!(pool.allocated_bytes(), pool.block_count() * 8 * MIB);
    }

    #[test]
    fn test_config_sizing() {
        let pool = MemoryPressure::new(&StressConfig { chunk_mb: 2, chunks: 5 });
        assert_eq!(pool.block_bytes(), 2 * MIB);
        assert_eq!(pool.blocks_per_call(), 5);
    }
}
