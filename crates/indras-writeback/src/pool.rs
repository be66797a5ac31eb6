//! Reusable byte buffer pool
//!
//! Runs promote their tail node into a pool-lent buffer so that repeated
//! small appends grow one allocation instead of a chain of nodes. The pool
//! is injected as a [`BufferPool`] so tests can substitute an instrumented
//! implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use bytes::BytesMut;
use parking_lot::Mutex;
use tracing::trace;

use crate::config::PoolConfig;
use crate::error::WritebackResult;

/// Lends and reclaims growable byte buffers
///
/// Acquired buffers have unspecified content; callers clear them before
/// use. A released buffer must not be used again by the caller. Pools are
/// shared across write-back buffers of different files, so implementations
/// must tolerate concurrent `acquire`/`release`.
pub trait BufferPool: Send + Sync {
    /// Borrow a buffer from the pool
    fn acquire(&self) -> BytesMut;

    /// Return a buffer to the pool
    fn release(&self, buf: BytesMut);
}

/// Snapshot of pool counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Buffers handed out since creation
    pub acquired: u64,
    /// Buffers given back since creation
    pub released: u64,
    /// Idle buffers currently on the free list
    pub retained: usize,
}

impl PoolStats {
    /// Buffers currently lent out
    pub fn outstanding(&self) -> u64 {
        self.acquired.saturating_sub(self.released)
    }
}

/// Default free-list pool shared by all write-back buffers in a process
#[derive(Debug)]
pub struct SharedBufferPool {
    config: PoolConfig,
    free: Mutex<Vec<BytesMut>>,
    acquired: AtomicU64,
    released: AtomicU64,
}

static GLOBAL_POOL: OnceLock<Arc<SharedBufferPool>> = OnceLock::new();

impl Default for SharedBufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedBufferPool {
    /// Create a pool with the default configuration
    pub fn new() -> Self {
        Self::build(PoolConfig::default())
    }

    /// Create a pool with a validated custom configuration
    pub fn with_config(config: PoolConfig) -> WritebackResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: PoolConfig) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(config.max_retained)),
            config,
            acquired: AtomicU64::new(0),
            released: AtomicU64::new(0),
        }
    }

    /// The process-wide pool, created on first use
    pub fn global() -> Arc<SharedBufferPool> {
        GLOBAL_POOL
            .get_or_init(|| Arc::new(SharedBufferPool::new()))
            .clone()
    }

    /// Get the pool configuration
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Current counters
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            acquired: self.acquired.load(Ordering::SeqCst),
            released: self.released.load(Ordering::SeqCst),
            retained: self.free.lock().len(),
        }
    }

    /// Buffers currently lent out
    pub fn outstanding(&self) -> u64 {
        self.stats().outstanding()
    }

    /// Drop every idle buffer, returning how many were freed
    pub fn shrink(&self) -> usize {
        let mut free = self.free.lock();
        let dropped = free.len();
        free.clear();
        dropped
    }
}

impl BufferPool for SharedBufferPool {
    fn acquire(&self) -> BytesMut {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        match self.free.lock().pop() {
            Some(mut buf) => {
                buf.clear();
                buf
            }
            None => BytesMut::with_capacity(self.config.initial_capacity),
        }
    }

    fn release(&self, mut buf: BytesMut) {
        self.released.fetch_add(1, Ordering::SeqCst);
        if buf.capacity() > self.config.max_buffer_capacity {
            trace!(capacity = buf.capacity(), "Dropping oversized pool buffer");
            return;
        }
        let mut free = self.free.lock();
        if free.len() < self.config.max_retained {
            buf.clear();
            free.push(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_release_counters() {
        let pool = SharedBufferPool::new();
        let a = pool.acquire();
        let b = pool.acquire();
        assert_eq!(pool.outstanding(), 2);

        pool.release(a);
        pool.release(b);
        let stats = pool.stats();
        assert_eq!(stats.acquired, 2);
        assert_eq!(stats.released, 2);
        assert_eq!(stats.retained, 2);
        assert_eq!(stats.outstanding(), 0);
    }

    #[test]
    fn test_reused_buffer_is_cleared() {
        let pool = SharedBufferPool::new();
        let mut buf = pool.acquire();
        buf.extend_from_slice(b"stale");
        pool.release(buf);

        let reused = pool.acquire();
        assert!(reused.is_empty());
        assert!(reused.capacity() >= 5);
    }

    #[test]
    fn test_oversized_buffer_not_retained() {
        let config = PoolConfig {
            initial_capacity: 16,
            max_retained: 4,
            max_buffer_capacity: 64,
        };
        let pool = SharedBufferPool::with_config(config).unwrap();
        let mut buf = pool.acquire();
        buf.extend_from_slice(&[7u8; 256]);
        pool.release(buf);

        let stats = pool.stats();
        assert_eq!(stats.retained, 0);
        assert_eq!(stats.outstanding(), 0);
    }

    #[test]
    fn test_config_accessor() {
        assert_eq!(SharedBufferPool::new().config(), &PoolConfig::default());

        let config = PoolConfig {
            initial_capacity: 32,
            max_retained: 2,
            max_buffer_capacity: 128,
        };
        let pool = SharedBufferPool::with_config(config.clone()).unwrap();
        assert_eq!(pool.config(), &config);
        assert!(pool.acquire().capacity() >= pool.config().initial_capacity);
    }

    #[test]
    fn test_max_retained_limit() {
        let config = PoolConfig {
            max_retained: 1,
            ..Default::default()
        };
        let pool = SharedBufferPool::with_config(config).unwrap();
        let a = pool.acquire();
        let b = pool.acquire();
        pool.release(a);
        pool.release(b);
        assert_eq!(pool.stats().retained, 1);
    }

    #[test]
    fn test_shrink_drops_idle_buffers() {
        let pool = SharedBufferPool::new();
        let a = pool.acquire();
        pool.release(a);
        assert_eq!(pool.shrink(), 1);
        assert_eq!(pool.stats().retained, 0);
    }

    #[test]
    fn test_with_invalid_config() {
        let config = PoolConfig {
            initial_capacity: 10,
            max_buffer_capacity: 5,
            ..Default::default()
        };
        assert!(SharedBufferPool::with_config(config).is_err());
    }

    #[test]
    fn test_global_pool_is_shared() {
        let a = SharedBufferPool::global();
        let b = SharedBufferPool::global();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
